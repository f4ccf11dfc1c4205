use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use crate::import::ImportResult;
use pais_db::models::Draw;
use pais_engine::generator::{CandidateSet, Stage};
use pais_engine::patterns::PatternReport;
use pais_engine::rules::RuleReport;
use pais_engine::stats::StatsSnapshot;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_mains(mains: &[u8]) -> String {
    mains
        .iter()
        .map(|m| format!("{:2}", m))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Numéros", "Fort"]);
    for draw in draws {
        table.add_row(vec![
            draw.draw_id.to_string(),
            format_mains(&draw.mains),
            format!("{:2}", draw.strong),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Lignes invalides  : {}", result.errors);
    }
}

pub fn display_stats(stats: &StatsSnapshot, weights: &[f64], title: &str) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Numéro", "Fréquence", "Récents", "Retard", "Poids"]);

    let mut sorted: Vec<_> = stats.numbers.iter().zip(weights).collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (stat, weight) in sorted {
        table.add_row(vec![
            format!("{:2}", stat.number),
            stat.frequency.to_string(),
            stat.recent.to_string(),
            stat.staleness.to_string(),
            format!("{:.1}", weight),
        ]);
    }
    println!("{table}");
}

pub fn display_sets(sets: &[CandidateSet]) {
    println!("\n🎲 {} grilles (6 numéros 1-37 + 1 numéro fort 1-7)\n", sets.len());

    let mut table = new_table(vec!["#", "Numéros", "Fort", "Étape"]);
    for (i, set) in sets.iter().enumerate() {
        let color = match set.stage {
            Stage::Sampling => Color::Green,
            Stage::Fallback => Color::Yellow,
            Stage::Degraded => Color::Red,
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format_mains(&set.mains)),
            Cell::new(format!("{:2}", set.strong)),
            Cell::new(set.stage.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_report(report: &RuleReport) {
    if report.checks.is_empty() {
        println!("OK : format valide, aucune règle active.");
        return;
    }

    let mut table = new_table(vec!["Règle", "Statut", "Détail"]);
    for check in &report.checks {
        let (status, color) = if check.passed {
            ("OK", Color::Green)
        } else {
            ("ÉCHEC", Color::Red)
        };
        table.add_row(vec![
            Cell::new(check.rule.name()),
            Cell::new(status).fg(color),
            Cell::new(&check.message),
        ]);
    }
    println!("{table}");
}

pub fn display_patterns(report: &PatternReport) {
    println!("\n📊 Motifs sur {} tirages\n", report.num_draws);

    let sum = &report.sum_6_mains;
    let spread = &report.spread;
    let odd = &report.odd_count_per_draw;
    let low = &report.low_count_per_draw;

    let mut table = new_table(vec!["Mesure", "Résumé"]);
    table.add_row(vec![
        "Consécutifs".to_string(),
        format!(
            "{:.1}% des tirages ont au moins une paire consécutive",
            report.consecutive.pct
        ),
    ]);
    table.add_row(vec![
        "Somme des 6".to_string(),
        format!(
            "min={} max={} moyenne={} (p5={} p25={} p50={} p75={} p95={})",
            sum.min, sum.max, sum.mean, sum.p5, sum.p25, sum.p50, sum.p75, sum.p95
        ),
    ]);
    table.add_row(vec![
        "Impairs".to_string(),
        format!("plus fréquent={} distribution={:?}", odd.most_common, odd.distribution),
    ]);
    table.add_row(vec![
        "Bas (1-18)".to_string(),
        format!(
            "plage=[{}, {}] distribution={:?}",
            low.typical_range[0], low.typical_range[1], low.distribution
        ),
    ]);
    table.add_row(vec![
        "Écart max-min".to_string(),
        format!(
            "min={} max={} moyenne={} (p10={} p90={})",
            spread.min, spread.max, spread.mean, spread.p10, spread.p90
        ),
    ]);
    table.add_row(vec![
        "Écarts adjacents".to_string(),
        format!("{:?}", report.gap_between_adjacent_numbers.distribution),
    ]);
    println!("{table}");
}
