mod display;
mod import;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pais_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, migrate, open_db};
use pais_db::models::Pool;
use pais_db::rusqlite::Connection;
use pais_engine::generator::{Generator, GeneratorConfig, seeded_rng};
use pais_engine::patterns::analyze_patterns;
use pais_engine::rules::{RuleSet, load_rules, rules_path};
use pais_engine::scoring::{ScoredPools, ScoringModel};
use pais_engine::stats::DEFAULT_WINDOW;

use crate::display::{
    display_draws, display_import_summary, display_patterns, display_report, display_sets,
    display_stats,
};

const EMPTY_DB: &str = "Base vide. Lancez d'abord : pais import";

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum ModelArg {
    #[default]
    HotDue,
    Boosted,
}

impl From<ModelArg> for ScoringModel {
    fn from(model: ModelArg) -> Self {
        match model {
            ModelArg::HotDue => ScoringModel::HotDue,
            ModelArg::Boosted => ScoringModel::Boosted,
        }
    }
}

#[derive(Parser)]
#[command(name = "pais", about = "Générateur de grilles Lotto (6/37 + 1/7) à partir de l'historique")]
struct Cli {
    /// Journalisation détaillée (debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Chemin de la base de données
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, env = "LOTTO_CSV", default_value = "data/lotto-history.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher les statistiques (fréquence, récents, retard, poids)
    Stats {
        /// Fenêtre "récente" (nombre de tirages)
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Modèle de pondération
        #[arg(short, long, default_value = "hot-due")]
        model: ModelArg,
    },

    /// Générer des grilles
    Generate {
        /// Nombre de grilles
        #[arg(short, long, default_value = "8")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long, default_value = "42", conflicts_with = "random")]
        seed: u64,

        /// Tirage non reproductible (ignore --seed)
        #[arg(long)]
        random: bool,

        /// Fenêtre "récente" (nombre de tirages)
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Modèle de pondération
        #[arg(short, long, default_value = "hot-due")]
        model: ModelArg,

        /// Interdire les numéros consécutifs (prioritaire sur le fichier de règles)
        #[arg(long)]
        no_consecutive: bool,

        /// Fichier de règles JSON
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Vérifier une grille contre les règles
    Validate {
        /// 6 numéros + 1 numéro fort (7 nombres)
        #[arg(num_args = 7, required = true)]
        numbers: Vec<u8>,

        /// Fichier de règles JSON
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Analyser les motifs de l'historique
    Patterns {
        /// Export JSON du résumé
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = cli.db.unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { window, model } => cmd_stats(&conn, window, model.into()),
        Command::Generate {
            count,
            seed,
            random,
            window,
            model,
            no_consecutive,
            rules,
        } => {
            let config = GeneratorConfig {
                window,
                no_consecutive: no_consecutive.then_some(true),
                scoring: model.into(),
                ..GeneratorConfig::default()
            };
            let seed = (!random).then_some(seed);
            cmd_generate(&conn, count, seed, config, rules.as_deref())
        }
        Command::Validate { numbers, rules } => {
            if !cmd_validate(&numbers, rules.as_deref())? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Patterns { json } => cmd_patterns(&conn, json.as_deref()),
    }
}

/// Fichier absent ou illisible : le moteur travaille sans règles.
fn load_rule_set(path: Option<&Path>) -> Option<RuleSet> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(rules_path);
    match load_rules(&path) {
        Ok(Some(rules)) => {
            info!("règles chargées depuis {}", path.display());
            Some(rules)
        }
        Ok(None) => {
            warn!("{} introuvable : contrôles de format uniquement", path.display());
            None
        }
        Err(e) => {
            warn!("règles ignorées : {e:#}");
            None
        }
    }
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    if !file.is_file() {
        bail!(
            "Fichier d'historique introuvable : {}. Utilisez --file ou LOTTO_CSV.",
            file.display()
        );
    }
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("{EMPTY_DB}");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, window: usize, model: ScoringModel) -> Result<()> {
    let draws = fetch_history(conn)?;
    if draws.is_empty() {
        println!("{EMPTY_DB}");
        return Ok(());
    }

    let pools = ScoredPools::new(&draws, window, model);
    println!(
        "\n📊 {} tirages, fenêtre récente {} ({})",
        draws.len(),
        window.min(draws.len()),
        model
    );
    display_stats(&pools.main_stats, &pools.main_weights, &format!("Numéros (1-{})", Pool::Main.size()));
    display_stats(&pools.strong_stats, &pools.strong_weights, &format!("Numéro fort (1-{})", Pool::Strong.size()));
    Ok(())
}

fn cmd_generate(
    conn: &Connection,
    count: usize,
    seed: Option<u64>,
    config: GeneratorConfig,
    rules: Option<&Path>,
) -> Result<()> {
    if count == 0 {
        bail!("--count doit être strictement positif");
    }
    let draws = fetch_history(conn)?;
    if draws.is_empty() {
        println!("{EMPTY_DB}");
        return Ok(());
    }
    info!(draws = draws.len(), window = config.window, "historique chargé");

    let rule_set = load_rule_set(rules);
    let generator = Generator::new(&draws, rule_set, config);
    let mut rng = seeded_rng(seed);

    let sets = generator.generate(count, &mut rng);
    display_sets(&sets);
    Ok(())
}

fn cmd_validate(numbers: &[u8], rules: Option<&Path>) -> Result<bool> {
    let (mains, strong) = match numbers {
        [mains @ .., strong] if mains.len() == Pool::Main.pick_count() => (mains, *strong),
        _ => bail!("Usage : pais validate n1 n2 n3 n4 n5 n6 fort"),
    };
    let mut mains = mains.to_vec();
    mains.sort();

    let rule_set = load_rule_set(rules).unwrap_or_default();
    let report = rule_set.evaluate(&mains, strong);
    display_report(&report);
    Ok(report.passed())
}

fn cmd_patterns(conn: &Connection, json: Option<&Path>) -> Result<()> {
    let draws = fetch_history(conn)?;
    let Some(report) = analyze_patterns(&draws) else {
        println!("{EMPTY_DB}");
        return Ok(());
    };
    display_patterns(&report);

    if let Some(path) = json {
        let export = serde_json::json!({
            "generated_at": chrono::Local::now().to_rfc3339(),
            "patterns": report,
        });
        std::fs::write(path, serde_json::to_string_pretty(&export)?)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        println!("Résumé exporté vers {}", path.display());
    }
    Ok(())
}
