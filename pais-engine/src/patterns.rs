use std::collections::BTreeMap;

use serde::Serialize;

use pais_db::models::{Draw, Pool};

use crate::rules::RuleKind;
use crate::sampler::has_consecutive;

/// Résumé des motifs structurels de l'historique (sert à calibrer le fichier de règles).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub num_draws: usize,
    pub consecutive: ConsecutiveSummary,
    pub sum_6_mains: SumSummary,
    pub odd_count_per_draw: OddSummary,
    pub low_count_per_draw: LowSummary,
    pub spread: SpreadSummary,
    pub gap_between_adjacent_numbers: GapSummary,
    pub main_frequency: BTreeMap<u8, u32>,
    pub strong_frequency: BTreeMap<u8, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsecutiveSummary {
    pub draws_with_at_least_one_consecutive_pair: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumSummary {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub p5: i64,
    pub p25: i64,
    pub p50: i64,
    pub p75: i64,
    pub p95: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddSummary {
    pub distribution: BTreeMap<i64, usize>,
    pub most_common: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowSummary {
    pub typical_range: [i64; 2],
    pub distribution: BTreeMap<i64, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadSummary {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub p10: i64,
    pub p90: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapSummary {
    pub distribution: BTreeMap<u8, usize>,
    pub consecutive_gaps_count: usize,
}

/// Percentile sur un échantillon trié : index `floor(len * p / 100) - 1`, borné à [0, len-1].
pub fn percentile(sorted: &[i64], p: f64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() as f64 * p / 100.0) as usize).saturating_sub(1);
    sorted[idx.min(sorted.len() - 1)]
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn mean(values: &[i64]) -> f64 {
    round1(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

fn distribution(values: &[i64]) -> BTreeMap<i64, usize> {
    let mut dist = BTreeMap::new();
    for &v in values {
        *dist.entry(v).or_insert(0) += 1;
    }
    dist
}

fn frequencies(draws: &[Draw], pool: Pool) -> BTreeMap<u8, u32> {
    let mut freq = BTreeMap::new();
    for draw in draws {
        for &n in pool.numbers_from(draw) {
            *freq.entry(n).or_insert(0) += 1;
        }
    }
    freq
}

pub fn analyze_patterns(draws: &[Draw]) -> Option<PatternReport> {
    let n = draws.len();
    if n == 0 {
        return None;
    }

    let measure = |kind: RuleKind| -> Vec<i64> { draws.iter().map(|d| kind.measure(&d.mains)).collect() };
    let sums = measure(RuleKind::Sum);
    let odd_counts = measure(RuleKind::OddCount);
    let low_counts = measure(RuleKind::LowHighBalance);
    let spreads = measure(RuleKind::Spread);

    let consecutive_count = draws.iter().filter(|d| has_consecutive(&d.mains)).count();

    let mut gaps: BTreeMap<u8, usize> = BTreeMap::new();
    for draw in draws {
        for w in draw.mains.windows(2) {
            *gaps.entry(w[1] - w[0]).or_insert(0) += 1;
        }
    }

    let mut sums_sorted = sums.clone();
    sums_sorted.sort();
    let mut spreads_sorted = spreads.clone();
    spreads_sorted.sort();

    let odd_dist = distribution(&odd_counts);
    // À égalité, la valeur apparue en premier dans l'historique l'emporte.
    let most_common = odd_counts
        .iter()
        .fold((0i64, 0usize), |best, &v| {
            let c = odd_dist.get(&v).copied().unwrap_or(0);
            if c > best.1 { (v, c) } else { best }
        })
        .0;

    Some(PatternReport {
        num_draws: n,
        consecutive: ConsecutiveSummary {
            draws_with_at_least_one_consecutive_pair: consecutive_count,
            pct: round1(100.0 * consecutive_count as f64 / n as f64),
        },
        sum_6_mains: SumSummary {
            min: sums_sorted[0],
            max: sums_sorted[n - 1],
            mean: mean(&sums),
            p5: percentile(&sums_sorted, 5.0),
            p25: percentile(&sums_sorted, 25.0),
            p50: percentile(&sums_sorted, 50.0),
            p75: percentile(&sums_sorted, 75.0),
            p95: percentile(&sums_sorted, 95.0),
        },
        odd_count_per_draw: OddSummary {
            distribution: odd_dist,
            most_common,
        },
        low_count_per_draw: LowSummary {
            typical_range: [
                low_counts.iter().copied().min().unwrap_or(0),
                low_counts.iter().copied().max().unwrap_or(0),
            ],
            distribution: distribution(&low_counts),
        },
        spread: SpreadSummary {
            min: spreads_sorted[0],
            max: spreads_sorted[n - 1],
            mean: mean(&spreads),
            p10: percentile(&spreads_sorted, 10.0),
            p90: percentile(&spreads_sorted, 90.0),
        },
        gap_between_adjacent_numbers: GapSummary {
            consecutive_gaps_count: gaps.get(&1).copied().unwrap_or(0),
            distribution: gaps,
        },
        main_frequency: frequencies(draws, Pool::Main),
        strong_frequency: frequencies(draws, Pool::Strong),
    })
}
