use serde::{Deserialize, Serialize};

use pais_db::models::{Draw, Pool};

use crate::stats::{compute_stats, StatsSnapshot};

// Constantes de réglage empiriques : aucune base statistique, à conserver telles quelles.
pub const MAIN_STALENESS_CAP: u32 = 100;
pub const STRONG_STALENESS_CAP: u32 = 50;
pub const STALENESS_FACTOR: f64 = 0.5;
pub const WEIGHT_FLOOR: f64 = 0.1;

const MAIN_FREQUENCY_BOOST: f64 = 15.0;
const STRONG_FREQUENCY_BOOST: f64 = 8.0;

/// Modèle de pondération des numéros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringModel {
    /// Numéros "chauds" (fréquence récente) + numéros "en retard" (staleness plafonnée).
    #[default]
    HotDue,
    /// HotDue + bonus proportionnel à la fréquence historique relative à l'attendu.
    Boosted,
}

impl std::fmt::Display for ScoringModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringModel::HotDue => write!(f, "hot-due"),
            ScoringModel::Boosted => write!(f, "boosted"),
        }
    }
}

fn staleness_cap(pool: Pool) -> u32 {
    match pool {
        Pool::Main => MAIN_STALENESS_CAP,
        Pool::Strong => STRONG_STALENESS_CAP,
    }
}

fn frequency_boost(pool: Pool) -> f64 {
    match pool {
        Pool::Main => MAIN_FREQUENCY_BOOST,
        Pool::Strong => STRONG_FREQUENCY_BOOST,
    }
}

/// Poids brut (non plancher) d'un numéro.
pub fn raw_score(stats: &StatsSnapshot, number: u8, model: ScoringModel) -> f64 {
    let Some(s) = stats.get(number) else {
        return 0.0;
    };
    let hot = s.recent as f64;
    let due = s.staleness.min(staleness_cap(stats.pool)) as f64 * STALENESS_FACTOR;

    match model {
        ScoringModel::HotDue => hot + due,
        ScoringModel::Boosted => {
            let pool = stats.pool;
            let expected = if stats.num_draws > 0 {
                stats.num_draws as f64 * pool.pick_count() as f64 / pool.size() as f64
            } else {
                1.0
            };
            hot + due + s.frequency as f64 / expected * frequency_boost(pool)
        }
    }
}

/// Poids de chaque membre de la pool, indexés par `numéro - 1`, tous >= WEIGHT_FLOOR.
pub fn compute_weights(stats: &StatsSnapshot, model: ScoringModel) -> Vec<f64> {
    stats
        .pool
        .members()
        .map(|n| raw_score(stats, n, model).max(WEIGHT_FLOOR))
        .collect()
}

/// Statistiques et poids des deux pools, partagés par tous les tirages d'une session.
#[derive(Debug, Clone)]
pub struct ScoredPools {
    pub main_stats: StatsSnapshot,
    pub strong_stats: StatsSnapshot,
    pub main_weights: Vec<f64>,
    pub strong_weights: Vec<f64>,
}

impl ScoredPools {
    pub fn new(draws: &[Draw], window: usize, model: ScoringModel) -> Self {
        let main_stats = compute_stats(draws, Pool::Main, window);
        let strong_stats = compute_stats(draws, Pool::Strong, window);
        let main_weights = compute_weights(&main_stats, model);
        let strong_weights = compute_weights(&strong_stats, model);
        Self {
            main_stats,
            strong_stats,
            main_weights,
            strong_weights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DEFAULT_WINDOW;

    fn history(n: u32) -> Vec<Draw> {
        (0..n)
            .map(|i| {
                let base = (i % 5) as u8 * 6;
                Draw::new(
                    i + 1,
                    [base + 1, base + 2, base + 3, base + 4, base + 5, base + 6],
                    (i % 7) as u8 + 1,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_empty_history_weights_are_floor() {
        let pools = ScoredPools::new(&[], DEFAULT_WINDOW, ScoringModel::HotDue);
        assert!(pools.main_weights.iter().all(|&w| w == WEIGHT_FLOOR));
        assert!(pools.strong_weights.iter().all(|&w| w == WEIGHT_FLOOR));
        assert_eq!(pools.main_weights.len(), 37);
        assert_eq!(pools.strong_weights.len(), 7);
    }

    #[test]
    fn test_main_formula() {
        let draws = history(10);
        let stats = compute_stats(&draws, Pool::Main, DEFAULT_WINDOW);
        // Numéro 7 : tirages d'index 1 et 6 -> recent = 2, staleness = 3.
        assert_eq!(stats.get(7).unwrap().recent, 2);
        assert_eq!(stats.get(7).unwrap().staleness, 3);
        assert_eq!(raw_score(&stats, 7, ScoringModel::HotDue), 2.0 + 3.0 * 0.5);
        // Numéro 37 jamais sorti : staleness = 10.
        assert_eq!(raw_score(&stats, 37, ScoringModel::HotDue), 5.0);
    }

    #[test]
    fn test_staleness_capped() {
        let draws = history(300);
        let main = compute_stats(&draws, Pool::Main, DEFAULT_WINDOW);
        // 37 jamais sorti : staleness 300, plafonnée à 100.
        assert_eq!(raw_score(&main, 37, ScoringModel::HotDue), 50.0);

        let only_one_strong: Vec<Draw> = (1..=80)
            .map(|i| Draw::new(i, [1, 2, 3, 4, 5, 6], 1).unwrap())
            .collect();
        let strong = compute_stats(&only_one_strong, Pool::Strong, DEFAULT_WINDOW);
        // Plafond 50 pour la pool forte.
        assert_eq!(raw_score(&strong, 7, ScoringModel::HotDue), 25.0);
    }

    #[test]
    fn test_weights_never_below_floor() {
        let draws = history(40);
        let pools = ScoredPools::new(&draws, 5, ScoringModel::HotDue);
        for &w in pools.main_weights.iter().chain(pools.strong_weights.iter()) {
            assert!(w >= WEIGHT_FLOOR, "poids {w} sous le plancher");
        }
    }

    #[test]
    fn test_number_in_last_draw_only_gets_floor() {
        // Un numéro sorti uniquement au dernier tirage, fenêtre nulle : recent 0, staleness 0.
        let draws = vec![Draw::new(1, [1, 2, 3, 4, 5, 6], 1).unwrap()];
        let stats = compute_stats(&draws, Pool::Main, 0);
        let weights = compute_weights(&stats, ScoringModel::HotDue);
        assert_eq!(weights[0], WEIGHT_FLOOR);
    }

    #[test]
    fn test_boosted_adds_frequency_term() {
        let draws = history(10);
        let stats = compute_stats(&draws, Pool::Main, DEFAULT_WINDOW);
        let hot_due = raw_score(&stats, 1, ScoringModel::HotDue);
        let boosted = raw_score(&stats, 1, ScoringModel::Boosted);
        // frequence 2, attendu 10 * 6 / 37
        let expected_bonus = 2.0 / (10.0 * 6.0 / 37.0) * 15.0;
        assert!((boosted - hot_due - expected_bonus).abs() < 1e-9);
    }

    #[test]
    fn test_boosted_empty_history() {
        let stats = compute_stats(&[], Pool::Strong, DEFAULT_WINDOW);
        assert_eq!(raw_score(&stats, 3, ScoringModel::Boosted), 0.0);
    }
}
