use pais_db::models::{Draw, Pool};

/// Fenêtre "récente" par défaut (nombre de tirages).
pub const DEFAULT_WINDOW: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberStats {
    pub number: u8,
    /// Occurrences sur tout l'historique.
    pub frequency: u32,
    /// Occurrences dans les `window` derniers tirages.
    pub recent: u32,
    /// Tirages écoulés depuis la dernière apparition (0 = dernier tirage).
    pub staleness: u32,
}

/// Statistiques d'une pool, calculées une fois par session.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub pool: Pool,
    pub num_draws: usize,
    pub window: usize,
    pub numbers: Vec<NumberStats>,
}

impl StatsSnapshot {
    /// `None` hors de la pool (0 compris).
    pub fn get(&self, number: u8) -> Option<&NumberStats> {
        self.numbers.get(usize::from(number.checked_sub(1)?))
    }
}

/// draws[0] = tirage le plus ancien, draws[N-1] = le plus récent.
pub fn compute_stats(draws: &[Draw], pool: Pool, window: usize) -> StatsSnapshot {
    let n = draws.len();
    let mut numbers: Vec<NumberStats> = pool
        .members()
        .map(|number| NumberStats {
            number,
            frequency: 0,
            recent: 0,
            staleness: n as u32,
        })
        .collect();

    let recent_start = n.saturating_sub(window);

    for (idx, draw) in draws.iter().enumerate() {
        for &number in pool.numbers_from(draw) {
            let Some(stat) = numbers.get_mut((number as usize).wrapping_sub(1)) else {
                continue;
            };
            stat.frequency += 1;
            // Les tirages sont parcourus dans l'ordre chronologique : la dernière
            // apparition écrase les précédentes.
            stat.staleness = (n - 1 - idx) as u32;
            if idx >= recent_start {
                stat.recent += 1;
            }
        }
    }

    StatsSnapshot {
        pool,
        num_draws: n,
        window,
        numbers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(id: u32, mains: [u8; 6], strong: u8) -> Draw {
        Draw::new(id, mains, strong).unwrap()
    }

    fn sample_history() -> Vec<Draw> {
        vec![
            draw(1, [1, 2, 3, 4, 5, 6], 1),
            draw(2, [1, 10, 11, 12, 13, 14], 2),
            draw(3, [20, 21, 22, 23, 24, 37], 1),
        ]
    }

    #[test]
    fn test_get_outside_pool() {
        let stats = compute_stats(&sample_history(), Pool::Main, DEFAULT_WINDOW);
        assert!(stats.get(0).is_none());
        assert!(stats.get(38).is_none());
        assert_eq!(stats.get(37).unwrap().number, 37);
    }

    #[test]
    fn test_every_member_has_entry() {
        let stats = compute_stats(&sample_history(), Pool::Main, DEFAULT_WINDOW);
        assert_eq!(stats.numbers.len(), 37);
        let strong = compute_stats(&sample_history(), Pool::Strong, DEFAULT_WINDOW);
        assert_eq!(strong.numbers.len(), 7);
    }

    #[test]
    fn test_frequency_counts_all_time() {
        let stats = compute_stats(&sample_history(), Pool::Main, 1);
        assert_eq!(stats.get(1).unwrap().frequency, 2);
        assert_eq!(stats.get(37).unwrap().frequency, 1);
        assert_eq!(stats.get(30).unwrap().frequency, 0);
    }

    #[test]
    fn test_recent_restricted_to_window() {
        let stats = compute_stats(&sample_history(), Pool::Main, 2);
        // Le tirage 1 est hors fenêtre.
        assert_eq!(stats.get(2).unwrap().recent, 0);
        assert_eq!(stats.get(1).unwrap().recent, 1);
        assert_eq!(stats.get(24).unwrap().recent, 1);
    }

    #[test]
    fn test_window_larger_than_history() {
        let stats = compute_stats(&sample_history(), Pool::Main, 500);
        assert_eq!(stats.get(1).unwrap().recent, 2);
    }

    #[test]
    fn test_staleness_relative_to_newest() {
        let stats = compute_stats(&sample_history(), Pool::Main, DEFAULT_WINDOW);
        assert_eq!(stats.get(37).unwrap().staleness, 0);
        assert_eq!(stats.get(10).unwrap().staleness, 1);
        assert_eq!(stats.get(1).unwrap().staleness, 1);
        assert_eq!(stats.get(6).unwrap().staleness, 2);
        // Jamais sorti : staleness = nombre total de tirages.
        assert_eq!(stats.get(30).unwrap().staleness, 3);
    }

    #[test]
    fn test_strong_pool_stats() {
        let stats = compute_stats(&sample_history(), Pool::Strong, DEFAULT_WINDOW);
        assert_eq!(stats.get(1).unwrap().frequency, 2);
        assert_eq!(stats.get(1).unwrap().staleness, 0);
        assert_eq!(stats.get(2).unwrap().staleness, 1);
        assert_eq!(stats.get(7).unwrap().staleness, 3);
    }

    #[test]
    fn test_empty_history() {
        let stats = compute_stats(&[], Pool::Main, DEFAULT_WINDOW);
        assert_eq!(stats.num_draws, 0);
        for s in &stats.numbers {
            assert_eq!(s.frequency, 0);
            assert_eq!(s.recent, 0);
            assert_eq!(s.staleness, 0);
        }
    }
}
