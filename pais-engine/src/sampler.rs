use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use pais_db::models::Pool;

/// Essais de mélange uniforme avant d'abandonner (mode sans consécutifs).
pub const UNIFORM_TRIES: usize = 200;

fn is_adjacent_to_any(n: u8, chosen: &[u8]) -> bool {
    chosen.iter().any(|&c| c.abs_diff(n) == 1)
}

/// Tirage pondéré d'un numéro de `pool` absent de `exclude`.
///
/// Les candidats sont parcourus dans l'ordre croissant de la pool : on tire
/// `r` uniforme dans `[0, total)` puis on soustrait les poids jusqu'à `r <= 0`.
/// Ce parcours fixe rend la sélection reproductible à seed identique.
/// Retourne `None` si aucun candidat n'est éligible.
pub fn pick_weighted(
    weights: &[f64],
    pool: Pool,
    exclude: &[u8],
    no_consecutive: bool,
    rng: &mut StdRng,
) -> Option<u8> {
    let candidates: Vec<(u8, f64)> = pool
        .members()
        .filter(|n| !exclude.contains(n))
        .filter(|&n| !no_consecutive || !is_adjacent_to_any(n, exclude))
        .map(|n| (n, weights[(n - 1) as usize]))
        .collect();

    let (last, _) = *candidates.last()?;
    let total: f64 = candidates.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Some(candidates[0].0);
    }

    let mut r = rng.random_range(0.0..total);
    for &(n, w) in &candidates {
        r -= w;
        if r <= 0.0 {
            return Some(n);
        }
    }
    // Résidu d'arrondi flottant
    Some(last)
}

/// Six numéros principaux tirés sans remise, triés. `None` si un tirage intermédiaire échoue.
pub fn sample_mains(weights: &[f64], no_consecutive: bool, rng: &mut StdRng) -> Option<[u8; 6]> {
    let mut chosen = Vec::with_capacity(Pool::Main.pick_count());
    for _ in 0..Pool::Main.pick_count() {
        let n = pick_weighted(weights, Pool::Main, &chosen, no_consecutive, rng)?;
        chosen.push(n);
    }
    into_sorted_mains(&chosen)
}

/// Numéro fort : tirage pondéré indépendant sur toute la pool.
pub fn pick_strong(weights: &[f64], rng: &mut StdRng) -> u8 {
    // La pool forte n'est jamais vide sans exclusion.
    pick_weighted(weights, Pool::Strong, &[], false, rng).unwrap_or(1)
}

/// Sélection uniforme par mélange de la pool, en respectant seulement le mode sans consécutifs.
pub fn uniform_mains(no_consecutive: bool, rng: &mut StdRng) -> Option<[u8; 6]> {
    let count = Pool::Main.pick_count();
    for _ in 0..UNIFORM_TRIES {
        let mut pool: Vec<u8> = Pool::Main.members().collect();
        pool.shuffle(rng);

        let mut chosen = Vec::with_capacity(count);
        for n in pool {
            if chosen.len() >= count {
                break;
            }
            if !no_consecutive || !is_adjacent_to_any(n, &chosen) {
                chosen.push(n);
            }
        }
        if chosen.len() == count {
            return into_sorted_mains(&chosen);
        }
    }
    None
}

/// Six numéros distincts uniformes, sans aucune contrainte.
pub fn any_mains(rng: &mut StdRng) -> [u8; 6] {
    let mut mains = [0u8; 6];
    let indices = rand::seq::index::sample(rng, Pool::Main.size(), Pool::Main.pick_count());
    for (slot, idx) in mains.iter_mut().zip(indices.iter()) {
        *slot = (idx + 1) as u8;
    }
    mains.sort();
    mains
}

fn into_sorted_mains(chosen: &[u8]) -> Option<[u8; 6]> {
    let mut mains: [u8; 6] = chosen.try_into().ok()?;
    mains.sort();
    Some(mains)
}

pub fn has_consecutive(mains: &[u8]) -> bool {
    mains
        .iter()
        .any(|&m| mains.iter().any(|&other| other.abs_diff(m) == 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_pick_excludes_chosen() {
        let weights = vec![1.0; 37];
        let exclude: Vec<u8> = (1..=36).collect();
        let mut r = rng(1);
        for _ in 0..20 {
            assert_eq!(pick_weighted(&weights, Pool::Main, &exclude, false, &mut r), Some(37));
        }
    }

    #[test]
    fn test_pick_none_when_exhausted() {
        let weights = vec![1.0; 7];
        let exclude: Vec<u8> = (1..=7).collect();
        assert_eq!(pick_weighted(&weights, Pool::Strong, &exclude, false, &mut rng(1)), None);
    }

    #[test]
    fn test_pick_no_consecutive_filters_neighbours() {
        let weights = vec![1.0; 37];
        // Tout est exclu ou voisin sauf 37 : 1..=35 choisis -> 36 est voisin de 35.
        let exclude: Vec<u8> = (1..=35).collect();
        assert_eq!(pick_weighted(&weights, Pool::Main, &exclude, true, &mut rng(3)), Some(37));

        let exclude: Vec<u8> = (1..=36).collect();
        assert_eq!(pick_weighted(&weights, Pool::Main, &exclude, true, &mut rng(3)), None);
    }

    #[test]
    fn test_pick_follows_dominant_weight() {
        let mut weights = vec![0.1; 37];
        weights[19] = 1e9;
        let mut r = rng(7);
        let hits = (0..100)
            .filter(|_| pick_weighted(&weights, Pool::Main, &[], false, &mut r) == Some(20))
            .count();
        assert!(hits >= 99, "20 devrait dominer, {hits}/100");
    }

    #[test]
    fn test_sample_mains_valid() {
        let weights = vec![1.0; 37];
        let mut r = rng(42);
        for _ in 0..50 {
            let mains = sample_mains(&weights, false, &mut r).unwrap();
            assert!(mains.windows(2).all(|w| w[0] < w[1]));
            assert!(mains.iter().all(|&m| (1..=37).contains(&m)));
        }
    }

    #[test]
    fn test_sample_mains_no_consecutive() {
        let weights = vec![1.0; 37];
        let mut r = rng(42);
        for _ in 0..50 {
            let mains = sample_mains(&weights, true, &mut r).unwrap();
            assert!(!has_consecutive(&mains), "{mains:?}");
        }
    }

    #[test]
    fn test_pick_strong_in_range() {
        let weights = vec![0.1; 7];
        let mut r = rng(9);
        for _ in 0..50 {
            let s = pick_strong(&weights, &mut r);
            assert!((1..=7).contains(&s));
        }
    }

    #[test]
    fn test_uniform_mains() {
        let mut r = rng(5);
        for _ in 0..50 {
            let mains = uniform_mains(true, &mut r).unwrap();
            assert!(mains.windows(2).all(|w| w[0] < w[1]));
            assert!(!has_consecutive(&mains));
        }
    }

    #[test]
    fn test_any_mains_distinct() {
        let mut r = rng(11);
        for _ in 0..50 {
            let mains = any_mains(&mut r);
            assert!(mains.windows(2).all(|w| w[0] < w[1]));
            assert!(mains.iter().all(|&m| (1..=37).contains(&m)));
        }
    }

    #[test]
    fn test_seed_determinism() {
        let weights: Vec<f64> = (1..=37).map(|i| i as f64).collect();
        let a = sample_mains(&weights, false, &mut rng(123));
        let b = sample_mains(&weights, false, &mut rng(123));
        assert_eq!(a, b);
    }

    #[test]
    fn test_has_consecutive() {
        assert!(has_consecutive(&[1, 5, 9, 10, 20, 30]));
        assert!(!has_consecutive(&[1, 3, 5, 7, 9, 11]));
    }
}
