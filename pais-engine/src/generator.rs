use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, warn};

use pais_db::models::Draw;

use crate::rules::RuleSet;
use crate::sampler::{any_mains, pick_strong, sample_mains, uniform_mains};
use crate::scoring::{ScoredPools, ScoringModel};
use crate::stats::DEFAULT_WINDOW;

pub const DEFAULT_MAX_ATTEMPTS: usize = 200;
pub const DEFAULT_FALLBACK_ATTEMPTS: usize = 100;

/// Échelon de l'échelle de repli qui a produit la grille.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Tirage pondéré, toutes les règles respectées.
    Sampling,
    /// Mélange uniforme, toutes les règles respectées.
    Fallback,
    /// Aucune garantie sur les règles.
    Degraded,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Sampling => write!(f, "pondéré"),
            Stage::Fallback => write!(f, "repli"),
            Stage::Degraded => write!(f, "dégradé"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSet {
    pub mains: [u8; 6],
    pub strong: u8,
    pub stage: Stage,
    /// Tentatives consommées dans l'échelon qui a accepté la grille.
    pub attempts: usize,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub window: usize,
    pub max_attempts: usize,
    pub fallback_attempts: usize,
    /// Force le mode sans consécutifs ; `None` = valeur du fichier de règles.
    pub no_consecutive: Option<bool>,
    pub scoring: ScoringModel,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            fallback_attempts: DEFAULT_FALLBACK_ATTEMPTS,
            no_consecutive: None,
            scoring: ScoringModel::default(),
        }
    }
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Moteur de génération : statistiques et poids calculés une seule fois,
/// puis une grille par requête via SAMPLING -> FALLBACK -> DEGRADED.
#[derive(Debug, Clone)]
pub struct Generator {
    pools: ScoredPools,
    rules: RuleSet,
    config: GeneratorConfig,
}

impl Generator {
    /// `draws` du plus ancien au plus récent ; `rules = None` : contrôles de format seulement.
    /// `config.no_consecutive` remplace la règle du fichier pour le tirage comme pour l'acceptation.
    pub fn new(draws: &[Draw], rules: Option<RuleSet>, config: GeneratorConfig) -> Self {
        let pools = ScoredPools::new(draws, config.window, config.scoring);
        debug!(
            draws = draws.len(),
            window = config.window,
            model = %config.scoring,
            "statistiques calculées"
        );
        let rules = rules.unwrap_or_default();
        let rules = match config.no_consecutive {
            Some(enabled) => rules.with_no_consecutive(enabled),
            None => rules,
        };
        Self { pools, rules, config }
    }

    pub fn pools(&self) -> &ScoredPools {
        &self.pools
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn no_consecutive(&self) -> bool {
        self.rules.no_consecutive()
    }

    pub fn generate(&self, count: usize, rng: &mut StdRng) -> Vec<CandidateSet> {
        (0..count).map(|_| self.generate_one(rng)).collect()
    }

    pub fn generate_one(&self, rng: &mut StdRng) -> CandidateSet {
        if let Some(set) = self.try_sampling(rng) {
            return set;
        }
        debug!(
            attempts = self.config.max_attempts,
            "budget pondéré épuisé, passage au repli uniforme"
        );

        if let Some(set) = self.try_fallback(rng) {
            return set;
        }
        warn!(
            attempts = self.config.fallback_attempts,
            "repli épuisé, grille dégradée (règles ignorées)"
        );

        self.degrade(rng)
    }

    fn try_sampling(&self, rng: &mut StdRng) -> Option<CandidateSet> {
        let no_consecutive = self.no_consecutive();
        for attempt in 1..=self.config.max_attempts {
            let Some(mains) = sample_mains(&self.pools.main_weights, no_consecutive, rng) else {
                continue;
            };
            let strong = pick_strong(&self.pools.strong_weights, rng);
            if self.rules.passes(&mains) {
                return Some(CandidateSet {
                    mains,
                    strong,
                    stage: Stage::Sampling,
                    attempts: attempt,
                });
            }
        }
        None
    }

    fn try_fallback(&self, rng: &mut StdRng) -> Option<CandidateSet> {
        let no_consecutive = self.no_consecutive();
        for attempt in 1..=self.config.fallback_attempts {
            let Some(mains) = uniform_mains(no_consecutive, rng) else {
                continue;
            };
            if self.rules.passes(&mains) {
                return Some(CandidateSet {
                    mains,
                    strong: pick_strong(&self.pools.strong_weights, rng),
                    stage: Stage::Fallback,
                    attempts: attempt,
                });
            }
        }
        None
    }

    fn degrade(&self, rng: &mut StdRng) -> CandidateSet {
        let mains = uniform_mains(self.no_consecutive(), rng).unwrap_or_else(|| any_mains(rng));
        CandidateSet {
            mains,
            strong: pick_strong(&self.pools.strong_weights, rng),
            stage: Stage::Degraded,
            attempts: 1,
        }
    }
}
