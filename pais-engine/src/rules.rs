use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use pais_db::models::validate_draw;

use crate::sampler::has_consecutive;

/// Limite basse/haute des numéros "bas" (1-18).
pub const LOW_MAX: u8 = 18;

pub fn rules_path() -> PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("rules");
    path.push("LOTTO_RULES.json");
    path
}

/// Fichier de règles : `{ "rules": { <nom>: { "enabled": bool, ...bornes } } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Rules,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_consecutive_main_numbers: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_6_mains: Option<RangeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odd_count: Option<RangeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<RangeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_high_balance: Option<LowCountRule>,
}

/// Règle booléenne : `true` ou `{ "enabled": true }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle {
    Flag(bool),
    Rule {
        #[serde(default)]
        enabled: bool,
    },
}

impl Toggle {
    pub fn enabled(&self) -> bool {
        match *self {
            Toggle::Flag(on) => on,
            Toggle::Rule { enabled } => enabled,
        }
    }
}

/// Règle numérique à bornes inclusives ; une borne absente prend la valeur par défaut de la règle.
/// Les bornes JSON sont des nombres quelconques (`100` comme `100.0`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeRule {
    pub fn bounds(&self, kind: RuleKind) -> (f64, f64) {
        let (lo, hi) = kind.default_bounds();
        (self.min.unwrap_or(lo), self.max.unwrap_or(hi))
    }
}

/// `low_high_balance` : seules les clés `low_count_min` / `low_count_max` comptent,
/// `min` / `max` sont ignorées.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LowCountRule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_count_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_count_max: Option<f64>,
}

impl From<LowCountRule> for RangeRule {
    fn from(rule: LowCountRule) -> Self {
        RangeRule {
            enabled: rule.enabled,
            min: rule.low_count_min,
            max: rule.low_count_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Format,
    NoConsecutive,
    Sum,
    OddCount,
    Spread,
    LowHighBalance,
}

impl RuleKind {
    pub const NUMERIC: [RuleKind; 4] = [
        RuleKind::Sum,
        RuleKind::OddCount,
        RuleKind::Spread,
        RuleKind::LowHighBalance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Format => "format",
            RuleKind::NoConsecutive => "no_consecutive_main_numbers",
            RuleKind::Sum => "sum_6_mains",
            RuleKind::OddCount => "odd_count",
            RuleKind::Spread => "spread",
            RuleKind::LowHighBalance => "low_high_balance",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RuleKind::Format => "format",
            RuleKind::NoConsecutive => "numéros consécutifs",
            RuleKind::Sum => "somme des 6 numéros",
            RuleKind::OddCount => "numéros impairs",
            RuleKind::Spread => "écart max-min",
            RuleKind::LowHighBalance => "numéros bas (1-18)",
        }
    }

    pub fn default_bounds(&self) -> (f64, f64) {
        match self {
            RuleKind::Sum => (0.0, 999.0),
            RuleKind::OddCount | RuleKind::LowHighBalance => (0.0, 6.0),
            RuleKind::Spread => (0.0, 36.0),
            RuleKind::Format | RuleKind::NoConsecutive => (0.0, 0.0),
        }
    }

    /// Valeur mesurée sur les numéros principaux (triés ou non).
    pub fn measure(&self, mains: &[u8]) -> i64 {
        match self {
            RuleKind::Sum => mains.iter().map(|&m| m as i64).sum(),
            RuleKind::OddCount => mains.iter().filter(|&&m| m % 2 == 1).count() as i64,
            RuleKind::Spread => {
                let max = mains.iter().max().copied().unwrap_or(0);
                let min = mains.iter().min().copied().unwrap_or(0);
                (max - min) as i64
            }
            RuleKind::LowHighBalance => mains.iter().filter(|&&m| m <= LOW_MAX).count() as i64,
            RuleKind::NoConsecutive => has_consecutive(mains) as i64,
            RuleKind::Format => 0,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleCheck {
    pub rule: RuleKind,
    pub passed: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleReport {
    pub checks: Vec<RuleCheck>,
}

impl RuleReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

impl RuleSet {
    pub fn no_consecutive(&self) -> bool {
        self.rules
            .no_consecutive_main_numbers
            .is_some_and(|t| t.enabled())
    }

    /// Remplace la règle des consécutifs (filtre du tirage et contrôle d'acceptation).
    pub fn with_no_consecutive(mut self, enabled: bool) -> Self {
        self.rules.no_consecutive_main_numbers = Some(Toggle::Flag(enabled));
        self
    }

    pub fn numeric_rule(&self, kind: RuleKind) -> Option<RangeRule> {
        match kind {
            RuleKind::Sum => self.rules.sum_6_mains,
            RuleKind::OddCount => self.rules.odd_count,
            RuleKind::Spread => self.rules.spread,
            RuleKind::LowHighBalance => self.rules.low_high_balance.map(RangeRule::from),
            RuleKind::Format | RuleKind::NoConsecutive => None,
        }
    }

    /// Règles numériques activées, avec leurs bornes effectives.
    pub fn enabled_ranges(&self) -> impl Iterator<Item = (RuleKind, f64, f64)> + '_ {
        RuleKind::NUMERIC.into_iter().filter_map(|kind| {
            let rule = self.numeric_rule(kind).filter(|r| r.enabled)?;
            let (lo, hi) = rule.bounds(kind);
            Some((kind, lo, hi))
        })
    }

    /// ET logique de toutes les règles activées ; une règle absente passe toujours.
    pub fn passes(&self, mains: &[u8]) -> bool {
        if self.no_consecutive() && has_consecutive(mains) {
            return false;
        }
        self.enabled_ranges().all(|(kind, lo, hi)| {
            let value = kind.measure(mains) as f64;
            lo <= value && value <= hi
        })
    }

    /// Rapport détaillé : contrôle de format puis une ligne par règle activée.
    pub fn evaluate(&self, mains: &[u8], strong: u8) -> RuleReport {
        if let Err(e) = validate_draw(mains, strong) {
            return RuleReport {
                checks: vec![RuleCheck {
                    rule: RuleKind::Format,
                    passed: false,
                    message: e.to_string(),
                }],
            };
        }

        let mut checks = Vec::new();

        if self.no_consecutive() {
            let passed = !has_consecutive(mains);
            let message = if passed {
                "aucun numéro consécutif".to_string()
            } else {
                "la grille contient des numéros consécutifs (ex. 10, 11)".to_string()
            };
            checks.push(RuleCheck { rule: RuleKind::NoConsecutive, passed, message });
        }

        for (kind, lo, hi) in self.enabled_ranges() {
            let value = kind.measure(mains);
            let passed = lo <= value as f64 && value as f64 <= hi;
            let verdict = if passed { "dans" } else { "hors de" };
            checks.push(RuleCheck {
                rule: kind,
                passed,
                message: format!("{} = {value} {verdict} [{lo}, {hi}]", kind.label()),
            });
        }

        RuleReport { checks }
    }

    /// Bornes inversées refusées, uniquement sur les règles activées.
    pub fn validate(&self) -> Result<()> {
        for (kind, lo, hi) in self.enabled_ranges() {
            if lo > hi {
                bail!("Règle {}: borne min {} > max {}", kind, lo, hi);
            }
        }
        Ok(())
    }
}

pub fn parse_rules(json: &str) -> Result<RuleSet> {
    let rules: RuleSet = serde_json::from_str(json).context("Fichier de règles invalide")?;
    rules.validate()?;
    Ok(rules)
}

/// `Ok(None)` si le fichier n'existe pas : absence de règles.
pub fn load_rules(path: &Path) -> Result<Option<RuleSet>> {
    if !path.is_file() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let rules = parse_rules(&json).with_context(|| format!("Règles {:?}", path))?;
    Ok(Some(rules))
}
