use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::selection::combinations::CombinationPolicy;
use crate::selection::hybrid::{
    HybridConfig, Phase2BulletCap, DEFAULT_MAX_COMBINATION_BULLETS, DEFAULT_SKILL_MATCH_RATIO,
};
use crate::selection::knapsack::DEFAULT_MAX_GRID_CELLS;
use crate::selection::lines::{LineEstimator, DEFAULT_CHARS_PER_LINE};
use crate::selection::value::{WeightedValueScorer, DEFAULT_SKILL_MATCH_WEIGHT};

/// Power-set enumeration is 2^n per story; longer limits are refused at startup.
const MAX_COMBINATION_BULLETS_CEILING: usize = 16;

/// Application configuration loaded from environment variables.
/// Every key has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub selection: SelectionConfig,
}

/// Tuning knobs for the selection engine.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub hybrid: HybridConfig,
    pub chars_per_line: u32,
    /// Weight of the skill-coverage bonus in combination scores.
    pub skill_match_weight: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            hybrid: HybridConfig::default(),
            chars_per_line: DEFAULT_CHARS_PER_LINE,
            skill_match_weight: DEFAULT_SKILL_MATCH_WEIGHT,
        }
    }
}

impl SelectionConfig {
    /// Rejects knob values that would make scores NaN or the solver blow up.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.hybrid.skill_match_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            bail!("SKILL_MATCH_RATIO must be between 0.0 and 1.0, got {ratio}");
        }
        let weight = self.skill_match_weight;
        if !weight.is_finite() || weight < 0.0 {
            bail!("SKILL_MATCH_WEIGHT must be a finite, non-negative number, got {weight}");
        }
        let max_bullets = self.hybrid.max_combination_bullets;
        if !(1..=MAX_COMBINATION_BULLETS_CEILING).contains(&max_bullets) {
            bail!(
                "MAX_COMBINATION_BULLETS must be between 1 and {MAX_COMBINATION_BULLETS_CEILING}, got {max_bullets}"
            );
        }
        if self.hybrid.max_grid_cells == 0 {
            bail!("MAX_GRID_CELLS must be positive");
        }
        Ok(())
    }

    pub fn scorer(&self) -> WeightedValueScorer {
        WeightedValueScorer {
            lines: LineEstimator::new(self.chars_per_line),
            skill_match_weight: self.skill_match_weight,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let phase2_bullet_cap = match std::env::var("PHASE2_BULLET_CAP") {
            Ok(value) => parse_bullet_cap(&value)?,
            Err(_) => Phase2BulletCap::default(),
        };
        let combination_policy = match std::env::var("COMBINATION_POLICY") {
            Ok(value) => parse_combination_policy(&value)?,
            Err(_) => CombinationPolicy::default(),
        };

        let selection = SelectionConfig {
            hybrid: HybridConfig {
                skill_match_ratio: parse_env("SKILL_MATCH_RATIO", DEFAULT_SKILL_MATCH_RATIO)?,
                max_combination_bullets: parse_env(
                    "MAX_COMBINATION_BULLETS",
                    DEFAULT_MAX_COMBINATION_BULLETS,
                )?,
                combination_policy,
                phase2_bullet_cap,
                max_grid_cells: parse_env("MAX_GRID_CELLS", DEFAULT_MAX_GRID_CELLS)?,
            },
            chars_per_line: parse_env("CHARS_PER_LINE", DEFAULT_CHARS_PER_LINE)?,
            skill_match_weight: parse_env("SKILL_MATCH_WEIGHT", DEFAULT_SKILL_MATCH_WEIGHT)?,
        };
        selection.validate()?;

        Ok(Config {
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            selection,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{value}'")),
        Err(_) => Ok(default),
    }
}

fn parse_bullet_cap(value: &str) -> Result<Phase2BulletCap> {
    match value.trim().to_lowercase().as_str() {
        "remaining" => Ok(Phase2BulletCap::Remaining),
        "unbounded" => Ok(Phase2BulletCap::Unbounded),
        other => bail!("PHASE2_BULLET_CAP must be 'remaining' or 'unbounded', got '{other}'"),
    }
}

fn parse_combination_policy(value: &str) -> Result<CombinationPolicy> {
    match value.trim().to_lowercase().as_str() {
        "power_set" => Ok(CombinationPolicy::PowerSet),
        "contiguous" => Ok(CombinationPolicy::Contiguous),
        other => bail!("COMBINATION_POLICY must be 'power_set' or 'contiguous', got '{other}'"),
    }
}
