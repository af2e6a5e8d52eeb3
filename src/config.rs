// ⚙️ Pipeline configuration
//
// Everything tunable lives here and is passed in explicitly. Missing JSON keys
// fall back to the reference values below; `validate()` runs before any work.

use crate::error::ValidationError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// RANKING CONFIG
// ============================================================================

/// A century; keeps date arithmetic far from chrono's range limits
const MAX_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Most recent games kept per team after windowing
    pub max_recent_games: usize,

    /// Games older than this many days before the evaluation date are ignored
    pub window_days: i64,

    /// Games after which a result's weight has halved
    pub half_life_games: f64,

    /// Below this many games a team is Provisional
    pub provisional_games: u32,

    /// At or above this many games a team is Full Sample
    pub full_sample_games: u32,

    /// Penalty per game missing below `provisional_games`
    pub strong_penalty_per_game: f64,

    /// Penalty per game missing below `full_sample_games`
    pub mild_penalty_per_game: f64,

    /// Provisional teams also carry the whole mild tier
    pub cascade_tiers: bool,

    pub w_off: f64,
    pub w_def: f64,
    pub w_sos: f64,

    /// Reference date for windowing. Defaults to the latest dated game.
    pub evaluation_date: Option<NaiveDate>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            max_recent_games: 20,
            window_days: 365,
            half_life_games: 12.0,
            provisional_games: 10,
            full_sample_games: 20,
            strong_penalty_per_game: 1.0,
            mild_penalty_per_game: 0.30,
            cascade_tiers: true,
            w_off: 0.375,
            w_def: 0.375,
            w_sos: 0.25,
            evaluation_date: None,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_recent_games == 0 {
            return Err(ValidationError::config("max_recent_games", "must be positive"));
        }
        if self.window_days <= 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(ValidationError::config(
                "window_days",
                format!("must be within 1-{}, got {}", MAX_WINDOW_DAYS, self.window_days),
            ));
        }
        if !(self.half_life_games.is_finite() && self.half_life_games > 0.0) {
            return Err(ValidationError::config(
                "half_life_games",
                format!("must be positive, got {}", self.half_life_games),
            ));
        }
        if self.provisional_games == 0 || self.provisional_games >= self.full_sample_games {
            return Err(ValidationError::config(
                "provisional_games",
                format!(
                    "must be positive and below full_sample_games ({} vs {})",
                    self.provisional_games, self.full_sample_games
                ),
            ));
        }

        non_negative("strong_penalty_per_game", self.strong_penalty_per_game)?;
        non_negative("mild_penalty_per_game", self.mild_penalty_per_game)?;
        non_negative("w_off", self.w_off)?;
        non_negative("w_def", self.w_def)?;
        non_negative("w_sos", self.w_sos)?;

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::config(
            field,
            format!("must be non-negative, got {}", value),
        ))
    }
}

// ============================================================================
// RESOLVER CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum similarity (0-100) for a fuzzy match to be accepted
    pub fuzzy_threshold: f64,

    /// Hex characters kept from the external-id hash
    pub external_id_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            fuzzy_threshold: 92.0,
            external_id_len: 16,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(ValidationError::config(
                "fuzzy_threshold",
                format!("must be within 0-100, got {}", self.fuzzy_threshold),
            ));
        }
        // sha256 hex digest is 64 chars
        if self.external_id_len == 0 || self.external_id_len > 64 {
            return Err(ValidationError::config(
                "external_id_len",
                format!("must be within 1-64, got {}", self.external_id_len),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ranking: RankingConfig,
    pub resolver: ResolverConfig,

    /// Collapse match records reported more than once
    pub dedupe_matches: bool,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig =
            serde_json::from_str(json).context("Failed to parse pipeline config")?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ranking.validate()?;
        self.resolver.validate()
    }
}
