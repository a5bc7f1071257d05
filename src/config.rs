use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Calibration can never be declared complete with fewer sessions than this.
pub const MIN_SESSIONS_FLOOR: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_sessions: usize,
    pub extended_sessions: usize,
    pub std_epsilon: f64,
    pub high_variance_multiple: f64,
    pub extension_trigger: usize,
    pub renormalize_missing_domains: bool,
    pub noisy_domain_fraction: f64,
    pub uniform_prior: f64,
    pub min_timeline_points: usize,
    pub velocity_window: usize,
    pub profile_window: usize,
    pub horizon_weeks: usize,
    pub confidence_decay: f64,
    pub threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_sessions: 14,
            extended_sessions: 21,
            std_epsilon: 0.03,
            high_variance_multiple: 5.0,
            extension_trigger: 5,
            renormalize_missing_domains: false,
            noisy_domain_fraction: 0.5,
            uniform_prior: 0.02,
            min_timeline_points: 7,
            velocity_window: 4,
            profile_window: 8,
            horizon_weeks: 12,
            confidence_decay: 0.97,
            threads: 0,
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("invalid engine config {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("failed to parse engine config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_sessions < MIN_SESSIONS_FLOOR {
            bail!(
                "min_sessions must be at least {} (got {})",
                MIN_SESSIONS_FLOOR,
                self.min_sessions
            );
        }
        if self.extended_sessions < self.min_sessions {
            bail!("extended_sessions must not be below min_sessions");
        }
        if !(self.std_epsilon > 0.0 && self.std_epsilon.is_finite()) {
            bail!("std_epsilon must be a positive finite number");
        }
        if self.high_variance_multiple < 1.0 {
            bail!("high_variance_multiple must be at least 1.0");
        }
        if !(0.0..=1.0).contains(&self.noisy_domain_fraction) {
            bail!("noisy_domain_fraction must be in [0, 1]");
        }
        if !(self.uniform_prior > 0.0 && self.uniform_prior.is_finite()) {
            bail!("uniform_prior must be positive");
        }
        if self.velocity_window < 2 || self.profile_window < 2 {
            bail!("regression windows need at least 2 points");
        }
        if !(self.confidence_decay > 0.0 && self.confidence_decay < 1.0) {
            bail!("confidence_decay must be in (0, 1)");
        }
        Ok(())
    }

    /// Sessions required before a baseline is complete.
    pub fn required_sessions(&self) -> usize {
        self.min_sessions.max(MIN_SESSIONS_FLOOR)
    }

    pub fn high_variance_ceiling(&self) -> f64 {
        self.std_epsilon * self.high_variance_multiple
    }
}
