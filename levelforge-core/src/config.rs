//! Configuration for the progression engine.
//!
//! Maps directly to `levelforge.toml`. Every section is optional; missing
//! keys fall back to the defaults documented on each field.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ProgressionError, Result};

/// Top-level progression configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// XP curve parameters.
    #[serde(default)]
    pub curve: CurveConfig,
    /// Quest reward modifiers.
    #[serde(default)]
    pub rewards: RewardConfig,
    /// Bounded collection sizes.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Milestone stat growth.
    #[serde(default)]
    pub milestones: MilestoneConfig,
    /// Notification policy.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl ProgressionConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ProgressionError::Config` if the TOML is invalid or fails
    /// [`validate`](Self::validate).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ProgressionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "Loaded progression config");
        Ok(config)
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    /// Returns `ProgressionError::Config` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let c = &self.curve;
        if !c.base_xp.is_finite() || c.base_xp <= 0.0 {
            return Err(ProgressionError::Config(format!(
                "curve.base_xp must be positive, got {}",
                c.base_xp
            )));
        }
        if !c.multiplier.is_finite() || c.multiplier <= 1.0 {
            return Err(ProgressionError::Config(format!(
                "curve.multiplier must be > 1.0, got {}",
                c.multiplier
            )));
        }
        if self.limits.cache_capacity == 0 {
            return Err(ProgressionError::Config("limits.cache_capacity must be > 0".into()));
        }
        let f = self.limits.cache_eviction_fraction;
        if !(f > 0.0 && f <= 1.0) {
            return Err(ProgressionError::Config(format!(
                "limits.cache_eviction_fraction must be in (0, 1], got {f}"
            )));
        }
        if self.limits.max_activity_log == 0 || self.limits.max_event_history == 0 {
            return Err(ProgressionError::Config(
                "limits.max_activity_log and limits.max_event_history must be > 0".into(),
            ));
        }
        if self.milestones.milestone_interval == 0 {
            return Err(ProgressionError::Config(
                "milestones.milestone_interval must be > 0".into(),
            ));
        }
        let r = &self.rewards;
        for (name, v) in [
            ("rewards.team_synergy_per_agent", r.team_synergy_per_agent),
            ("rewards.team_synergy_cap", r.team_synergy_cap),
            ("rewards.time_bonus_fast", r.time_bonus_fast),
            ("rewards.time_bonus_quick", r.time_bonus_quick),
            ("rewards.time_bonus_on_time", r.time_bonus_on_time),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ProgressionError::Config(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        for &(threshold, v) in &r.streak_steps {
            if !v.is_finite() || v < 0.0 {
                return Err(ProgressionError::Config(format!(
                    "rewards.streak_steps multiplier for {threshold} must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Exponential XP curve: `base_xp * multiplier^(level - 1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveConfig {
    /// XP needed to go from level 1 to level 2.
    #[serde(default = "default_base_xp")]
    pub base_xp: f64,
    /// Growth factor per level.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            base_xp: 100.0,
            multiplier: 1.5,
        }
    }
}

/// Quest reward modifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Multiplier for finishing in under 50% of the time limit.
    #[serde(default = "default_time_fast")]
    pub time_bonus_fast: f64,
    /// Multiplier for finishing in under 75% of the time limit.
    #[serde(default = "default_time_quick")]
    pub time_bonus_quick: f64,
    /// Multiplier for finishing within the time limit.
    #[serde(default = "default_time_on_time")]
    pub time_bonus_on_time: f64,
    /// Bonus per assigned agent beyond the first.
    #[serde(default = "default_synergy_per_agent")]
    pub team_synergy_per_agent: f64,
    /// Maximum team synergy multiplier.
    #[serde(default = "default_synergy_cap")]
    pub team_synergy_cap: f64,
    /// How many recent activity entries count towards the streak.
    #[serde(default = "default_streak_window")]
    pub streak_window: usize,
    /// Streak steps as `(min_entries, multiplier)`, checked highest first.
    #[serde(default = "default_streak_steps")]
    pub streak_steps: Vec<(usize, f64)>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            time_bonus_fast: 1.5,
            time_bonus_quick: 1.25,
            time_bonus_on_time: 1.1,
            team_synergy_per_agent: 0.1,
            team_synergy_cap: 1.5,
            streak_window: 10,
            streak_steps: default_streak_steps(),
        }
    }
}

/// Capacities for every bounded collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Activity entries kept per agent (newest first).
    #[serde(default = "default_50")]
    pub max_activity_log: usize,
    /// Events kept in the manager's history.
    #[serde(default = "default_100")]
    pub max_event_history: usize,
    /// Entries per calculator cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Share of a full cache evicted in one sweep.
    #[serde(default = "default_eviction_fraction")]
    pub cache_eviction_fraction: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_activity_log: 50,
            max_event_history: 100,
            cache_capacity: 1024,
            cache_eviction_fraction: 0.2,
        }
    }
}

/// Milestone stat growth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneConfig {
    /// Every Nth level is a milestone.
    #[serde(default = "default_5")]
    pub milestone_interval: u32,
    /// Points added to each stat per milestone crossed.
    #[serde(default = "default_1")]
    pub stat_increase_per_milestone: u32,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            milestone_interval: 5,
            stat_increase_per_milestone: 1,
        }
    }
}

/// Notification policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Emit a low-priority notification for awards that did not level up.
    #[serde(default)]
    pub notify_xp_gains: bool,
    /// Age after which dismissed notifications are swept by
    /// `clear_expired_notifications`.
    #[serde(default = "default_24")]
    pub dismissed_retention_hours: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            notify_xp_gains: false,
            dismissed_retention_hours: 24,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

fn default_base_xp() -> f64 {
    100.0
}
fn default_multiplier() -> f64 {
    1.5
}
fn default_time_fast() -> f64 {
    1.5
}
fn default_time_quick() -> f64 {
    1.25
}
fn default_time_on_time() -> f64 {
    1.1
}
fn default_synergy_per_agent() -> f64 {
    0.1
}
fn default_synergy_cap() -> f64 {
    1.5
}
fn default_streak_window() -> usize {
    10
}
fn default_streak_steps() -> Vec<(usize, f64)> {
    vec![(10, 1.3), (5, 1.15), (3, 1.05)]
}
fn default_50() -> usize {
    50
}
fn default_100() -> usize {
    100
}
fn default_cache_capacity() -> usize {
    1024
}
fn default_eviction_fraction() -> f64 {
    0.2
}
fn default_5() -> u32 {
    5
}
fn default_1() -> u32 {
    1
}
fn default_24() -> u32 {
    24
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
