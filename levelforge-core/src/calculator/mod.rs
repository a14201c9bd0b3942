//! XP Calculator: curve math and quest rewards.
//!
//! The per-level requirement follows an exponential curve:
//!
//! ```text
//!   required(L) = floor(base × multiplier^(L-1))
//!   total(L)    = Σ required(l)  for l in [1, L)
//! ```
//!
//! `total` is served from a prefix table built once at construction, so the
//! inverse lookup ([`XpCalculator::level_from_total_xp`]) is a binary search
//! over that table. Everything else is memoised in [`BoundedCache`]s; the
//! caches never change a result, only how fast it is produced.
//!
//! The table stops at the last level whose cumulative total fits in a `u64`
//! ([`XpCalculator::max_level`], 97 on the default curve). That level is the
//! hard cap: no amount of XP resolves past it.

pub mod reward;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cache::{BoundedCache, CacheStats};
use crate::config::{CurveConfig, ProgressionConfig, RewardConfig};
use crate::error::Result;
use crate::quest::{CompletionContext, Quest};
use crate::types::Agent;

pub use reward::{RewardBreakdown, RewardKey};

/// Upper bound on the prefix table for slow-growing curves. Steep curves
/// overflow `u64` and stop earlier.
pub const LEVEL_SEARCH_CEILING: u32 = 256;

/// Where a total XP value lands on the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Level reached (>= 1).
    pub level: u32,
    /// XP earned past the start of `level`.
    pub current_level_xp: u64,
    /// XP required to go from `level` to `level + 1`.
    pub xp_to_next: u64,
}

impl LevelInfo {
    /// Fraction of the current level completed, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_ratio(&self) -> f64 {
        if self.xp_to_next == 0 {
            return 0.0;
        }
        (self.current_level_xp as f64 / self.xp_to_next as f64).clamp(0.0, 1.0)
    }
}

struct CalculatorCaches {
    required: BoundedCache<u32, u64>,
    levels: BoundedCache<u64, LevelInfo>,
    rewards: BoundedCache<RewardKey, u64>,
}

/// Translates between XP and levels and prices quest completions.
///
/// Shareable across threads; cache access goes through one short-lived lock.
pub struct XpCalculator {
    curve: CurveConfig,
    rewards: RewardConfig,
    /// `prefix[i]` is the cumulative XP needed to reach level `i + 1`.
    /// Every entry is exact; `prefix.len()` is the level cap.
    prefix: Vec<u64>,
    caches: Mutex<CalculatorCaches>,
}

impl XpCalculator {
    /// Build a calculator from the curve, reward and cache settings.
    #[must_use]
    pub fn new(config: &ProgressionConfig) -> Self {
        let curve = config.curve.clone();
        let capacity = config.limits.cache_capacity;
        let fraction = config.limits.cache_eviction_fraction;

        let mut prefix = Vec::with_capacity(LEVEL_SEARCH_CEILING as usize);
        let mut running = 0u64;
        prefix.push(running);
        for level in 1..LEVEL_SEARCH_CEILING {
            match running.checked_add(curve_value(&curve, level)) {
                Some(next) if next < u64::MAX => {
                    running = next;
                    prefix.push(running);
                }
                _ => break,
            }
        }

        Self {
            curve,
            rewards: config.rewards.clone(),
            prefix,
            caches: Mutex::new(CalculatorCaches {
                required: BoundedCache::new(capacity, fraction),
                levels: BoundedCache::new(capacity, fraction),
                rewards: BoundedCache::new(capacity, fraction),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Curve
    // ------------------------------------------------------------------

    /// XP needed to go from `level` to `level + 1`. Level 0 is treated as 1.
    #[must_use]
    pub fn xp_required_for_level(&self, level: u32) -> u64 {
        let level = level.max(1);
        if let Some(v) = self.caches.lock().required.get(&level) {
            return v;
        }
        let value = curve_value(&self.curve, level);
        self.caches.lock().required.insert(level, value);
        value
    }

    /// Highest reachable level: the last one whose cumulative XP fits in a
    /// `u64`.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.prefix.len()).unwrap_or(LEVEL_SEARCH_CEILING)
    }

    /// Cumulative XP needed to reach `target_level` from level 1.
    ///
    /// Levels past [`max_level`](Self::max_level) are unreachable and
    /// report `u64::MAX`.
    #[must_use]
    pub fn total_xp_for_level(&self, target_level: u32) -> u64 {
        let target = target_level.max(1);
        self.prefix
            .get(target as usize - 1)
            .copied()
            .unwrap_or(u64::MAX)
    }

    /// Inverse of [`total_xp_for_level`](Self::total_xp_for_level), capped
    /// at [`max_level`](Self::max_level).
    #[must_use]
    pub fn level_from_total_xp(&self, total_xp: u64) -> LevelInfo {
        if let Some(info) = self.caches.lock().levels.get(&total_xp) {
            return info;
        }

        // prefix[0] == 0, so at least one entry always qualifies.
        let count = self.prefix.partition_point(|&t| t <= total_xp);
        let level = u32::try_from(count).unwrap_or(LEVEL_SEARCH_CEILING).max(1);
        let info = LevelInfo {
            level,
            current_level_xp: total_xp - self.total_xp_for_level(level),
            xp_to_next: self.xp_required_for_level(level),
        };

        self.caches.lock().levels.insert(total_xp, info);
        info
    }

    /// [`level_from_total_xp`](Self::level_from_total_xp) over many values.
    #[must_use]
    pub fn batch_level_from_total_xp(&self, totals: &[u64]) -> Vec<LevelInfo> {
        totals.iter().map(|&t| self.level_from_total_xp(t)).collect()
    }

    /// Total XP implied by an agent's level and in-level XP.
    #[must_use]
    pub fn total_xp_of(&self, agent: &Agent) -> u64 {
        self.total_xp_for_level(agent.level).saturating_add(agent.xp)
    }

    /// Pre-populate the per-level cache up to `up_to`, or the level cap if
    /// lower.
    pub fn warm_up(&self, up_to: u32) {
        let top = up_to.min(self.max_level());
        let mut caches = self.caches.lock();
        for level in 1..=top {
            let value = curve_value(&self.curve, level);
            caches.required.insert(level, value);
        }
    }

    // ------------------------------------------------------------------
    // Rewards
    // ------------------------------------------------------------------

    /// Streak multiplier from the agent's recent activity.
    #[must_use]
    pub fn streak_bonus(&self, agent: &Agent) -> f64 {
        reward::streak_bonus(&agent.activity, &self.rewards)
    }

    /// Every multiplier stage that feeds [`quest_xp_reward`](Self::quest_xp_reward).
    ///
    /// # Errors
    /// Returns `ProgressionError::InvalidMultiplier` if the context's
    /// team-performance bonus is negative or not finite.
    pub fn reward_breakdown(
        &self,
        quest: &Quest,
        agent: &Agent,
        context: &CompletionContext,
    ) -> Result<RewardBreakdown> {
        RewardBreakdown::compute(quest, agent, context, &self.rewards)
    }

    /// XP paid to `agent` for completing `quest`.
    ///
    /// # Errors
    /// Same as [`reward_breakdown`](Self::reward_breakdown).
    pub fn quest_xp_reward(
        &self,
        quest: &Quest,
        agent: &Agent,
        context: &CompletionContext,
    ) -> Result<u64> {
        reward::validate_context(context)?;
        let key = RewardKey::new(quest, agent, context, &self.rewards);
        if let Some(xp) = self.caches.lock().rewards.get(&key) {
            return Ok(xp);
        }
        let breakdown = self.reward_breakdown(quest, agent, context)?;
        let xp = breakdown.total();
        trace!(quest = %quest.id, agent = %agent.id, xp, "Computed quest reward");
        self.caches.lock().rewards.insert(key, xp);
        Ok(xp)
    }

    // ------------------------------------------------------------------
    // Cache control
    // ------------------------------------------------------------------

    /// Enable or disable all memo caches. Results are identical either way.
    pub fn set_cache_enabled(&self, enabled: bool) {
        let mut caches = self.caches.lock();
        caches.required.set_enabled(enabled);
        caches.levels.set_enabled(enabled);
        caches.rewards.set_enabled(enabled);
    }

    /// Empty all memo caches.
    pub fn clear_cache(&self) {
        let mut caches = self.caches.lock();
        caches.required.clear();
        caches.levels.clear();
        caches.rewards.clear();
    }

    /// Combined counters across the three caches.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        let caches = self.caches.lock();
        caches
            .required
            .stats()
            .combine(caches.levels.stats())
            .combine(caches.rewards.stats())
    }
}

impl Default for XpCalculator {
    fn default() -> Self {
        Self::new(&ProgressionConfig::default())
    }
}

/// `floor(base × multiplier^(level-1))`, saturating at `u64::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn curve_value(curve: &CurveConfig, level: u32) -> u64 {
    let exponent = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
    let raw = (curve.base_xp * curve.multiplier.powi(exponent)).floor();
    // `as` saturates out-of-range floats, including +inf.
    raw as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
