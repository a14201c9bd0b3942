//! Quest reward pipeline.
//!
//! ```text
//! XP = floor( base
//!           × difficulty
//!           × class/category bonus
//!           × time bonus
//!           × optional-objective bonus
//!           × team synergy
//!           × team performance
//!           × streak )
//! ```
//!
//! Stages are applied left to right in exactly this order so results are
//! reproducible bit-for-bit.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RewardConfig;
use crate::error::{ProgressionError, Result};
use crate::quest::{CompletionContext, Difficulty, Quest, QuestCategory};
use crate::types::{ActivityEntry, Agent, AgentClass};

/// Multiplier for an agent class working a quest category.
///
/// Each class has one primary category (×1.25) and one secondary (×1.1).
#[must_use]
pub fn class_category_bonus(class: AgentClass, category: QuestCategory) -> f64 {
    use AgentClass as C;
    use QuestCategory as Q;
    match (class, category) {
        (C::Researcher, Q::Research)
        | (C::Coder, Q::Development)
        | (C::Analyst, Q::Analysis)
        | (C::Optimizer, Q::Optimization)
        | (C::Coordinator, Q::Coordination)
        | (C::Tester, Q::Testing) => 1.25,
        (C::Researcher, Q::Analysis)
        | (C::Coder, Q::Testing)
        | (C::Analyst, Q::Research)
        | (C::Optimizer, Q::Development)
        | (C::Coordinator, Q::Documentation)
        | (C::Tester, Q::Development) => 1.1,
        _ => 1.0,
    }
}

/// Speed bonus from how much of the time limit was used.
#[must_use]
pub fn time_bonus(
    time_limit: Option<Duration>,
    completion_time: Option<Duration>,
    config: &RewardConfig,
) -> f64 {
    let (Some(limit), Some(taken)) = (time_limit, completion_time) else {
        return 1.0;
    };
    if limit.is_zero() {
        return 1.0;
    }
    let used = taken.as_secs_f64() / limit.as_secs_f64();
    if used < 0.5 {
        config.time_bonus_fast
    } else if used < 0.75 {
        config.time_bonus_quick
    } else if used < 1.0 {
        config.time_bonus_on_time
    } else {
        1.0
    }
}

/// `1 + bonus_xp × (completed / optional) / base_xp`.
///
/// Expressed as a multiplier on the base reward so it composes with the
/// other stages. `1.0` when there is no bonus, no optional objective, or a
/// zero base.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn optional_objectives_bonus(quest: &Quest, completed: u32) -> f64 {
    let optional = quest.optional_objective_count();
    let bonus = quest.reward.bonus_xp.unwrap_or(0);
    if optional == 0 || bonus == 0 || quest.reward.xp == 0 {
        return 1.0;
    }
    let ratio = f64::from(completed.min(optional)) / f64::from(optional);
    1.0 + (bonus as f64 * ratio) / quest.reward.xp as f64
}

/// `1 + per_agent × (team_size - 1)`, capped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn team_synergy(team_size: usize, config: &RewardConfig) -> f64 {
    let extra = team_size.saturating_sub(1) as f64;
    (1.0 + config.team_synergy_per_agent * extra).min(config.team_synergy_cap.max(1.0))
}

/// Number of XP-bearing entries in the streak window.
#[must_use]
pub fn streak_count(activity: &[ActivityEntry], config: &RewardConfig) -> usize {
    activity
        .iter()
        .take(config.streak_window)
        .filter(|e| e.xp_gained > 0)
        .count()
}

/// Stepped streak multiplier: the step with the highest threshold reached.
#[must_use]
pub fn streak_bonus(activity: &[ActivityEntry], config: &RewardConfig) -> f64 {
    let count = streak_count(activity, config);
    config
        .streak_steps
        .iter()
        .filter(|(min, _)| count >= *min)
        .max_by_key(|(min, _)| *min)
        .map_or(1.0, |(_, m)| *m)
}

/// Reject a context whose team-performance multiplier is unusable.
///
/// # Errors
/// `ProgressionError::InvalidMultiplier` for negative or non-finite values.
pub fn validate_context(context: &CompletionContext) -> Result<()> {
    let v = context.team_performance_bonus;
    if !v.is_finite() || v < 0.0 {
        return Err(ProgressionError::InvalidMultiplier {
            name: "team_performance_bonus",
            value: v,
        });
    }
    Ok(())
}

/// Every stage of one reward computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Quest base XP.
    pub base_xp: u64,
    /// Difficulty tier multiplier.
    pub difficulty: f64,
    /// Class/category bonus.
    pub class_bonus: f64,
    /// Speed bonus.
    pub time_bonus: f64,
    /// Optional-objective bonus.
    pub optional_bonus: f64,
    /// Team synergy.
    pub team_synergy: f64,
    /// Caller-supplied team performance.
    pub team_performance: f64,
    /// Recent-activity streak.
    pub streak: f64,
}

impl RewardBreakdown {
    /// Evaluate every stage.
    ///
    /// # Errors
    /// See [`validate_context`].
    pub fn compute(
        quest: &Quest,
        agent: &Agent,
        context: &CompletionContext,
        config: &RewardConfig,
    ) -> Result<Self> {
        validate_context(context)?;
        Ok(Self {
            base_xp: quest.reward.xp,
            difficulty: quest.difficulty.multiplier(),
            class_bonus: class_category_bonus(agent.class, quest.category),
            time_bonus: time_bonus(quest.time_limit, context.completion_time, config),
            optional_bonus: optional_objectives_bonus(quest, context.optional_objectives_completed),
            team_synergy: team_synergy(quest.team_size(), config),
            team_performance: context.team_performance_bonus,
            streak: streak_bonus(&agent.activity, config),
        })
    }

    /// Floored product of all stages, in pipeline order.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn total(&self) -> u64 {
        let xp = self.base_xp as f64
            * self.difficulty
            * self.class_bonus
            * self.time_bonus
            * self.optional_bonus
            * self.team_synergy
            * self.team_performance
            * self.streak;
        xp.floor() as u64
    }
}

/// Every input that can change a reward, hashed for the memo cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RewardKey {
    base_xp: u64,
    bonus_xp: Option<u64>,
    difficulty: Difficulty,
    category: QuestCategory,
    optional_total: u32,
    team_size: usize,
    time_limit: Option<Duration>,
    class: AgentClass,
    streak_count: usize,
    completion_time: Option<Duration>,
    optional_completed: u32,
    team_performance_bits: u64,
}

impl RewardKey {
    /// Build the key for one reward computation.
    #[must_use]
    pub fn new(
        quest: &Quest,
        agent: &Agent,
        context: &CompletionContext,
        config: &RewardConfig,
    ) -> Self {
        Self {
            base_xp: quest.reward.xp,
            bonus_xp: quest.reward.bonus_xp,
            difficulty: quest.difficulty,
            category: quest.category,
            optional_total: quest.optional_objective_count(),
            team_size: quest.team_size(),
            time_limit: quest.time_limit,
            class: agent.class,
            streak_count: streak_count(&agent.activity, config),
            completion_time: context.completion_time,
            optional_completed: context.optional_objectives_completed,
            team_performance_bits: context.team_performance_bonus.to_bits(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
