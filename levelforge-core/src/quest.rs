//! Quest definitions consumed by the reward calculator.
//!
//! Quests are read-only here; the caller creates and stores them.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AgentId;

/// Unique identifier for a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestId(pub Uuid);

impl QuestId {
    /// Create a new random quest ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered difficulty tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// ×0.5
    Tutorial,
    /// ×1.0
    Easy,
    /// ×1.5
    Medium,
    /// ×2.0
    Hard,
    /// ×3.0
    Expert,
    /// ×5.0
    Legendary,
}

impl Difficulty {
    /// Reward multiplier for this tier.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Tutorial => 0.5,
            Self::Easy => 1.0,
            Self::Medium => 1.5,
            Self::Hard => 2.0,
            Self::Expert => 3.0,
            Self::Legendary => 5.0,
        }
    }
}

/// Quest category, matched against the agent class for bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCategory {
    /// Information gathering.
    Research,
    /// Building features.
    Development,
    /// Data interpretation.
    Analysis,
    /// Performance work.
    Optimization,
    /// Multi-agent orchestration.
    Coordination,
    /// Verification.
    Testing,
    /// Writing things down.
    Documentation,
}

/// A single quest objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// What needs doing.
    pub description: String,
    /// Optional objectives only feed the bonus reward.
    #[serde(default)]
    pub optional: bool,
}

impl Objective {
    /// A required objective.
    #[must_use]
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            optional: false,
        }
    }

    /// An optional objective.
    #[must_use]
    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            optional: true,
        }
    }
}

/// Base payout of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestReward {
    /// Base XP.
    pub xp: u64,
    /// Extra XP paid in proportion to optional objectives completed.
    #[serde(default)]
    pub bonus_xp: Option<u64>,
}

/// A task definition carrying a base reward and its modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    /// Identity.
    pub id: QuestId,
    /// Display title, used in activity and notification text.
    pub title: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Category tag.
    pub category: QuestCategory,
    /// Objectives, some possibly optional.
    #[serde(default)]
    pub objectives: Vec<Objective>,
    /// Base payout.
    pub reward: QuestReward,
    /// Agents that receive XP on completion.
    #[serde(default)]
    pub assigned_agents: Vec<AgentId>,
    /// Time limit used for the speed bonus.
    #[serde(default)]
    pub time_limit: Option<Duration>,
}

impl Quest {
    /// Create a quest with no objectives, assignments or time limit.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        difficulty: Difficulty,
        category: QuestCategory,
        base_xp: u64,
    ) -> Self {
        Self {
            id: QuestId::new(),
            title: title.into(),
            difficulty,
            category,
            objectives: Vec::new(),
            reward: QuestReward {
                xp: base_xp,
                bonus_xp: None,
            },
            assigned_agents: Vec::new(),
            time_limit: None,
        }
    }

    /// Builder: assign agents.
    #[must_use]
    pub fn assigned_to(mut self, agents: impl IntoIterator<Item = AgentId>) -> Self {
        self.assigned_agents = agents.into_iter().collect();
        self
    }

    /// Builder: set the time limit.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Builder: set objectives and the optional-objective bonus.
    #[must_use]
    pub fn with_objectives(mut self, objectives: Vec<Objective>, bonus_xp: Option<u64>) -> Self {
        self.objectives = objectives;
        self.reward.bonus_xp = bonus_xp;
        self
    }

    /// Number of optional objectives.
    #[must_use]
    pub fn optional_objective_count(&self) -> u32 {
        u32::try_from(self.objectives.iter().filter(|o| o.optional).count()).unwrap_or(u32::MAX)
    }

    /// Number of distinct assigned agents.
    #[must_use]
    pub fn team_size(&self) -> usize {
        let mut ids = self.assigned_agents.clone();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Whether `agent` is assigned to this quest.
    #[must_use]
    pub fn is_assigned(&self, agent: AgentId) -> bool {
        self.assigned_agents.contains(&agent)
    }
}

/// Caller-supplied facts about how a quest was completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionContext {
    /// Wall time taken to finish.
    #[serde(default)]
    pub completion_time: Option<Duration>,
    /// How many optional objectives were finished.
    #[serde(default)]
    pub optional_objectives_completed: u32,
    /// External team-performance multiplier.
    #[serde(default = "default_team_performance")]
    pub team_performance_bonus: f64,
}

impl Default for CompletionContext {
    fn default() -> Self {
        Self {
            completion_time: None,
            optional_objectives_completed: 0,
            team_performance_bonus: 1.0,
        }
    }
}

fn default_team_performance() -> f64 {
    1.0
}
