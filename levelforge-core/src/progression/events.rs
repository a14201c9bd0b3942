//! Progression events and the bounded event history.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quest::QuestId;
use crate::types::{AgentId, StatKind};

/// Discriminant of [`ProgressionEvent`], used for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An agent received XP.
    XpGained,
    /// An agent gained one or more levels.
    LevelUp,
    /// An assigned agent was paid for a quest.
    QuestCompleted,
    /// A skill became available.
    SkillUnlocked,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XpGained => write!(f, "xp_gained"),
            Self::LevelUp => write!(f, "level_up"),
            Self::QuestCompleted => write!(f, "quest_completed"),
            Self::SkillUnlocked => write!(f, "skill_unlocked"),
        }
    }
}

/// One stat bump granted by a level-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatIncrease {
    /// Which stat.
    pub stat: StatKind,
    /// Points added.
    pub amount: u32,
    /// Why, e.g. "Milestone levels 5, 10".
    pub reason: String,
}

/// Summary of one award that crossed at least one level boundary.
///
/// `new_level - old_level` can exceed 1; stat increases and unlocked skills
/// cover every level crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpEvent {
    /// Who leveled.
    pub agent_id: AgentId,
    /// Level before the award.
    pub old_level: u32,
    /// Level after the award.
    pub new_level: u32,
    /// XP in the triggering award.
    pub xp_gained: u64,
    /// Human-readable source of the award.
    pub source: String,
    /// Skills unlocked, lowest unlock level first.
    pub unlocked_skills: Vec<String>,
    /// Stat increases, one entry per stat.
    pub stat_increases: Vec<StatIncrease>,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

impl LevelUpEvent {
    /// Number of levels gained.
    #[must_use]
    pub fn levels_gained(&self) -> u32 {
        self.new_level.saturating_sub(self.old_level)
    }
}

/// Everything the manager can announce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressionEvent {
    /// XP was applied to an agent.
    XpGained {
        /// Recipient.
        agent_id: AgentId,
        /// XP applied.
        amount: u64,
        /// Source label.
        source: String,
        /// Agent's total XP after the award.
        total_xp: u64,
        /// When.
        timestamp: DateTime<Utc>,
    },
    /// Level boundary crossed.
    LevelUp(LevelUpEvent),
    /// Quest paid out to one agent.
    QuestCompleted {
        /// Recipient.
        agent_id: AgentId,
        /// Quest.
        quest_id: QuestId,
        /// Quest title.
        quest_title: String,
        /// XP paid.
        xp_awarded: u64,
        /// When.
        timestamp: DateTime<Utc>,
    },
    /// Skill unlocked.
    SkillUnlocked {
        /// Recipient.
        agent_id: AgentId,
        /// Skill name.
        skill: String,
        /// Level at which it unlocks.
        unlock_level: u32,
        /// When.
        timestamp: DateTime<Utc>,
    },
}

impl ProgressionEvent {
    /// Discriminant.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::XpGained { .. } => EventKind::XpGained,
            Self::LevelUp(_) => EventKind::LevelUp,
            Self::QuestCompleted { .. } => EventKind::QuestCompleted,
            Self::SkillUnlocked { .. } => EventKind::SkillUnlocked,
        }
    }

    /// Subject agent.
    #[must_use]
    pub fn agent_id(&self) -> AgentId {
        match self {
            Self::XpGained { agent_id, .. }
            | Self::QuestCompleted { agent_id, .. }
            | Self::SkillUnlocked { agent_id, .. } => *agent_id,
            Self::LevelUp(e) => e.agent_id,
        }
    }

    /// When the event was produced.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::XpGained { timestamp, .. }
            | Self::QuestCompleted { timestamp, .. }
            | Self::SkillUnlocked { timestamp, .. } => *timestamp,
            Self::LevelUp(e) => e.timestamp,
        }
    }
}

/// Append-only history that keeps the newest `capacity` events.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<ProgressionEvent>,
    capacity: usize,
}

impl EventLog {
    /// Empty log holding at most `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest event when full.
    pub fn push(&mut self, event: ProgressionEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Oldest-first iterator.
    pub fn iter(&self) -> impl Iterator<Item = &ProgressionEvent> {
        self.events.iter()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
