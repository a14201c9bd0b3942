//! Core type definitions for agents.
//!
//! An [`Agent`] is owned by the caller. The engine receives a snapshot and
//! returns a fresh one; it never mutates a caller-held value in place.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create a new random agent ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

/// Agent archetype. Drives the class/category reward bonus and which
/// class skills unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentClass {
    /// Finds and digests information.
    Researcher,
    /// Writes code.
    Coder,
    /// Interprets data.
    Analyst,
    /// Makes things faster.
    Optimizer,
    /// Organises other agents.
    Coordinator,
    /// Breaks things on purpose.
    Tester,
}

impl AgentClass {
    /// All classes, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Researcher,
        Self::Coder,
        Self::Analyst,
        Self::Optimizer,
        Self::Coordinator,
        Self::Tester,
    ];
}

impl fmt::Display for AgentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Researcher => write!(f, "Researcher"),
            Self::Coder => write!(f, "Coder"),
            Self::Analyst => write!(f, "Analyst"),
            Self::Optimizer => write!(f, "Optimizer"),
            Self::Coordinator => write!(f, "Coordinator"),
            Self::Tester => write!(f, "Tester"),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// One of the five agent stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// Problem-solving capacity.
    Intelligence,
    /// Work done per unit of effort.
    Efficiency,
    /// Novelty of solutions.
    Creativity,
    /// Ability to work with others.
    Collaboration,
    /// Consistency of results.
    Reliability,
}

impl StatKind {
    /// All stats, in display order.
    pub const ALL: [Self; 5] = [
        Self::Intelligence,
        Self::Efficiency,
        Self::Creativity,
        Self::Collaboration,
        Self::Reliability,
    ];
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intelligence => write!(f, "intelligence"),
            Self::Efficiency => write!(f, "efficiency"),
            Self::Creativity => write!(f, "creativity"),
            Self::Collaboration => write!(f, "collaboration"),
            Self::Reliability => write!(f, "reliability"),
        }
    }
}

/// The fixed set of five numeric stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Problem-solving capacity.
    pub intelligence: u32,
    /// Work done per unit of effort.
    pub efficiency: u32,
    /// Novelty of solutions.
    pub creativity: u32,
    /// Ability to work with others.
    pub collaboration: u32,
    /// Consistency of results.
    pub reliability: u32,
}

impl AgentStats {
    /// Read a stat by kind.
    #[must_use]
    pub fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Intelligence => self.intelligence,
            StatKind::Efficiency => self.efficiency,
            StatKind::Creativity => self.creativity,
            StatKind::Collaboration => self.collaboration,
            StatKind::Reliability => self.reliability,
        }
    }

    /// Add `amount` to a stat, saturating.
    pub fn add(&mut self, stat: StatKind, amount: u32) {
        let slot = match stat {
            StatKind::Intelligence => &mut self.intelligence,
            StatKind::Efficiency => &mut self.efficiency,
            StatKind::Creativity => &mut self.creativity,
            StatKind::Collaboration => &mut self.collaboration,
            StatKind::Reliability => &mut self.reliability,
        };
        *slot = slot.saturating_add(amount);
    }
}

impl Default for AgentStats {
    fn default() -> Self {
        Self {
            intelligence: 10,
            efficiency: 10,
            creativity: 10,
            collaboration: 10,
            reliability: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Activity & Skills
// ---------------------------------------------------------------------------

/// One entry of an agent's recent-activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Human-readable source ("Quest: Fix the parser", "Code review", ...).
    pub source: String,
    /// XP granted by this activity; zero for non-XP entries.
    pub xp_gained: u64,
    /// When the activity was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Unlock state of one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillState {
    /// Skill level (1 once unlocked).
    pub level: u32,
    /// Whether the skill is available.
    pub unlocked: bool,
    /// When the skill was unlocked.
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl SkillState {
    /// A freshly unlocked level-1 skill.
    #[must_use]
    pub fn unlocked_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            level: 1,
            unlocked: true,
            unlocked_at: Some(timestamp),
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A game character whose progression this crate tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Identity.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Archetype.
    pub class: AgentClass,
    /// Current level (>= 1).
    pub level: u32,
    /// XP earned within the current level.
    pub xp: u64,
    /// XP needed to reach the next level. Cached copy of the curve value.
    pub xp_to_next: u64,
    /// The five stats.
    pub stats: AgentStats,
    /// Recent activity, newest first, bounded.
    pub activity: Vec<ActivityEntry>,
    /// Skill name → unlock state.
    pub skills: BTreeMap<String, SkillState>,
}

impl Agent {
    /// Create a level-1 agent with default stats and no history.
    #[must_use]
    pub fn new(name: impl Into<String>, class: AgentClass) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            class,
            level: 1,
            xp: 0,
            xp_to_next: 100,
            stats: AgentStats::default(),
            activity: Vec::new(),
            skills: BTreeMap::new(),
        }
    }

    /// Builder: override the starting level and in-level XP.
    #[must_use]
    pub fn with_progress(mut self, level: u32, xp: u64, xp_to_next: u64) -> Self {
        self.level = level.max(1);
        self.xp = xp;
        self.xp_to_next = xp_to_next;
        self
    }

    /// Whether `skill` is unlocked.
    #[must_use]
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.get(skill).is_some_and(|s| s.unlocked)
    }

    /// Push an activity entry to the front and trim to `max_len`.
    pub fn record_activity(&mut self, entry: ActivityEntry, max_len: usize) {
        self.activity.insert(0, entry);
        self.activity.truncate(max_len);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
