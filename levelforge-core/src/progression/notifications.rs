//! User-facing notifications.
//!
//! Notifications outlive the award that created them: they stay in the
//! active set until the caller dismisses them, and dismissed ones stay in
//! memory until an explicit sweep. A dismissed notification is never
//! un-dismissed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::LevelUpEvent;
use crate::types::AgentId;

/// Unique identifier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    /// Create a new random notification ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Level gained.
    LevelUp,
    /// Skill unlocked.
    SkillUnlock,
    /// Plain XP award.
    XpGain,
}

/// Display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    /// Background toast.
    Low,
    /// Normal toast.
    Medium,
    /// Interrupting overlay.
    High,
}

/// A UI-facing record of a progression event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Identity.
    pub id: NotificationId,
    /// What it announces.
    pub kind: NotificationKind,
    /// Subject agent.
    pub agent_id: AgentId,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Icon name for the presentation layer.
    pub icon: String,
    /// Display priority.
    pub priority: NotificationPriority,
    /// When it was created.
    pub timestamp: DateTime<Utc>,
    /// Set once by the caller; never cleared.
    pub dismissed: bool,
}

impl Notification {
    fn build(
        kind: NotificationKind,
        agent_id: AgentId,
        title: String,
        message: String,
        icon: &str,
        priority: NotificationPriority,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            agent_id,
            title,
            message,
            icon: icon.to_string(),
            priority,
            timestamp,
            dismissed: false,
        }
    }

    /// "Level Up!" for a finished level-up.
    #[must_use]
    pub fn level_up(event: &LevelUpEvent, agent_name: &str) -> Self {
        let message = if event.levels_gained() > 1 {
            format!(
                "{agent_name} jumped from level {} to level {}!",
                event.old_level, event.new_level
            )
        } else {
            format!("{agent_name} reached level {}!", event.new_level)
        };
        Self::build(
            NotificationKind::LevelUp,
            event.agent_id,
            "Level Up!".to_string(),
            message,
            "trophy",
            NotificationPriority::High,
            event.timestamp,
        )
    }

    /// "New Skill Unlocked" for one skill.
    #[must_use]
    pub fn skill_unlock(
        agent_id: AgentId,
        agent_name: &str,
        skill: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::build(
            NotificationKind::SkillUnlock,
            agent_id,
            "New Skill Unlocked".to_string(),
            format!("{agent_name} learned {skill}"),
            "sparkles",
            NotificationPriority::Medium,
            timestamp,
        )
    }

    /// "+N XP" for an award that did not level up.
    #[must_use]
    pub fn xp_gain(
        agent_id: AgentId,
        agent_name: &str,
        amount: u64,
        source: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::build(
            NotificationKind::XpGain,
            agent_id,
            format!("+{amount} XP"),
            format!("{agent_name} earned {amount} XP from {source}"),
            "star",
            NotificationPriority::Low,
            timestamp,
        )
    }
}

/// The manager's notification set.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    items: Vec<Notification>,
}

impl NotificationCenter {
    /// Empty center.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notification.
    pub fn push(&mut self, notification: Notification) {
        self.items.push(notification);
    }

    /// Mark `id` dismissed. Returns `false` if the id is unknown.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.dismissed = true;
                true
            }
            None => false,
        }
    }

    /// Remove every dismissed notification; returns how many went.
    pub fn clear_dismissed(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.dismissed);
        before - self.items.len()
    }

    /// Remove dismissed notifications created before `cutoff`.
    pub fn clear_dismissed_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !(n.dismissed && n.timestamp < cutoff));
        before - self.items.len()
    }

    /// Non-dismissed notifications, oldest first.
    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(|n| !n.dismissed)
    }

    /// Everything still held, dismissed or not.
    #[must_use]
    pub fn all(&self) -> &[Notification] {
        &self.items
    }
}
