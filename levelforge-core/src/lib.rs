//! # levelforge Core Library
//!
//! Game-agnostic progression engine for agent characters.
//!
//! Two components:
//!
//! - **XP Calculator** ([`XpCalculator`]): pure math. Exponential level
//!   curve, inverse level lookup, and the quest reward pipeline
//!   (difficulty, class bonus, speed, optional objectives, team synergy,
//!   streaks). Memoised behind bounded caches.
//! - **Progression Manager** ([`ProgressionManager`]): applies awards to
//!   agent snapshots, detects level-ups (including multi-level jumps),
//!   grants milestone stats and skills, and keeps a bounded event history,
//!   a notification set and a level-up queue.
//!
//! Agents are values: the manager never mutates the caller's snapshot and
//! returns a fresh one with every result. Persistence is the caller's job.
//!
//! ## Performance Contract
//!
//! - Level lookup from total XP: binary search over a precomputed table.
//! - Quest reward: one cache probe on repeat arguments.
//! - Batch awards: one state lock for the whole batch.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod calculator;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod progression;
pub mod quest;
pub mod types;

pub use calculator::{LevelInfo, XpCalculator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ProgressionConfig;
pub use error::{ProgressionError, Result};
pub use progression::{
    ProgressionManager, QuestCompletionResult, XpAward, XpGainResult, award_xp, complete_quest,
};
pub use quest::{CompletionContext, Difficulty, Quest, QuestCategory};
pub use types::*;
