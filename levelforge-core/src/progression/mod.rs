//! Progression Manager: applies XP to agents and announces the results.
//!
//! ```text
//!  Idle ──▶ Computing ──▶ LevelCheck ──┬──▶ (level up) stats ▶ skills ▶ LevelUp event ▶ notifications ─┐
//!                                      └─────────────────────────────────────────────────────────────┴──▶ XpGained event ──▶ Idle
//! ```
//!
//! Each award is computed from the caller's agent snapshot without touching
//! shared state, then committed to the manager's bounded collections under
//! one lock, then dispatched to subscribers with the lock released.
//!
//! The manager is `Send + Sync`; share it through an `Arc` for concurrent
//! awards on different agents. Awards on the *same* agent must be serialised
//! by the caller: the processing flag is a status signal, not a lock.

pub mod events;
pub mod hook;
pub mod listeners;
pub mod notifications;
pub mod rules;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::calculator::XpCalculator;
use crate::calculator::reward;
use crate::clock::{Clock, SystemClock};
use crate::config::ProgressionConfig;
use crate::error::{ProgressionError, Result};
use crate::metrics::{CounterSnapshot, ProgressionCounters};
use crate::quest::{CompletionContext, Quest};
use crate::types::{ActivityEntry, Agent, AgentId, SkillState};

pub use events::{EventKind, EventLog, LevelUpEvent, ProgressionEvent, StatIncrease};
pub use hook::{AwardHook, NoopHook};
pub use listeners::{EventHandler, ListenerRegistry, SubscriptionId};
pub use notifications::{
    Notification, NotificationCenter, NotificationId, NotificationKind, NotificationPriority,
};

// ---------------------------------------------------------------------------
// Inputs & results
// ---------------------------------------------------------------------------

/// One entry of a batch award.
#[derive(Debug, Clone)]
pub struct XpAward {
    /// Agent snapshot to update.
    pub agent: Agent,
    /// XP to apply; negative values are rejected.
    pub amount: i64,
    /// Source label.
    pub source: String,
}

impl XpAward {
    /// Convenience constructor.
    #[must_use]
    pub fn new(agent: Agent, amount: i64, source: impl Into<String>) -> Self {
        Self {
            agent,
            amount,
            source: source.into(),
        }
    }
}

/// Outcome of one XP award.
#[derive(Debug, Clone, PartialEq)]
pub struct XpGainResult {
    /// Fresh snapshot; the caller persists it.
    pub agent: Agent,
    /// Whether at least one level boundary was crossed.
    pub leveled_up: bool,
    /// Summary of the crossing, if any.
    pub level_up: Option<LevelUpEvent>,
    /// Notifications created by this award.
    pub notifications: Vec<Notification>,
}

/// Outcome of one quest completion across a team.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestCompletionResult {
    /// Every input agent, in input order; unassigned ones unchanged.
    pub agents: Vec<Agent>,
    /// Level-ups across the team, in input order.
    pub level_ups: Vec<LevelUpEvent>,
    /// Notifications across the team, in input order.
    pub notifications: Vec<Notification>,
    /// XP paid to each assigned agent that was present.
    pub rewards: Vec<(AgentId, u64)>,
}

/// Read-only view of the manager's state.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// Retained events, oldest first.
    pub events: Vec<ProgressionEvent>,
    /// Notifications not yet dismissed, oldest first.
    pub active_notifications: Vec<Notification>,
    /// Level-ups waiting for `next_level_up_event`, oldest first.
    pub pending_level_ups: Vec<LevelUpEvent>,
    /// Whether an award is in flight.
    pub is_processing: bool,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct ProgressionState {
    events: EventLog,
    notifications: NotificationCenter,
    pending_level_ups: VecDeque<LevelUpEvent>,
}

/// Everything one award produces before it is committed.
struct AwardOutcome {
    result: XpGainResult,
    events: Vec<ProgressionEvent>,
    xp: u64,
}

/// Keeps the processing flag raised until dropped.
struct ProcessingGuard<'a>(&'a AtomicUsize);

impl<'a> ProcessingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Stateful orchestrator for XP awards and quest completions.
pub struct ProgressionManager {
    config: ProgressionConfig,
    calculator: XpCalculator,
    clock: Arc<dyn Clock>,
    state: Mutex<ProgressionState>,
    listeners: RwLock<ListenerRegistry>,
    in_flight: AtomicUsize,
    counters: ProgressionCounters,
}

impl ProgressionManager {
    /// Create a manager that reads the system clock.
    ///
    /// # Errors
    /// Returns `ProgressionError::Config` if `config` fails validation.
    pub fn new(config: ProgressionConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager with an injected clock.
    ///
    /// # Errors
    /// Returns `ProgressionError::Config` if `config` fails validation.
    pub fn with_clock(config: ProgressionConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: ProgressionConfig, clock: Arc<dyn Clock>) -> Self {
        let state = ProgressionState {
            events: EventLog::new(config.limits.max_event_history),
            notifications: NotificationCenter::new(),
            pending_level_ups: VecDeque::new(),
        };
        Self {
            calculator: XpCalculator::new(&config),
            config,
            clock,
            state: Mutex::new(state),
            listeners: RwLock::new(ListenerRegistry::new()),
            in_flight: AtomicUsize::new(0),
            counters: ProgressionCounters::new(),
        }
    }

    /// The calculator this manager prices awards with.
    #[must_use]
    pub fn calculator(&self) -> &XpCalculator {
        &self.calculator
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Counter snapshot.
    #[must_use]
    pub fn metrics(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    // ------------------------------------------------------------------
    // Awards
    // ------------------------------------------------------------------

    /// Apply `amount` XP from `source` to `agent`.
    ///
    /// # Errors
    /// Returns `ProgressionError::InvalidXpAmount` for a negative amount;
    /// nothing is recorded in that case.
    pub fn process_xp_gain(&self, agent: &Agent, amount: i64, source: &str) -> Result<XpGainResult> {
        let xp = self.validate_amount(agent.id, amount)?;
        let _span = tracing::debug_span!("levelforge::xp_gain", agent = %agent.id).entered();
        let _guard = ProcessingGuard::enter(&self.in_flight);

        let outcome = self.compute_award(agent, xp, source, self.clock.now());
        let events = outcome.events.clone();
        self.commit(std::slice::from_ref(&outcome));
        self.emit(&events);
        Ok(outcome.result)
    }

    /// Like [`process_xp_gain`](Self::process_xp_gain), but awaits `hook`
    /// with the updated agent before anything is committed.
    ///
    /// # Errors
    /// `InvalidXpAmount` as above, or `HookFailed` if the hook errors. In the
    /// latter case no event, notification or queue entry is recorded.
    #[tracing::instrument(
        name = "levelforge::xp_gain",
        level = "debug",
        skip(self, agent, source, hook),
        fields(agent = %agent.id, hooked = true)
    )]
    pub async fn process_xp_gain_with_hook<H: AwardHook>(
        &self,
        agent: &Agent,
        amount: i64,
        source: &str,
        hook: &H,
    ) -> Result<XpGainResult> {
        let xp = self.validate_amount(agent.id, amount)?;
        let _guard = ProcessingGuard::enter(&self.in_flight);

        let outcome = self.compute_award(agent, xp, source, self.clock.now());
        if let Err(source) = hook.before_commit(&outcome.result.agent).await {
            ProgressionCounters::add(&self.counters.hook_failures, 1);
            warn!(agent = %agent.id, error = %source, "Award hook failed; award discarded");
            return Err(ProgressionError::HookFailed {
                agent: agent.id,
                source,
            });
        }

        let events = outcome.events.clone();
        self.commit(std::slice::from_ref(&outcome));
        self.emit(&events);
        Ok(outcome.result)
    }

    /// Pay every assigned agent in `agents` for completing `quest`.
    ///
    /// Agents not assigned to the quest pass through unchanged. Assigned
    /// agent ids missing from `agents` are skipped.
    ///
    /// # Errors
    /// Returns `ProgressionError::InvalidMultiplier` if the context's
    /// team-performance bonus is negative or not finite.
    pub fn process_quest_completion(
        &self,
        quest: &Quest,
        agents: &[Agent],
        context: Option<&CompletionContext>,
    ) -> Result<QuestCompletionResult> {
        let context = context.copied().unwrap_or_default();
        if let Err(e) = reward::validate_context(&context) {
            ProgressionCounters::add(&self.counters.rejected_inputs, 1);
            warn!(quest = %quest.id, error = %e, "Rejected quest completion");
            return Err(e);
        }
        let _span = tracing::debug_span!("levelforge::quest_completion", quest = %quest.id).entered();
        let _guard = ProcessingGuard::enter(&self.in_flight);

        let missing = quest
            .assigned_agents
            .iter()
            .filter(|id| !agents.iter().any(|a| a.id == **id))
            .count();
        if missing > 0 {
            debug!(quest = %quest.id, missing, "Assigned agents not supplied; skipping them");
        }

        let now = self.clock.now();
        let source = format!("Quest: {}", quest.title);
        let mut result = QuestCompletionResult {
            agents: Vec::with_capacity(agents.len()),
            level_ups: Vec::new(),
            notifications: Vec::new(),
            rewards: Vec::new(),
        };
        let mut outcomes = Vec::new();

        for agent in agents {
            if !quest.is_assigned(agent.id) {
                result.agents.push(agent.clone());
                continue;
            }
            let xp = self.calculator.quest_xp_reward(quest, agent, &context)?;
            let mut outcome = self.compute_award(agent, xp, &source, now);
            outcome.events.push(ProgressionEvent::QuestCompleted {
                agent_id: agent.id,
                quest_id: quest.id,
                quest_title: quest.title.clone(),
                xp_awarded: xp,
                timestamp: now,
            });

            result.agents.push(outcome.result.agent.clone());
            result.level_ups.extend(outcome.result.level_up.clone());
            result
                .notifications
                .extend(outcome.result.notifications.iter().cloned());
            result.rewards.push((agent.id, xp));
            outcomes.push(outcome);
        }

        ProgressionCounters::add(&self.counters.quest_payouts, outcomes.len() as u64);
        let events: Vec<ProgressionEvent> =
            outcomes.iter().flat_map(|o| o.events.iter().cloned()).collect();
        self.commit(&outcomes);
        self.emit(&events);

        info!(
            quest = %quest.id,
            paid = result.rewards.len(),
            level_ups = result.level_ups.len(),
            "Quest completed"
        );
        Ok(result)
    }

    /// Apply independent awards. Equivalent to calling
    /// [`process_xp_gain`](Self::process_xp_gain) once per award, in order.
    ///
    /// # Errors
    /// Every award is validated first; if any amount is negative the whole
    /// batch is rejected and nothing is applied.
    pub fn batch_apply_xp(&self, awards: Vec<XpAward>) -> Result<Vec<XpGainResult>> {
        let mut amounts = Vec::with_capacity(awards.len());
        for award in &awards {
            amounts.push(self.validate_amount(award.agent.id, award.amount)?);
        }
        let _span = tracing::debug_span!("levelforge::batch", size = awards.len()).entered();
        let _guard = ProcessingGuard::enter(&self.in_flight);

        let top = awards.iter().map(|a| a.agent.level).max().unwrap_or(1);
        self.calculator.warm_up(top.saturating_add(5));

        let now = self.clock.now();
        let outcomes: Vec<AwardOutcome> = awards
            .iter()
            .zip(amounts)
            .map(|(award, xp)| self.compute_award(&award.agent, xp, &award.source, now))
            .collect();

        let events: Vec<ProgressionEvent> =
            outcomes.iter().flat_map(|o| o.events.iter().cloned()).collect();
        self.commit(&outcomes);
        self.emit(&events);
        Ok(outcomes.into_iter().map(|o| o.result).collect())
    }

    fn validate_amount(&self, agent: AgentId, amount: i64) -> Result<u64> {
        u64::try_from(amount).map_err(|_| {
            ProgressionCounters::add(&self.counters.rejected_inputs, 1);
            warn!(agent = %agent, amount, "Rejected negative XP award");
            ProgressionError::InvalidXpAmount { amount }
        })
    }

    /// Pure part of an award: never touches shared state.
    fn compute_award(&self, agent: &Agent, xp: u64, source: &str, now: DateTime<Utc>) -> AwardOutcome {
        let mut updated = agent.clone();
        updated.level = updated.level.max(1);
        let old_level = updated.level;
        let total_xp = self.calculator.total_xp_of(&updated).saturating_add(xp);

        updated.record_activity(
            ActivityEntry {
                source: source.to_string(),
                xp_gained: xp,
                timestamp: now,
            },
            self.config.limits.max_activity_log,
        );

        let info = self.calculator.level_from_total_xp(total_xp);
        if info.level >= old_level {
            updated.level = info.level;
            updated.xp = info.current_level_xp;
            updated.xp_to_next = info.xp_to_next;
        } else {
            // Snapshot sits above the curve cap: bank the XP, never demote.
            updated.xp = updated.xp.saturating_add(xp);
            updated.xp_to_next = self.calculator.xp_required_for_level(old_level);
        }

        let mut events = Vec::new();
        let mut notifications = Vec::new();
        let mut level_up = None;

        if info.level > old_level {
            let stat_increases = rules::stat_increases(old_level, info.level, &self.config.milestones);
            for inc in &stat_increases {
                updated.stats.add(inc.stat, inc.amount);
            }

            let mut unlocked = Vec::new();
            for (unlock_level, skill) in rules::skills_unlocked_between(updated.class, old_level, info.level) {
                if updated.has_skill(skill) {
                    continue;
                }
                updated
                    .skills
                    .insert(skill.to_string(), SkillState::unlocked_at(now));
                unlocked.push((unlock_level, skill.to_string()));
            }

            let event = LevelUpEvent {
                agent_id: agent.id,
                old_level,
                new_level: info.level,
                xp_gained: xp,
                source: source.to_string(),
                unlocked_skills: unlocked.iter().map(|(_, s)| s.clone()).collect(),
                stat_increases,
                timestamp: now,
            };
            info!(
                agent = %agent.id,
                old_level,
                new_level = info.level,
                skills = unlocked.len(),
                source,
                "Agent leveled up"
            );

            notifications.push(Notification::level_up(&event, &updated.name));
            events.push(ProgressionEvent::LevelUp(event.clone()));
            for (unlock_level, skill) in unlocked {
                notifications.push(Notification::skill_unlock(agent.id, &updated.name, &skill, now));
                events.push(ProgressionEvent::SkillUnlocked {
                    agent_id: agent.id,
                    skill,
                    unlock_level,
                    timestamp: now,
                });
            }
            level_up = Some(event);
        } else if self.config.notifications.notify_xp_gains && xp > 0 {
            notifications.push(Notification::xp_gain(agent.id, &updated.name, xp, source, now));
        }

        events.push(ProgressionEvent::XpGained {
            agent_id: agent.id,
            amount: xp,
            source: source.to_string(),
            total_xp,
            timestamp: now,
        });
        debug!(agent = %agent.id, xp, total_xp, level = info.level, "Applied XP");

        AwardOutcome {
            result: XpGainResult {
                agent: updated,
                leveled_up: level_up.is_some(),
                level_up,
                notifications,
            },
            events,
            xp,
        }
    }

    /// Record outcomes in the shared collections under one lock.
    fn commit(&self, outcomes: &[AwardOutcome]) {
        let mut state = self.state.lock();
        for outcome in outcomes {
            for event in &outcome.events {
                state.events.push(event.clone());
            }
            if let Some(level_up) = &outcome.result.level_up {
                state.pending_level_ups.push_back(level_up.clone());
            }
            for n in &outcome.result.notifications {
                state.notifications.push(n.clone());
            }
        }
        drop(state);

        for outcome in outcomes {
            ProgressionCounters::add(&self.counters.xp_awards, 1);
            ProgressionCounters::add(&self.counters.xp_awarded, outcome.xp);
            ProgressionCounters::add(
                &self.counters.level_ups,
                u64::from(outcome.result.level_up.is_some()),
            );
            ProgressionCounters::add(
                &self.counters.notifications_created,
                outcome.result.notifications.len() as u64,
            );
        }
    }

    /// Deliver events to subscribers. Called with no lock held.
    fn emit(&self, events: &[ProgressionEvent]) {
        if self.listeners.read().is_empty() {
            return;
        }
        for event in events {
            let handlers = self.listeners.read().handlers_for(event.kind());
            let failures = listeners::dispatch(&handlers, event);
            ProgressionCounters::add(&self.counters.listener_failures, failures);
        }
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Call `handler` for every future event of `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ProgressionEvent) + Send + Sync + 'static,
    {
        self.listeners.write().subscribe(kind, Arc::new(handler))
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.listeners.write().unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // State accessors
    // ------------------------------------------------------------------

    /// Copy of the event history, active notifications and pending queue.
    #[must_use]
    pub fn state(&self) -> StateSnapshot {
        let state = self.state.lock();
        StateSnapshot {
            events: state.events.iter().cloned().collect(),
            active_notifications: state.notifications.active().cloned().collect(),
            pending_level_ups: state.pending_level_ups.iter().cloned().collect(),
            is_processing: self.is_processing(),
        }
    }

    /// Whether any award is in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Non-dismissed notifications, oldest first.
    #[must_use]
    pub fn active_notifications(&self) -> Vec<Notification> {
        self.state.lock().notifications.active().cloned().collect()
    }

    /// Every notification still held, dismissed or not.
    #[must_use]
    pub fn all_notifications(&self) -> Vec<Notification> {
        self.state.lock().notifications.all().to_vec()
    }

    /// Mark a notification dismissed. Unknown ids are ignored; returns
    /// whether the id was found.
    pub fn dismiss_notification(&self, id: NotificationId) -> bool {
        self.state.lock().notifications.dismiss(id)
    }

    /// Drop every dismissed notification; returns how many were removed.
    pub fn clear_dismissed_notifications(&self) -> usize {
        let removed = self.state.lock().notifications.clear_dismissed();
        debug!(removed, "Cleared dismissed notifications");
        removed
    }

    /// Drop dismissed notifications older than `max_age`.
    pub fn clear_dismissed_older_than(&self, max_age: chrono::Duration) -> usize {
        let cutoff = self.clock.now() - max_age;
        self.state.lock().notifications.clear_dismissed_before(cutoff)
    }

    /// [`clear_dismissed_older_than`](Self::clear_dismissed_older_than) with
    /// the configured retention.
    pub fn clear_expired_notifications(&self) -> usize {
        let hours = i64::from(self.config.notifications.dismissed_retention_hours);
        self.clear_dismissed_older_than(chrono::Duration::hours(hours))
    }

    /// Pop the oldest queued level-up, if any.
    pub fn next_level_up_event(&self) -> Option<LevelUpEvent> {
        self.state.lock().pending_level_ups.pop_front()
    }
}

impl Default for ProgressionManager {
    fn default() -> Self {
        Self::build(ProgressionConfig::default(), Arc::new(SystemClock))
    }
}

// ---------------------------------------------------------------------------
// Free-function helpers over an explicit manager
// ---------------------------------------------------------------------------

/// Shorthand for [`ProgressionManager::process_xp_gain`].
///
/// # Errors
/// See [`ProgressionManager::process_xp_gain`].
pub fn award_xp(
    manager: &ProgressionManager,
    agent: &Agent,
    amount: i64,
    source: &str,
) -> Result<XpGainResult> {
    manager.process_xp_gain(agent, amount, source)
}

/// Shorthand for [`ProgressionManager::process_quest_completion`] with the
/// default completion context.
///
/// # Errors
/// See [`ProgressionManager::process_quest_completion`].
pub fn complete_quest(
    manager: &ProgressionManager,
    quest: &Quest,
    agents: &[Agent],
) -> Result<QuestCompletionResult> {
    manager.process_quest_completion(quest, agents, None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use super::*;
    use crate::clock::ManualClock;
    use crate::quest::{Difficulty, QuestCategory};
    use crate::types::AgentClass;

    fn manager() -> (ProgressionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let manager = ProgressionManager::with_clock(ProgressionConfig::default(), clock.clone())
            .expect("default config is valid");
        (manager, clock)
    }

    fn level_five() -> Agent {
        Agent::new("Quill", AgentClass::Researcher).with_progress(5, 450, 550)
    }

    #[test]
    fn small_gain_stays_in_level() {
        let (m, _) = manager();
        let r = m.process_xp_gain(&level_five(), 50, "review").expect("valid");
        assert!(!r.leveled_up);
        assert!(r.level_up.is_none());
        assert_eq!(r.agent.level, 5);
        assert_eq!(r.agent.xp, 500);
        assert_eq!(r.agent.xp_to_next, 506);
        assert!(r.notifications.is_empty());
        assert_eq!(r.agent.activity.len(), 1);
        assert_eq!(r.agent.activity[0].xp_gained, 50);
    }

    #[test]
    fn large_gain_levels_up() {
        let (m, _) = manager();
        let r = m.process_xp_gain(&level_five(), 600, "refactor").expect("valid");
        assert!(r.leveled_up);
        let event = r.level_up.expect("level-up event");
        assert_eq!(event.old_level, 5);
        assert!(event.new_level > 5);
        assert_eq!(r.agent.level, event.new_level);
        // Level 5 was the starting level, not crossed.
        assert!(event.stat_increases.is_empty());
        assert_eq!(r.notifications[0].kind, NotificationKind::LevelUp);
    }

    #[test]
    fn caller_snapshot_is_not_modified() {
        let (m, _) = manager();
        let agent = level_five();
        let before = agent.clone();
        let _ = m.process_xp_gain(&agent, 10_000, "jackpot").expect("valid");
        assert_eq!(agent, before);
    }

    #[test]
    fn multi_level_jump_collects_every_crossing() {
        let (m, _) = manager();
        let agent = Agent::new("Cody", AgentClass::Coder);
        let target = m.calculator().total_xp_for_level(11);
        let r = m
            .process_xp_gain(&agent, i64::try_from(target).expect("fits"), "marathon")
            .expect("valid");
        let event = r.level_up.expect("level-up");
        assert_eq!(event.old_level, 1);
        assert_eq!(event.new_level, 11);
        assert_eq!(
            event.unlocked_skills,
            vec!["Refactoring", "Focused Work", "Test-Driven Development", "Mentorship"]
        );
        assert_eq!(event.stat_increases.len(), 5);
        assert!(event.stat_increases.iter().all(|s| s.amount == 2));
        assert_eq!(r.agent.stats.intelligence, 12);
        // One level-up notification plus one per skill.
        assert_eq!(r.notifications.len(), 5);
        assert_eq!(m.state().pending_level_ups.len(), 1);
    }

    #[test]
    fn already_unlocked_skill_is_not_reannounced() {
        let (m, clock) = manager();
        let mut agent = Agent::new("Cody", AgentClass::Coder);
        agent
            .skills
            .insert("Refactoring".into(), SkillState::unlocked_at(clock.now()));
        let r = m.process_xp_gain(&agent, 300, "work").expect("valid");
        assert_eq!(r.agent.level, 3);
        let event = r.level_up.expect("level-up");
        assert!(event.unlocked_skills.is_empty());
    }

    #[test]
    fn agent_above_curve_cap_is_never_demoted() {
        let (m, _) = manager();
        let agent = Agent::new("Elder", AgentClass::Researcher).with_progress(100, 10, 0);
        let r = m.process_xp_gain(&agent, 1, "chore").expect("valid");
        assert!(!r.leveled_up);
        assert!(r.level_up.is_none());
        assert_eq!(r.agent.level, 100);
        assert_eq!(r.agent.xp, 11);
        assert_eq!(r.agent.xp_to_next, m.calculator().xp_required_for_level(100));
        assert!(m.state().pending_level_ups.is_empty());
    }

    #[test]
    fn agent_at_curve_cap_does_not_level_past_it() {
        let (m, _) = manager();
        let cap = m.calculator().max_level();
        let agent = Agent::new("Apex", AgentClass::Coder).with_progress(cap, 0, 0);
        let r = m.process_xp_gain(&agent, 1, "chore").expect("valid");
        assert!(!r.leveled_up);
        assert_eq!(r.agent.level, cap);
        assert_eq!(r.agent.xp, 1);

        let r = m.process_xp_gain(&r.agent, i64::MAX, "flood").expect("valid");
        assert!(!r.leveled_up);
        assert_eq!(r.agent.level, cap);
    }

    #[test]
    fn negative_award_is_rejected_and_records_nothing() {
        let (m, _) = manager();
        let err = m.process_xp_gain(&level_five(), -5, "oops").unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidXpAmount { amount: -5 }));
        assert!(m.state().events.is_empty());
        assert!(!m.is_processing());
        assert_eq!(m.metrics().rejected_inputs, 1);
    }

    #[test]
    fn zero_award_still_records_activity_and_event() {
        let (m, _) = manager();
        let r = m.process_xp_gain(&level_five(), 0, "idle").expect("valid");
        assert_eq!(r.agent.activity.len(), 1);
        assert_eq!(m.state().events.len(), 1);
    }

    #[test]
    fn xp_gained_event_always_emitted_last() {
        let (m, _) = manager();
        let _ = m.process_xp_gain(&Agent::new("A", AgentClass::Tester), 300, "x").expect("valid");
        let kinds: Vec<EventKind> = m.state().events.iter().map(ProgressionEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::LevelUp, EventKind::SkillUnlocked, EventKind::XpGained]
        );
    }

    #[test]
    fn event_history_is_bounded() {
        let (m, _) = manager();
        let agent = Agent::new("Busy", AgentClass::Optimizer);
        for _ in 0..150 {
            let _ = m.process_xp_gain(&agent, 1, "tick").expect("valid");
        }
        assert_eq!(m.state().events.len(), 100);
    }

    #[test]
    fn level_up_queue_is_fifo() {
        let (m, _) = manager();
        let a = Agent::new("A", AgentClass::Coder);
        let b = Agent::new("B", AgentClass::Analyst);
        let _ = m.process_xp_gain(&a, 100, "first").expect("valid");
        let _ = m.process_xp_gain(&b, 100, "second").expect("valid");
        assert_eq!(m.next_level_up_event().map(|e| e.agent_id), Some(a.id));
        assert_eq!(m.next_level_up_event().map(|e| e.agent_id), Some(b.id));
        assert!(m.next_level_up_event().is_none());
    }

    #[test]
    fn dismiss_and_clear_notifications() {
        let (m, _) = manager();
        let r = m
            .process_xp_gain(&Agent::new("A", AgentClass::Coder), 300, "x")
            .expect("valid");
        assert_eq!(m.active_notifications().len(), 2);
        let id = r.notifications[0].id;

        assert!(m.dismiss_notification(id));
        assert!(!m.dismiss_notification(NotificationId::new()));
        assert_eq!(m.active_notifications().len(), 1);
        assert_eq!(m.all_notifications().len(), 2);
        assert!(m.all_notifications().iter().any(|n| n.id == id && n.dismissed));

        assert_eq!(m.clear_dismissed_notifications(), 1);
        assert_eq!(m.all_notifications().len(), 1);
        assert!(m.all_notifications().iter().all(|n| n.id != id));
    }

    #[test]
    fn expired_sweep_honours_retention() {
        let (m, clock) = manager();
        let r = m
            .process_xp_gain(&Agent::new("A", AgentClass::Coder), 100, "x")
            .expect("valid");
        let id = r.notifications[0].id;
        m.dismiss_notification(id);

        assert_eq!(m.clear_expired_notifications(), 0);
        clock.advance(chrono::Duration::hours(25));
        assert_eq!(m.clear_expired_notifications(), 1);
    }

    #[test]
    fn xp_gain_notifications_are_opt_in() {
        let mut config = ProgressionConfig::default();
        config.notifications.notify_xp_gains = true;
        let m = ProgressionManager::new(config).expect("valid config");
        let r = m.process_xp_gain(&level_five(), 10, "chat").expect("valid");
        assert_eq!(r.notifications.len(), 1);
        assert_eq!(r.notifications[0].kind, NotificationKind::XpGain);
        assert_eq!(r.notifications[0].priority, NotificationPriority::Low);
    }

    #[test]
    fn listeners_receive_events_and_panics_are_isolated() {
        let (m, _) = manager();
        let seen = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seen);
        m.on(EventKind::LevelUp, |_| panic!("listener bug"));
        let sub = m.on(EventKind::XpGained, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let r = m
            .process_xp_gain(&Agent::new("A", AgentClass::Coder), 100, "x")
            .expect("award survives a panicking listener");
        assert!(r.leveled_up);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(m.metrics().listener_failures, 1);
        assert_eq!(m.state().events.len(), 2);

        assert!(m.off(sub));
        let _ = m.process_xp_gain(&r.agent, 1, "y").expect("valid");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_can_read_state_without_deadlock() {
        let m = Arc::new(manager().0);
        let observed = Arc::new(AtomicU64::new(0));
        let (inner, obs) = (Arc::clone(&m), Arc::clone(&observed));
        m.on(EventKind::XpGained, move |_| {
            obs.store(inner.state().events.len() as u64, Ordering::SeqCst);
        });
        let _ = m.process_xp_gain(&level_five(), 5, "x").expect("valid");
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quest_pays_only_assigned_agents() {
        let (m, _) = manager();
        let assigned = Agent::new("In", AgentClass::Tester);
        let bystander = Agent::new("Out", AgentClass::Tester);
        let ghost = AgentId::new();
        let quest = Quest::new("Triage", Difficulty::Medium, QuestCategory::Documentation, 100)
            .assigned_to([assigned.id, ghost]);

        let r = m
            .process_quest_completion(&quest, &[bystander.clone(), assigned.clone()], None)
            .expect("valid");
        assert_eq!(r.agents.len(), 2);
        assert_eq!(r.agents[0], bystander);
        assert_eq!(r.rewards.len(), 1);
        assert_eq!(r.rewards[0].0, assigned.id);
        // Two assigned ids → synergy 1.1 even though one is absent.
        assert_eq!(r.rewards[0].1, 165);
        assert_eq!(r.agents[1].activity[0].source, "Quest: Triage");

        let kinds: Vec<EventKind> = m.state().events.iter().map(ProgressionEvent::kind).collect();
        assert_eq!(kinds.last(), Some(&EventKind::QuestCompleted));
    }

    #[test]
    fn invalid_context_rejects_whole_quest() {
        let (m, _) = manager();
        let agent = Agent::new("In", AgentClass::Tester);
        let quest = Quest::new("Q", Difficulty::Easy, QuestCategory::Testing, 10).assigned_to([agent.id]);
        let ctx = CompletionContext {
            team_performance_bonus: f64::INFINITY,
            ..CompletionContext::default()
        };
        assert!(m.process_quest_completion(&quest, &[agent], Some(&ctx)).is_err());
        assert!(m.state().events.is_empty());
        assert!(!m.is_processing());
    }

    #[test]
    fn batch_rejects_before_applying_anything() {
        let (m, _) = manager();
        let awards = vec![
            XpAward::new(level_five(), 10, "ok"),
            XpAward::new(level_five(), -1, "bad"),
        ];
        assert!(m.batch_apply_xp(awards).is_err());
        assert!(m.state().events.is_empty());
    }

    #[test]
    fn helpers_delegate_to_the_given_manager() {
        let (m, _) = manager();
        let agent = Agent::new("H", AgentClass::Coordinator);
        let r = award_xp(&m, &agent, 20, "helper").expect("valid");
        assert_eq!(r.agent.xp, 20);
        let quest = Quest::new("Plan", Difficulty::Easy, QuestCategory::Coordination, 40)
            .assigned_to([agent.id]);
        let q = complete_quest(&m, &quest, &[r.agent]).expect("valid");
        assert_eq!(q.rewards[0].1, 50);
        assert_eq!(m.metrics().xp_awards, 2);
    }

    #[test]
    fn processing_flag_is_clear_when_idle() {
        let (m, _) = manager();
        assert!(!m.is_processing());
        let _ = m.process_xp_gain(&level_five(), 1, "x").expect("valid");
        assert!(!m.is_processing());
        assert!(!m.state().is_processing);
    }
}
