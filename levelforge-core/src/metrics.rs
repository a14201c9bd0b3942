//! Runtime counters for the progression engine.
//!
//! All hot-path counters are `AtomicU64` with relaxed ordering; they are
//! read only on export.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters incremented by the progression manager.
pub struct ProgressionCounters {
    /// XP awards applied (individual, quest or batch).
    pub xp_awards: AtomicU64,
    /// Sum of XP applied.
    pub xp_awarded: AtomicU64,
    /// Level-up events produced.
    pub level_ups: AtomicU64,
    /// Per-agent quest payouts.
    pub quest_payouts: AtomicU64,
    /// Notifications created.
    pub notifications_created: AtomicU64,
    /// Calls rejected for invalid input.
    pub rejected_inputs: AtomicU64,
    /// Event handlers that panicked.
    pub listener_failures: AtomicU64,
    /// Award hooks that returned an error.
    pub hook_failures: AtomicU64,
}

impl ProgressionCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            xp_awards: AtomicU64::new(0),
            xp_awarded: AtomicU64::new(0),
            level_ups: AtomicU64::new(0),
            quest_payouts: AtomicU64::new(0),
            notifications_created: AtomicU64::new(0),
            rejected_inputs: AtomicU64::new(0),
            listener_failures: AtomicU64::new(0),
            hook_failures: AtomicU64::new(0),
        }
    }

    /// Add `n` to `counter`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            xp_awards: self.xp_awards.load(Ordering::Relaxed),
            xp_awarded: self.xp_awarded.load(Ordering::Relaxed),
            level_ups: self.level_ups.load(Ordering::Relaxed),
            quest_payouts: self.quest_payouts.load(Ordering::Relaxed),
            notifications_created: self.notifications_created.load(Ordering::Relaxed),
            rejected_inputs: self.rejected_inputs.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
            hook_failures: self.hook_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for ProgressionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// XP awards applied.
    pub xp_awards: u64,
    /// Sum of XP applied.
    pub xp_awarded: u64,
    /// Level-up events.
    pub level_ups: u64,
    /// Quest payouts.
    pub quest_payouts: u64,
    /// Notifications created.
    pub notifications_created: u64,
    /// Rejected calls.
    pub rejected_inputs: u64,
    /// Panicked handlers.
    pub listener_failures: u64,
    /// Failed hooks.
    pub hook_failures: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows: [(&str, &str, u64); 8] = [
            ("levelforge_xp_awards_total", "XP awards applied", self.xp_awards),
            ("levelforge_xp_awarded_total", "Sum of XP applied", self.xp_awarded),
            ("levelforge_level_ups_total", "Level-up events produced", self.level_ups),
            ("levelforge_quest_payouts_total", "Per-agent quest payouts", self.quest_payouts),
            (
                "levelforge_notifications_created_total",
                "Notifications created",
                self.notifications_created,
            ),
            (
                "levelforge_rejected_inputs_total",
                "Calls rejected for invalid input",
                self.rejected_inputs,
            ),
            (
                "levelforge_listener_failures_total",
                "Event handlers that panicked",
                self.listener_failures,
            ),
            ("levelforge_hook_failures_total", "Award hooks that failed", self.hook_failures),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        out
    }
}
