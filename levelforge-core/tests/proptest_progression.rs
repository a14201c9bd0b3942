//! Property-Based Tests for levelforge Core
//!
//! Uses `proptest` to check the curve, cache and manager invariants under
//! random inputs.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use levelforge_core::progression::XpAward;
use levelforge_core::{
    Agent, AgentClass, CompletionContext, Difficulty, ManualClock, ProgressionConfig,
    ProgressionManager, Quest, QuestCategory, XpCalculator,
};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_class() -> impl Strategy<Value = AgentClass> {
    prop::sample::select(AgentClass::ALL.to_vec())
}

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(vec![
        Difficulty::Tutorial,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
        Difficulty::Legendary,
    ])
}

fn arb_category() -> impl Strategy<Value = QuestCategory> {
    prop::sample::select(vec![
        QuestCategory::Research,
        QuestCategory::Development,
        QuestCategory::Analysis,
        QuestCategory::Optimization,
        QuestCategory::Coordination,
        QuestCategory::Testing,
        QuestCategory::Documentation,
    ])
}

fn arb_agent() -> impl Strategy<Value = Agent> {
    (arb_class(), 1u32..30, 0u64..500).prop_map(|(class, level, xp)| {
        Agent::new("Prop", class).with_progress(level, xp, 0)
    })
}

fn fixed_manager() -> ProgressionManager {
    let start = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid date");
    ProgressionManager::with_clock(
        ProgressionConfig::default(),
        Arc::new(ManualClock::new(start)),
    )
    .expect("default config is valid")
}

// ---------------------------------------------------------------------------
// Property: total_xp_for_level and level_from_total_xp are inverses
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn level_lookup_inverts_cumulative_xp(level in 1u32..=256) {
        let calc = XpCalculator::default();
        let expected = level.min(calc.max_level());
        let info = calc.level_from_total_xp(calc.total_xp_for_level(level));
        prop_assert_eq!(info.level, expected);
        prop_assert_eq!(info.xp_to_next, calc.xp_required_for_level(expected));
        if level <= calc.max_level() {
            prop_assert_eq!(info.current_level_xp, 0);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: level is monotonically non-decreasing in total XP
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn level_is_monotonic(a in any::<u64>(), b in any::<u64>()) {
        let calc = XpCalculator::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calc.level_from_total_xp(lo).level <= calc.level_from_total_xp(hi).level);
    }

    #[test]
    fn in_level_xp_stays_below_requirement(total in 0u64..10_000_000_000) {
        let calc = XpCalculator::default();
        let info = calc.level_from_total_xp(total);
        prop_assert!(info.current_level_xp < info.xp_to_next);
        prop_assert_eq!(calc.total_xp_for_level(info.level) + info.current_level_xp, total);
    }
}

// ---------------------------------------------------------------------------
// Property: caching never changes a result
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn lookups_are_idempotent(level in 0u32..400) {
        let calc = XpCalculator::default();
        let cold = calc.xp_required_for_level(level);
        let warm = calc.xp_required_for_level(level);
        prop_assert_eq!(cold, warm);
    }

    #[test]
    fn cache_is_transparent(
        levels in prop::collection::vec(1u32..300, 1..20),
        totals in prop::collection::vec(any::<u64>(), 1..20),
    ) {
        let cached = XpCalculator::default();
        let uncached = XpCalculator::default();
        uncached.set_cache_enabled(false);

        for &level in &levels {
            prop_assert_eq!(cached.xp_required_for_level(level), uncached.xp_required_for_level(level));
            prop_assert_eq!(cached.total_xp_for_level(level), uncached.total_xp_for_level(level));
        }
        let before: Vec<_> = totals.iter().map(|&t| cached.level_from_total_xp(t)).collect();
        cached.clear_cache();
        let after = cached.batch_level_from_total_xp(&totals);
        let reference = uncached.batch_level_from_total_xp(&totals);
        prop_assert_eq!(&before, &after);
        prop_assert_eq!(&after, &reference);
    }

    #[test]
    fn reward_cache_is_transparent(
        agent in arb_agent(),
        difficulty in arb_difficulty(),
        category in arb_category(),
        base in 0u64..5_000,
        team in 1usize..8,
    ) {
        let quest = Quest::new("Prop quest", difficulty, category, base)
            .assigned_to(std::iter::once(agent.id).chain((1..team).map(|_| levelforge_core::AgentId::new())));
        let ctx = CompletionContext::default();

        let cached = XpCalculator::default();
        let uncached = XpCalculator::default();
        uncached.set_cache_enabled(false);

        let first = cached.quest_xp_reward(&quest, &agent, &ctx).expect("valid");
        let second = cached.quest_xp_reward(&quest, &agent, &ctx).expect("valid");
        let reference = uncached.quest_xp_reward(&quest, &agent, &ctx).expect("valid");
        prop_assert_eq!(first, second);
        prop_assert_eq!(first, reference);
    }
}

// ---------------------------------------------------------------------------
// Property: batch application equals individual application
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn batch_matches_individual_awards(
        awards in prop::collection::vec((arb_agent(), 0i64..3_000), 1..12),
    ) {
        let individual = fixed_manager();
        let batched = fixed_manager();

        let expected: Vec<_> = awards
            .iter()
            .map(|(agent, amount)| individual.process_xp_gain(agent, *amount, "Prop").expect("valid"))
            .collect();
        let actual = batched
            .batch_apply_xp(
                awards
                    .iter()
                    .map(|(agent, amount)| XpAward::new(agent.clone(), *amount, "Prop"))
                    .collect(),
            )
            .expect("valid");

        prop_assert_eq!(expected.len(), actual.len());
        for (e, a) in expected.iter().zip(&actual) {
            prop_assert_eq!(&e.agent, &a.agent);
            prop_assert_eq!(e.leveled_up, a.leveled_up);
            prop_assert_eq!(&e.level_up, &a.level_up);
            prop_assert_eq!(e.notifications.len(), a.notifications.len());
            for (en, an) in e.notifications.iter().zip(&a.notifications) {
                prop_assert_eq!(en.kind, an.kind);
                prop_assert_eq!(&en.title, &an.title);
                prop_assert_eq!(&en.message, &an.message);
            }
        }
        prop_assert_eq!(individual.state().events, batched.state().events);
    }
}

// ---------------------------------------------------------------------------
// Property: bounded collections stay bounded
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn activity_log_never_exceeds_fifty(
        class in arb_class(),
        amounts in prop::collection::vec(0i64..400, 1..120),
    ) {
        let manager = fixed_manager();
        let mut agent = Agent::new("Grinder", class);
        for amount in amounts {
            agent = manager.process_xp_gain(&agent, amount, "Grind").expect("valid").agent;
            prop_assert!(agent.activity.len() <= 50);
        }
    }

    #[test]
    fn event_history_never_exceeds_hundred(
        amounts in prop::collection::vec(0i64..2_000, 1..150),
    ) {
        let manager = fixed_manager();
        let mut agent = Agent::new("Chatty", AgentClass::Coordinator);
        for amount in amounts {
            agent = manager.process_xp_gain(&agent, amount, "Talk").expect("valid").agent;
            prop_assert!(manager.state().events.len() <= 100);
        }
    }

    #[test]
    fn dismissed_notifications_leave_active_view(
        amounts in prop::collection::vec(100i64..2_000, 1..10),
    ) {
        let manager = fixed_manager();
        let mut agent = Agent::new("Toast", AgentClass::Tester);
        for amount in amounts {
            agent = manager.process_xp_gain(&agent, amount, "Work").expect("valid").agent;
        }
        let ids: Vec<_> = manager.active_notifications().iter().map(|n| n.id).collect();
        for id in &ids {
            prop_assert!(manager.dismiss_notification(*id));
        }
        prop_assert!(manager.all_notifications().iter().all(|n| n.dismissed));
        manager.clear_dismissed_notifications();
        prop_assert!(manager.active_notifications().is_empty());
        prop_assert!(manager.all_notifications().is_empty());
    }
}
