//! levelforge Benchmark Suite
//!
//! Hot paths:
//!   level_from_total_xp_cold ........ binary search, caches disabled
//!   level_from_total_xp_warm ........ repeat lookup, cache hit
//!   quest_xp_reward_team_of_4 ....... full reward pipeline
//!   process_xp_gain_level_up ........ single award crossing a level
//!   batch_apply_xp_100_agents ....... one batch, one commit

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use levelforge_core::progression::XpAward;
use levelforge_core::{
    Agent, AgentClass, AgentId, CompletionContext, Difficulty, ProgressionManager, Quest,
    QuestCategory, XpCalculator,
};

fn make_agent(i: u32) -> Agent {
    let class = AgentClass::ALL[i as usize % AgentClass::ALL.len()];
    Agent::new(format!("Agent {i}"), class).with_progress(1 + i % 20, u64::from(i) * 7, 0)
}

fn make_team_quest(lead: AgentId) -> Quest {
    Quest::new("Refactor the scheduler", Difficulty::Hard, QuestCategory::Development, 400)
        .assigned_to([lead, AgentId::new(), AgentId::new(), AgentId::new()])
        .with_time_limit(std::time::Duration::from_secs(7200))
}

/// Benchmark: level lookup with and without the memo cache.
fn bench_level_lookup(c: &mut Criterion) {
    let cold = XpCalculator::default();
    cold.set_cache_enabled(false);
    c.bench_function("level_from_total_xp_cold", |b| {
        let mut total = 0u64;
        b.iter(|| {
            total = total.wrapping_add(7_919) % 50_000_000;
            black_box(cold.level_from_total_xp(black_box(total)));
        });
    });

    let warm = XpCalculator::default();
    let _ = warm.level_from_total_xp(1_234_567);
    c.bench_function("level_from_total_xp_warm", |b| {
        b.iter(|| black_box(warm.level_from_total_xp(black_box(1_234_567))));
    });
}

/// Benchmark: reward pipeline for a team quest.
fn bench_quest_reward(c: &mut Criterion) {
    let calc = XpCalculator::default();
    calc.set_cache_enabled(false);
    let agent = make_agent(1);
    let quest = make_team_quest(agent.id);
    let ctx = CompletionContext {
        completion_time: Some(std::time::Duration::from_secs(3000)),
        optional_objectives_completed: 0,
        team_performance_bonus: 1.1,
    };
    c.bench_function("quest_xp_reward_team_of_4", |b| {
        b.iter(|| black_box(calc.quest_xp_reward(&quest, &agent, &ctx)));
    });
}

/// Benchmark: one award that crosses a level boundary.
fn bench_single_award(c: &mut Criterion) {
    let manager = ProgressionManager::default();
    let agent = Agent::new("Bench", AgentClass::Coder).with_progress(4, 300, 337);
    c.bench_function("process_xp_gain_level_up", |b| {
        b.iter(|| black_box(manager.process_xp_gain(&agent, black_box(100), "bench")));
    });
}

/// Benchmark: batch award across 100 agents.
fn bench_batch(c: &mut Criterion) {
    let manager = ProgressionManager::default();
    let agents: Vec<Agent> = (0..100).map(make_agent).collect();
    c.bench_function("batch_apply_xp_100_agents", |b| {
        b.iter_batched(
            || {
                agents
                    .iter()
                    .map(|a| XpAward::new(a.clone(), 250, "bench"))
                    .collect::<Vec<_>>()
            },
            |awards| black_box(manager.batch_apply_xp(awards)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_level_lookup,
    bench_quest_reward,
    bench_single_award,
    bench_batch
);
criterion_main!(benches);
