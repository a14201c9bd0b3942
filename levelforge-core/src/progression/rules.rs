//! Static growth tables: milestone stat increases and skill unlocks.
//!
//! Every level in `(old_level, new_level]` is considered, so one large award
//! that jumps several levels grants exactly what the individual level-ups
//! would have.

use crate::config::MilestoneConfig;
use crate::types::{AgentClass, StatKind};

use super::events::StatIncrease;

/// Universal skills, unlocked by every class.
pub const UNIVERSAL_SKILLS: [(u32, &str); 4] = [
    (5, "Focused Work"),
    (10, "Mentorship"),
    (15, "Cross-Training"),
    (20, "Legendary Insight"),
];

/// Class skills as `(unlock_level, name)`.
#[must_use]
pub fn class_skills(class: AgentClass) -> [(u32, &'static str); 4] {
    match class {
        AgentClass::Researcher => [
            (3, "Deep Search"),
            (7, "Source Triangulation"),
            (12, "Literature Synthesis"),
            (18, "Research Mastery"),
        ],
        AgentClass::Coder => [
            (3, "Refactoring"),
            (7, "Test-Driven Development"),
            (12, "Performance Tuning"),
            (18, "Architecture Design"),
        ],
        AgentClass::Analyst => [
            (3, "Pattern Recognition"),
            (7, "Statistical Modeling"),
            (12, "Predictive Analysis"),
            (18, "Insight Mastery"),
        ],
        AgentClass::Optimizer => [
            (3, "Profiling"),
            (7, "Caching Strategies"),
            (12, "Parallelization"),
            (18, "Optimization Mastery"),
        ],
        AgentClass::Coordinator => [
            (3, "Task Delegation"),
            (7, "Conflict Resolution"),
            (12, "Resource Planning"),
            (18, "Swarm Leadership"),
        ],
        AgentClass::Tester => [
            (3, "Edge Case Hunting"),
            (7, "Fuzzing"),
            (12, "Regression Guarding"),
            (18, "Quality Mastery"),
        ],
    }
}

/// Milestone levels in `(old_level, new_level]`.
#[must_use]
pub fn milestones_crossed(old_level: u32, new_level: u32, interval: u32) -> Vec<u32> {
    if interval == 0 || new_level <= old_level {
        return Vec::new();
    }
    let first = (old_level / interval + 1).saturating_mul(interval);
    (first..=new_level).step_by(interval as usize).collect()
}

/// Stat increases for a jump from `old_level` to `new_level`.
///
/// Flat rule: each milestone crossed adds
/// `stat_increase_per_milestone` to all five stats. Returns one entry per
/// stat, or nothing when no milestone was crossed.
#[must_use]
pub fn stat_increases(old_level: u32, new_level: u32, config: &MilestoneConfig) -> Vec<StatIncrease> {
    let milestones = milestones_crossed(old_level, new_level, config.milestone_interval);
    if milestones.is_empty() || config.stat_increase_per_milestone == 0 {
        return Vec::new();
    }
    let count = u32::try_from(milestones.len()).unwrap_or(u32::MAX);
    let amount = count.saturating_mul(config.stat_increase_per_milestone);
    let levels = milestones
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let reason = if milestones.len() == 1 {
        format!("Milestone level {levels}")
    } else {
        format!("Milestone levels {levels}")
    };
    StatKind::ALL
        .iter()
        .map(|&stat| StatIncrease {
            stat,
            amount,
            reason: reason.clone(),
        })
        .collect()
}

/// Skills whose unlock level lies in `(old_level, new_level]`, ordered by
/// unlock level (class skills first on ties).
#[must_use]
pub fn skills_unlocked_between(
    class: AgentClass,
    old_level: u32,
    new_level: u32,
) -> Vec<(u32, &'static str)> {
    let mut unlocked: Vec<(u32, &'static str)> = class_skills(class)
        .into_iter()
        .chain(UNIVERSAL_SKILLS)
        .filter(|(level, _)| *level > old_level && *level <= new_level)
        .collect();
    unlocked.sort_by_key(|(level, _)| *level);
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestones_in_half_open_range() {
        assert_eq!(milestones_crossed(4, 5, 5), vec![5]);
        assert_eq!(milestones_crossed(5, 9, 5), Vec::<u32>::new());
        assert_eq!(milestones_crossed(3, 16, 5), vec![5, 10, 15]);
        assert_eq!(milestones_crossed(10, 10, 5), Vec::<u32>::new());
    }

    #[test]
    fn no_stat_increase_without_milestone() {
        let config = MilestoneConfig::default();
        assert!(stat_increases(5, 6, &config).is_empty());
    }

    #[test]
    fn stat_increases_accumulate_across_milestones() {
        let config = MilestoneConfig::default();
        let increases = stat_increases(4, 11, &config);
        assert_eq!(increases.len(), 5);
        assert!(increases.iter().all(|s| s.amount == 2));
        assert!(increases[0].reason.contains("5, 10"));
    }

    #[test]
    fn class_and_universal_skills_merge_in_level_order() {
        let skills = skills_unlocked_between(AgentClass::Coder, 1, 10);
        let names: Vec<&str> = skills.iter().map(|(_, n)| *n).collect();
        assert_eq!(
            names,
            vec!["Refactoring", "Focused Work", "Test-Driven Development", "Mentorship"]
        );
    }

    #[test]
    fn every_class_has_four_distinct_skills() {
        for class in AgentClass::ALL {
            let skills = class_skills(class);
            let levels: Vec<u32> = skills.iter().map(|(l, _)| *l).collect();
            assert_eq!(levels, vec![3, 7, 12, 18]);
        }
    }
}
