//! Achievement catalog and unlock checks

use crate::analytics::levels;
use crate::types::{AgentInvocation, AgentXpCalculation};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn base_xp(self) -> u64 {
        match self {
            Rarity::Common => 50,
            Rarity::Rare => 100,
            Rarity::Epic => 200,
            Rarity::Legendary => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Usage,
    Performance,
    Mastery,
    Milestone,
    Special,
}

impl AchievementCategory {
    /// Reward multiplier, in tenths
    fn multiplier_tenths(self) -> u64 {
        match self {
            AchievementCategory::Usage => 10,
            AchievementCategory::Performance => 15,
            AchievementCategory::Mastery => 20,
            AchievementCategory::Milestone => 25,
            AchievementCategory::Special => 30,
        }
    }
}

/// What a player must reach to unlock an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Condition {
    TasksCompleted(u64),
    UniqueAgents(usize),
    StreakDays(u32),
    AgentLevel(u32),
    PlayerLevel(u32),
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub condition: Condition,
}

impl Achievement {
    /// XP awarded on unlock
    pub fn xp_reward(&self) -> u64 {
        achievement_xp(self.rarity, self.category)
    }
}

const fn achievement(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    rarity: Rarity,
    condition: Condition,
) -> Achievement {
    Achievement {
        id,
        name,
        description,
        category,
        rarity,
        condition,
    }
}

use AchievementCategory::{Mastery, Milestone, Special, Usage};

static CATALOG: [Achievement; 13] = [
    achievement(
        "first_steps",
        "First Steps",
        "Complete your first task with any agent",
        Milestone,
        Rarity::Common,
        Condition::TasksCompleted(1),
    ),
    achievement(
        "centurion",
        "Centurion",
        "Complete 100 tasks",
        Milestone,
        Rarity::Rare,
        Condition::TasksCompleted(100),
    ),
    achievement(
        "legend",
        "Legend",
        "Complete 1000 tasks",
        Milestone,
        Rarity::Legendary,
        Condition::TasksCompleted(1000),
    ),
    achievement(
        "agent_explorer",
        "Agent Explorer",
        "Use 5 different agents successfully",
        Usage,
        Rarity::Common,
        Condition::UniqueAgents(5),
    ),
    achievement(
        "agent_whisperer",
        "Agent Whisperer",
        "Successfully use 20 different agents",
        Mastery,
        Rarity::Epic,
        Condition::UniqueAgents(20),
    ),
    achievement(
        "week_warrior",
        "Week Warrior",
        "Maintain a 7-day activity streak",
        Special,
        Rarity::Rare,
        Condition::StreakDays(7),
    ),
    achievement(
        "month_master",
        "Month Master",
        "Maintain a 30-day activity streak",
        Special,
        Rarity::Epic,
        Condition::StreakDays(30),
    ),
    achievement(
        "elite_trainer",
        "Elite Trainer",
        "Reach level 5 with any agent",
        Mastery,
        Rarity::Epic,
        Condition::AgentLevel(5),
    ),
    achievement(
        "adept_tier",
        "Adept",
        "Reach level 11",
        Milestone,
        Rarity::Rare,
        Condition::PlayerLevel(11),
    ),
    achievement(
        "expert_tier",
        "Expert",
        "Reach level 31",
        Milestone,
        Rarity::Epic,
        Condition::PlayerLevel(31),
    ),
    achievement(
        "master_tier",
        "Master",
        "Reach level 71",
        Milestone,
        Rarity::Epic,
        Condition::PlayerLevel(71),
    ),
    achievement(
        "grandmaster_tier",
        "Grandmaster",
        "Reach level 121",
        Milestone,
        Rarity::Legendary,
        Condition::PlayerLevel(121),
    ),
    achievement(
        "legend_tier",
        "Legend",
        "Reach level 201",
        Milestone,
        Rarity::Legendary,
        Condition::PlayerLevel(201),
    ),
];

pub fn catalog() -> &'static [Achievement] {
    &CATALOG
}

/// XP reward for an achievement: rarity base times category multiplier.
pub fn achievement_xp(rarity: Rarity, category: AchievementCategory) -> u64 {
    rarity.base_xp() * category.multiplier_tenths() / 10
}

/// Player-wide numbers achievements are checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub total_xp: u64,
    /// Successful invocations
    pub total_tasks: u64,
    /// Agents with at least one successful invocation
    pub unique_agents: usize,
    /// Longest run of consecutive active days
    pub streak_days: u32,
    pub max_agent_level: u32,
    /// Ids of achievements already unlocked
    pub unlocked: BTreeSet<String>,
}

impl PlayerStats {
    pub fn from_analysis(
        invocations: &[AgentInvocation],
        agent_xp: &BTreeMap<String, AgentXpCalculation>,
    ) -> Self {
        let successful: Vec<&AgentInvocation> = invocations.iter().filter(|i| i.success).collect();
        let unique_agents: BTreeSet<&str> =
            successful.iter().map(|i| i.agent_name.as_str()).collect();
        let days: BTreeSet<NaiveDate> =
            invocations.iter().map(|i| i.timestamp.date_naive()).collect();

        Self {
            total_xp: agent_xp.values().map(|x| x.total_xp).sum(),
            total_tasks: successful.len() as u64,
            unique_agents: unique_agents.len(),
            streak_days: longest_streak(&days),
            max_agent_level: agent_xp.values().map(|x| x.level).max().unwrap_or(0),
            unlocked: BTreeSet::new(),
        }
    }

    pub fn level(&self) -> u32 {
        levels::level_for_xp(self.total_xp)
    }

    /// Current value and target for an achievement's condition.
    pub fn progress(&self, condition: Condition) -> (u64, u64) {
        match condition {
            Condition::TasksCompleted(n) => (self.total_tasks, n),
            Condition::UniqueAgents(n) => (self.unique_agents as u64, n as u64),
            Condition::StreakDays(n) => (self.streak_days as u64, n as u64),
            Condition::AgentLevel(n) => (self.max_agent_level as u64, n as u64),
            Condition::PlayerLevel(n) => (self.level() as u64, n as u64),
        }
    }

    pub fn meets(&self, condition: Condition) -> bool {
        let (current, target) = self.progress(condition);
        current >= target
    }
}

/// Achievements whose condition is met and which are not yet unlocked.
pub fn check_achievements(stats: &PlayerStats) -> Vec<&'static Achievement> {
    catalog()
        .iter()
        .filter(|a| !stats.unlocked.contains(a.id) && stats.meets(a.condition))
        .collect()
}

/// Longest run of consecutive calendar days in a sorted set.
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        current = match previous {
            Some(p) if p.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }

    longest
}
