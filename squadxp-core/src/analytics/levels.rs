//! Level table shared by every XP consumer
//!
//! One cumulative threshold table covers levels 1 through [`MAX_LEVEL`].
//! Within each tier the per-level increment grows linearly, so thresholds
//! grow super-linearly:
//!
//! | Tier        | Levels  | Increment for level L     |
//! |-------------|---------|---------------------------|
//! | Novice      | 1-10    | `200 + (L-2) * 150`       |
//! | Adept       | 11-30   | `800 + (L-11) * 200`      |
//! | Expert      | 31-70   | `2000 + (L-31) * 300`     |
//! | Master      | 71-120  | `8000 + (L-71) * 500`     |
//! | Grandmaster | 121-200 | `15000 + (L-121) * 1000`  |
//! | Legend      | 201+    | `30000 + (L-201) * 2000`  |

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::LazyLock;

/// Highest reachable level.
pub const MAX_LEVEL: u32 = 300;

static THRESHOLDS: LazyLock<Vec<u64>> = LazyLock::new(build_thresholds);

fn level_increment(level: u64) -> u64 {
    match level {
        2..=10 => 200 + (level - 2) * 150,
        11..=30 => 800 + (level - 11) * 200,
        31..=70 => 2000 + (level - 31) * 300,
        71..=120 => 8000 + (level - 71) * 500,
        121..=200 => 15000 + (level - 121) * 1000,
        _ => 30000 + (level - 201) * 2000,
    }
}

fn build_thresholds() -> Vec<u64> {
    let mut thresholds = Vec::with_capacity(MAX_LEVEL as usize);
    thresholds.push(0);
    for level in 2..=MAX_LEVEL as u64 {
        let previous = thresholds.last().copied().unwrap_or(0);
        thresholds.push(previous + level_increment(level));
    }
    thresholds
}

/// Cumulative XP thresholds; index `i` is the XP at which level `i + 1` starts.
pub fn thresholds() -> &'static [u64] {
    &THRESHOLDS
}

/// Level reached with `xp` cumulative XP (1-based, capped at [`MAX_LEVEL`]).
pub fn level_for_xp(xp: u64) -> u32 {
    match thresholds().iter().position(|&t| t > xp) {
        Some(idx) => (idx as u32).max(1),
        None => thresholds().len() as u32,
    }
}

/// Cumulative XP at which `level` starts.
pub fn xp_for_level(level: u32) -> u64 {
    let table = thresholds();
    if level <= 1 {
        return 0;
    }
    let idx = (level as usize - 1).min(table.len() - 1);
    table[idx]
}

/// Cumulative XP needed for the level after `level`.
///
/// At the max level this is the last threshold.
pub fn next_level_xp(level: u32) -> u64 {
    xp_for_level(level.saturating_add(1))
}

/// Named bands of levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Tier {
    Novice,
    Adept,
    Expert,
    Master,
    Grandmaster,
    Legend,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Novice,
        Tier::Adept,
        Tier::Expert,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Legend,
    ];

    pub fn for_level(level: u32) -> Tier {
        match level {
            0..=10 => Tier::Novice,
            11..=30 => Tier::Adept,
            31..=70 => Tier::Expert,
            71..=120 => Tier::Master,
            121..=200 => Tier::Grandmaster,
            _ => Tier::Legend,
        }
    }

    /// First level of the tier
    pub fn min_level(self) -> u32 {
        match self {
            Tier::Novice => 1,
            Tier::Adept => 11,
            Tier::Expert => 31,
            Tier::Master => 71,
            Tier::Grandmaster => 121,
            Tier::Legend => 201,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Novice => "Novice",
            Tier::Adept => "Adept",
            Tier::Expert => "Expert",
            Tier::Master => "Master",
            Tier::Grandmaster => "Grandmaster",
            Tier::Legend => "Legend",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a cumulative XP value sits within its level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub tier: Tier,
    pub xp: u64,
    pub is_max_level: bool,
    /// Progress through the current level, rounded to one decimal
    pub progress_percent: f64,
    pub xp_to_next: u64,
    pub next_level_threshold: Option<u64>,
}

pub fn level_progress(xp: u64) -> LevelProgress {
    let level = level_for_xp(xp);
    let tier = Tier::for_level(level);

    if level >= MAX_LEVEL {
        return LevelProgress {
            level,
            tier,
            xp,
            is_max_level: true,
            progress_percent: 100.0,
            xp_to_next: 0,
            next_level_threshold: None,
        };
    }

    let current = xp_for_level(level);
    let next = xp_for_level(level + 1);
    let span = next - current;
    let percent = if span > 0 {
        (xp - current) as f64 / span as f64 * 100.0
    } else {
        100.0
    };

    LevelProgress {
        level,
        tier,
        xp,
        is_max_level: false,
        progress_percent: (percent * 10.0).round() / 10.0,
        xp_to_next: next - xp,
        next_level_threshold: Some(next),
    }
}

/// Projected arrival at one future level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelMilestone {
    pub level: u32,
    pub xp_needed: u64,
    /// Days at the given daily rate, rounded to one decimal; `None` when the rate is zero
    pub days_estimated: Option<f64>,
}

impl LevelMilestone {
    pub fn estimated_date(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days_estimated
            .map(|days| now + Duration::seconds((days * 86_400.0) as i64))
    }
}

/// Predicts the next `horizon` levels for a player earning `daily_xp` per day.
pub fn level_timeline(xp: u64, daily_xp: f64, horizon: u32) -> Vec<LevelMilestone> {
    let level = level_for_xp(xp);
    let last = level.saturating_add(horizon).min(MAX_LEVEL);

    ((level + 1)..=last)
        .map(|target| {
            let xp_needed = xp_for_level(target).saturating_sub(xp);
            let days_estimated = (daily_xp > 0.0)
                .then(|| ((xp_needed as f64 / daily_xp) * 10.0).round() / 10.0);
            LevelMilestone {
                level: target,
                xp_needed,
                days_estimated,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_values() {
        let t = thresholds();
        assert_eq!(t.len(), MAX_LEVEL as usize);
        assert_eq!(&t[..5], &[0, 200, 550, 1050, 1700]);
        assert_eq!(xp_for_level(10), 7200);
        assert_eq!(xp_for_level(11), 8000);
        assert_eq!(xp_for_level(12), 9000);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(199), 1);
        assert_eq!(level_for_xp(200), 2);
        assert_eq!(level_for_xp(549), 2);
        assert_eq!(level_for_xp(550), 3);
        assert_eq!(level_for_xp(8000), 11);
        assert_eq!(level_for_xp(u64::MAX), MAX_LEVEL);
    }

    #[test]
    fn test_level_and_threshold_lookups_agree() {
        for level in 1..=MAX_LEVEL {
            assert_eq!(level_for_xp(xp_for_level(level)), level);
            if level > 1 {
                assert_eq!(level_for_xp(xp_for_level(level) - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_level_monotonic() {
        let mut previous = level_for_xp(0);
        for xp in (0..2_000_000u64).step_by(997) {
            let level = level_for_xp(xp);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_increments_grow_within_tiers() {
        for level in 3..=MAX_LEVEL {
            if Tier::for_level(level) == Tier::for_level(level - 1) {
                assert!(level_increment(level as u64) > level_increment(level as u64 - 1));
            }
        }
    }

    #[test]
    fn test_next_level_xp() {
        assert_eq!(next_level_xp(1), 200);
        assert_eq!(next_level_xp(2), 550);
        assert_eq!(next_level_xp(MAX_LEVEL), xp_for_level(MAX_LEVEL));
    }

    #[test]
    fn test_tiers() {
        assert_eq!(Tier::for_level(1), Tier::Novice);
        assert_eq!(Tier::for_level(10), Tier::Novice);
        assert_eq!(Tier::for_level(11), Tier::Adept);
        assert_eq!(Tier::for_level(70), Tier::Expert);
        assert_eq!(Tier::for_level(71), Tier::Master);
        assert_eq!(Tier::for_level(200), Tier::Grandmaster);
        assert_eq!(Tier::for_level(201), Tier::Legend);
        for tier in Tier::ALL {
            assert_eq!(Tier::for_level(tier.min_level()), tier);
        }
    }

    #[test]
    fn test_level_progress() {
        let p = level_progress(375);
        assert_eq!(p.level, 2);
        assert_eq!(p.tier, Tier::Novice);
        assert_eq!(p.progress_percent, 50.0);
        assert_eq!(p.xp_to_next, 175);
        assert_eq!(p.next_level_threshold, Some(550));
        assert!(!p.is_max_level);

        let p = level_progress(u64::MAX / 2);
        assert!(p.is_max_level);
        assert_eq!(p.xp_to_next, 0);
        assert_eq!(p.next_level_threshold, None);
    }

    #[test]
    fn test_level_timeline() {
        let timeline = level_timeline(0, 100.0, 3);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].level, 2);
        assert_eq!(timeline[0].xp_needed, 200);
        assert_eq!(timeline[0].days_estimated, Some(2.0));
        assert_eq!(timeline[2].level, 4);
        assert_eq!(timeline[2].days_estimated, Some(10.5));

        let stalled = level_timeline(0, 0.0, 2);
        assert!(stalled.iter().all(|m| m.days_estimated.is_none()));

        assert!(level_timeline(u64::MAX / 2, 10.0, 5).is_empty());
    }
}
