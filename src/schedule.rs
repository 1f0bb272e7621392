//! Per-mode reset schedules
//!
//! Deadly Assault and Shiyu Defense reset on a fixed cycle anchored at a
//! known reset date. The scheduler computes where "now" sits inside that
//! cycle for logging, and decides whether a mode should be fetched.
//!
//! Every mode is fetched on every run. Leaderboard entries only change on a
//! new personal best, so skipping a run saves nothing and can miss an
//! update. The cycle position is informational.

use crate::Mode;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;

/// Deadly Assault reset anchor (year, month, day)
const DEADLY_ASSAULT_ANCHOR: (i32, u32, u32) = (2025, 7, 31);
/// Shiyu Defense reset anchor (year, month, day)
const SHIYU_DEFENSE_ANCHOR: (i32, u32, u32) = (2025, 8, 1);
/// Cycle length shared by both scheduled modes
const RESET_INTERVAL_DAYS: u32 = 14;

/// Fixed reset cadence of one mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSchedule {
    /// A date on which a reset happened
    pub anchor_date: NaiveDate,
    /// Days between resets
    pub interval_days: u32,
    /// Human-readable label for logs
    pub label: &'static str,
}

impl ResetSchedule {
    /// Built-in schedule for a mode; Void Front has no fixed cycle
    pub fn for_mode(mode: Mode) -> Option<Self> {
        let ((year, month, day), label) = match mode {
            Mode::DeadlyAssault => (DEADLY_ASSAULT_ANCHOR, "Deadly Assault"),
            Mode::ShiyuDefense => (SHIYU_DEFENSE_ANCHOR, "Shiyu Defense"),
            Mode::VoidFront => return None,
        };

        Some(Self {
            anchor_date: NaiveDate::from_ymd_opt(year, month, day)?,
            interval_days: RESET_INTERVAL_DAYS,
            label,
        })
    }

    /// Whole days elapsed since the most recent reset (`0..interval_days`)
    ///
    /// Dates before the anchor wrap around into the previous cycle.
    pub fn days_since_reset(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = (now.date_naive() - self.anchor_date).num_days();
        elapsed.rem_euclid(i64::from(self.interval_days.max(1)))
    }

    /// Days until the next reset (`1..=interval_days`)
    pub fn days_until_reset(&self, now: DateTime<Utc>) -> i64 {
        i64::from(self.interval_days.max(1)) - self.days_since_reset(now)
    }

    /// Date of the next reset
    pub fn next_reset(&self, now: DateTime<Utc>) -> NaiveDate {
        now.date_naive() + Duration::days(self.days_until_reset(now))
    }
}

/// Policy deciding which modes are fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Fetch every mode on every run
    #[default]
    Always,
}

/// Decides, per mode, whether a fetch is due
#[derive(Debug, Clone, Default)]
pub struct FetchScheduler {
    policy: FetchPolicy,
}

impl FetchScheduler {
    /// Create a scheduler with the given policy
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    /// Active policy
    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Log the cycle position of a mode and decide whether to fetch it
    pub fn should_fetch(&self, mode: Mode, now: DateTime<Utc>) -> bool {
        match ResetSchedule::for_mode(mode) {
            Some(schedule) => info!(
                mode = %mode,
                days_since_reset = schedule.days_since_reset(now),
                days_until_reset = schedule.days_until_reset(now),
                next_reset = %schedule.next_reset(now),
                "Reset cycle position"
            ),
            None => info!(mode = %mode, "Mode has no fixed reset cycle"),
        }

        match self.policy {
            FetchPolicy::Always => true,
        }
    }
}
