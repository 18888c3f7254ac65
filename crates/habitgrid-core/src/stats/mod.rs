//! Statistics module for habitgrid
//!
//! Derives dashboard numbers from a challenge: overall completion,
//! mandatory-habit streaks, per-day compliance and per-habit ranking.
//! Everything here is a pure function of the [`Challenge`](crate::Challenge)
//! value it is given.

mod compliance;
mod ranking;

pub use compliance::{
    compute_stats, percentage, ChallengeStats, ComplianceBand, DayCompliance, Streak,
};

pub use ranking::{rank_habits, HabitScore, CHART_LABEL_LEN};
