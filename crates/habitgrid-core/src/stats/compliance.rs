//! Completion and streak aggregation.
//!
//! One pass over days `1..=day_count` and, inside each day, over the
//! habits in order. Cells count as completed when they are
//! [`CellState::High`] or [`CellState::Medium`]. A day extends the streak
//! only when every mandatory habit is completed; optional habits never
//! break it.

use serde::{Deserialize, Serialize};

use super::ranking::{rank_habits, HabitScore};
use crate::challenge::{CellState, Challenge};

/// Running streak over consecutive qualifying days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Length of the run ending at the last recorded day
    pub current: u32,
    /// Longest run seen so far
    pub highest: u32,
}

impl Streak {
    /// Extend the run on a qualifying day, reset it otherwise.
    pub fn record(&mut self, qualifies: bool) {
        if qualifies {
            self.current += 1;
            self.highest = self.highest.max(self.current);
        } else {
            self.current = 0;
        }
    }
}

/// Color band used by the compliance chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceBand {
    /// 80% and above
    High,
    /// 50% to 79%
    Medium,
    /// Below 50%
    Low,
}

impl ComplianceBand {
    pub fn from_percentage(percent: u32) -> Self {
        if percent >= 80 {
            ComplianceBand::High
        } else if percent >= 50 {
            ComplianceBand::Medium
        } else {
            ComplianceBand::Low
        }
    }
}

/// Compliance for a single day of the challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCompliance {
    /// 1-based day index
    pub day: u32,
    /// Habits completed (high or medium) that day
    pub completed: u32,
    /// Completed habits as a rounded percentage of all habits
    pub percentage: u32,
    /// Whether every mandatory habit was completed
    pub qualifies: bool,
}

impl DayCompliance {
    pub fn band(&self) -> ComplianceBand {
        ComplianceBand::from_percentage(self.percentage)
    }
}

/// Dashboard statistics for one challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeStats {
    /// Inclusive day span, at least 1
    pub day_count: u32,
    /// habits x days
    pub total_cells: u64,
    /// Cells in high or medium state
    pub completed_cells: u64,
    /// Cells in high state
    pub high_cells: u64,
    /// Rounded completed / total, 0 when there are no cells
    pub completion_percentage: u32,
    /// Streak ending at the last day of the challenge
    pub current_streak: u32,
    /// Longest streak anywhere in the challenge
    pub highest_streak: u32,
    /// Score per habit, in habit order
    pub habit_scores: Vec<HabitScore>,
    /// Per-day breakdown, in day order
    pub daily: Vec<DayCompliance>,
}

impl ChallengeStats {
    pub fn compute(challenge: &Challenge) -> Self {
        compute_stats(challenge)
    }

    /// Highest-scoring habits, ties kept in habit order.
    pub fn top_habits(&self, n: usize) -> Vec<HabitScore> {
        rank_habits(&self.habit_scores, n)
    }

    pub fn remaining_cells(&self) -> u64 {
        self.total_cells - self.completed_cells
    }
}

/// Rounded `100 * part / whole`, or 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 * 100.0) / whole as f64).round() as u32
}

/// Aggregate the tracker map of `challenge` into [`ChallengeStats`].
pub fn compute_stats(challenge: &Challenge) -> ChallengeStats {
    let day_count = challenge.day_count();
    let habit_count = challenge.habits.len() as u64;

    let mut habit_scores: Vec<HabitScore> = challenge
        .habits
        .iter()
        .enumerate()
        .map(|(position, habit)| HabitScore::new(position, habit))
        .collect();

    let mut completed_cells = 0u64;
    let mut high_cells = 0u64;
    let mut streak = Streak::default();
    let mut daily = Vec::with_capacity(day_count as usize);

    for day in 1..=day_count {
        let mut completed_today = 0u32;
        let mut mandatory_done = true;

        for (habit, score) in challenge.habits.iter().zip(habit_scores.iter_mut()) {
            let state = challenge.cell(&habit.id, day);
            if state.is_completed() {
                completed_today += 1;
            }
            if state == CellState::High {
                high_cells += 1;
            }
            score.score += state.score();
            if habit.is_mandatory() && !state.is_completed() {
                mandatory_done = false;
            }
        }

        completed_cells += u64::from(completed_today);
        streak.record(mandatory_done);
        daily.push(DayCompliance {
            day,
            completed: completed_today,
            percentage: percentage(u64::from(completed_today), habit_count),
            qualifies: mandatory_done,
        });
    }

    let total_cells = habit_count * u64::from(day_count);

    ChallengeStats {
        day_count,
        total_cells,
        completed_cells,
        high_cells,
        completion_percentage: percentage(completed_cells, total_cells),
        current_streak: streak.current,
        highest_streak: streak.highest,
        habit_scores,
        daily,
    }
}
