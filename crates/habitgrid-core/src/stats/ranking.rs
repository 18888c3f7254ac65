//! Per-habit scores and the "top habits" ranking.

use serde::{Deserialize, Serialize};

use crate::challenge::{Habit, HabitType};

/// Maximum characters of a habit name shown on the ranking chart.
pub const CHART_LABEL_LEN: usize = 10;

/// Accumulated score for one habit: 1.0 per high day, 0.5 per medium day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitScore {
    pub habit_id: String,
    pub name: String,
    pub kind: HabitType,
    /// Index of the habit in the challenge
    pub position: usize,
    pub score: f64,
}

impl HabitScore {
    pub(crate) fn new(position: usize, habit: &Habit) -> Self {
        Self {
            habit_id: habit.id.clone(),
            name: habit.name.clone(),
            kind: habit.kind,
            position,
            score: 0.0,
        }
    }

    /// Habit name cut to [`CHART_LABEL_LEN`] characters, with an ellipsis
    /// when shortened.
    pub fn chart_label(&self) -> String {
        if self.name.chars().count() > CHART_LABEL_LEN {
            let head: String = self.name.chars().take(CHART_LABEL_LEN).collect();
            format!("{head}...")
        } else {
            self.name.clone()
        }
    }
}

/// Top `n` habits by descending score. The sort is stable, so equal
/// scores keep their original habit order.
pub fn rank_habits(scores: &[HabitScore], n: usize) -> Vec<HabitScore> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(position: usize, name: &str, score: f64) -> HabitScore {
        HabitScore {
            habit_id: format!("h{position}"),
            name: name.to_string(),
            kind: HabitType::Mandatory,
            position,
            score,
        }
    }

    #[test]
    fn ranks_by_descending_score() {
        let scores = vec![score(0, "a", 1.0), score(1, "b", 3.5), score(2, "c", 2.0)];
        let top = rank_habits(&scores, 2);
        assert_eq!(
            top.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn ties_keep_habit_order() {
        let scores = vec![
            score(0, "a", 2.0),
            score(1, "b", 5.0),
            score(2, "c", 2.0),
            score(3, "d", 2.0),
        ];
        let top = rank_habits(&scores, 5);
        assert_eq!(
            top.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![1, 0, 2, 3]
        );
    }

    #[test]
    fn chart_label_truncates_long_names() {
        assert_eq!(score(0, "Meditation", 0.0).chart_label(), "Meditation");
        assert_eq!(score(0, "Meditation 20m", 0.0).chart_label(), "Meditation...");
    }
}
