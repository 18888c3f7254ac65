//! Standard habit template, default challenge and new-challenge drafts.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Challenge, Habit, HabitType, TrackerState};
use crate::error::ValidationError;

pub const DEFAULT_CHALLENGE_ID: &str = "default-1";
pub const DEFAULT_CHALLENGE_NAME: &str = "Monk Mode Base";
pub const DEFAULT_CHALLENGE_DESCRIPTION: &str = "Starter template";

const MANDATORY_HABITS: usize = 12;
const OPTIONAL_HABITS: usize = 8;

/// 12 mandatory habits followed by 8 optional ones, with stable ids
/// `mandatory-1..12` and `optional-1..8`.
pub fn habit_template() -> Vec<Habit> {
    let mandatory = (1..=MANDATORY_HABITS).map(|i| {
        Habit::new(
            format!("mandatory-{i}"),
            format!("Mandatory {i}"),
            HabitType::Mandatory,
        )
    });
    let optional = (1..=OPTIONAL_HABITS).map(|i| {
        Habit::new(
            format!("optional-{i}"),
            format!("Optional {i}"),
            HabitType::Optional,
        )
    });
    mandatory.chain(optional).collect()
}

/// Placeholder challenge running from `today` to one calendar month later.
///
/// Month arithmetic clamps to the last day of the target month
/// (Jan 31 -> Feb 29 in a leap year).
pub fn default_challenge(today: NaiveDate) -> Challenge {
    Challenge {
        id: DEFAULT_CHALLENGE_ID.to_string(),
        name: DEFAULT_CHALLENGE_NAME.to_string(),
        description: DEFAULT_CHALLENGE_DESCRIPTION.to_string(),
        start_date: today,
        end_date: today.checked_add_months(Months::new(1)).unwrap_or(today),
        habits: habit_template(),
        tracker_state: TrackerState::new(),
    }
}

/// User input from the "new challenge" form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ChallengeDraft {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check required fields and build a fresh challenge with a new id and
    /// its own copy of the habit template.
    ///
    /// # Errors
    /// Returns [`ValidationError::MissingField`] for an empty name or a
    /// missing date.
    pub fn into_challenge(self) -> Result<Challenge, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        let start_date = self
            .start_date
            .ok_or(ValidationError::MissingField("start_date"))?;
        let end_date = self
            .end_date
            .ok_or(ValidationError::MissingField("end_date"))?;

        Ok(Challenge {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: self.description.trim().to_string(),
            start_date,
            end_date,
            habits: habit_template(),
            tracker_state: TrackerState::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn template_has_twelve_mandatory_then_eight_optional() {
        let habits = habit_template();
        assert_eq!(habits.len(), 20);
        assert!(habits[..12].iter().all(Habit::is_mandatory));
        assert!(habits[12..].iter().all(|h| !h.is_mandatory()));
        assert_eq!(habits[0].id, "mandatory-1");
        assert_eq!(habits[11].id, "mandatory-12");
        assert_eq!(habits[12].id, "optional-1");
        assert_eq!(habits[19].id, "optional-8");
    }

    #[test]
    fn default_challenge_spans_one_month() {
        let c = default_challenge(date("2024-03-15"));
        assert_eq!(c.id, DEFAULT_CHALLENGE_ID);
        assert_eq!(c.end_date, date("2024-04-15"));
        assert!(c.tracker_state.is_empty());

        let c = default_challenge(date("2024-01-31"));
        assert_eq!(c.end_date, date("2024-02-29"));
    }

    #[test]
    fn draft_requires_name_and_dates() {
        let missing_name = ChallengeDraft::new("   ", date("2024-01-01"), date("2024-01-31"));
        assert_eq!(
            missing_name.into_challenge().unwrap_err(),
            ValidationError::MissingField("name")
        );

        let missing_end = ChallengeDraft {
            name: "Feb".into(),
            start_date: Some(date("2024-02-01")),
            ..Default::default()
        };
        assert_eq!(
            missing_end.into_challenge().unwrap_err(),
            ValidationError::MissingField("end_date")
        );
    }

    #[test]
    fn drafts_get_unique_ids_and_independent_habits() {
        let a = ChallengeDraft::new("A", date("2024-01-01"), date("2024-01-10"))
            .into_challenge()
            .unwrap();
        let mut b = ChallengeDraft::new("B", date("2024-01-01"), date("2024-01-10"))
            .with_description(" second ")
            .into_challenge()
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(b.description, "second");

        b.rename_habit("mandatory-1", "Cold shower");
        assert_eq!(a.habits[0].name, "Mandatory 1");
    }
}
