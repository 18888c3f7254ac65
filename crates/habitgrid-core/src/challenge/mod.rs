//! Challenge domain model.
//!
//! A [`Challenge`] is a dated campaign holding an ordered habit list and a
//! sparse tracker map from `"{habit_id}-{day}"` to [`CellState`]. Absent
//! keys mean [`CellState::None`]; the map never stores that value.

mod template;

pub use template::{
    default_challenge, habit_template, ChallengeDraft, DEFAULT_CHALLENGE_DESCRIPTION,
    DEFAULT_CHALLENGE_ID, DEFAULT_CHALLENGE_NAME,
};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse per-cell completion map keyed by [`cell_key`].
pub type TrackerState = BTreeMap<String, CellState>;

/// Completion level for one (habit, day) cell.
///
/// Serialized as the integer 0..=3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CellState {
    #[default]
    None = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl CellState {
    pub const ALL: [CellState; 4] = [
        CellState::None,
        CellState::High,
        CellState::Medium,
        CellState::Low,
    ];

    /// Next state in the toggle cycle. `Low` wraps to `None`.
    pub fn advance(self) -> Self {
        match self {
            CellState::None => CellState::High,
            CellState::High => CellState::Medium,
            CellState::Medium => CellState::Low,
            CellState::Low => CellState::None,
        }
    }

    /// High and medium count as done; low and none do not.
    pub fn is_completed(self) -> bool {
        matches!(self, CellState::High | CellState::Medium)
    }

    /// Ranking weight used for per-habit scores.
    pub fn score(self) -> f64 {
        match self {
            CellState::High => 1.0,
            CellState::Medium => 0.5,
            CellState::Low | CellState::None => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CellState::None => "none",
            CellState::High => "high",
            CellState::Medium => "medium",
            CellState::Low => "low",
        }
    }
}

impl From<CellState> for u8 {
    fn from(state: CellState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for CellState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CellState::None),
            1 => Ok(CellState::High),
            2 => Ok(CellState::Medium),
            3 => Ok(CellState::Low),
            other => Err(format!("invalid cell state {other}, expected 0..=3")),
        }
    }
}

/// Whether a habit gates the daily streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitType {
    #[serde(alias = "obligatorio")]
    Mandatory,
    #[serde(alias = "opcional")]
    Optional,
}

impl HabitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitType::Mandatory => "mandatory",
            HabitType::Optional => "optional",
        }
    }
}

/// A trackable daily action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: HabitType,
}

impl Habit {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: HabitType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.kind == HabitType::Mandatory
    }
}

/// Tracker key for a habit on a 1-based day.
pub fn cell_key(habit_id: &str, day: u32) -> String {
    format!("{habit_id}-{day}")
}

/// A named, dated habit-tracking campaign.
///
/// JSON shape uses camelCase field names and `YYYY-MM-DD` dates. Older
/// documents without `description`, `habits` or `trackerState` load with
/// defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "habit_template")]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub tracker_state: TrackerState,
}

impl Challenge {
    /// Inclusive number of days in the challenge, never less than 1.
    ///
    /// A reversed date range collapses to a single day.
    pub fn day_count(&self) -> u32 {
        let span = self.end_date.signed_duration_since(self.start_date).num_days() + 1;
        span.clamp(1, i64::from(u32::MAX)) as u32
    }

    pub fn habit(&self, habit_id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == habit_id)
    }

    /// State of a cell, `None` when the key is absent.
    pub fn cell(&self, habit_id: &str, day: u32) -> CellState {
        self.tracker_state
            .get(&cell_key(habit_id, day))
            .copied()
            .unwrap_or_default()
    }

    /// Write a cell, removing the key when the state is `None`.
    pub fn set_cell(&mut self, habit_id: &str, day: u32, state: CellState) {
        let key = cell_key(habit_id, day);
        if state == CellState::None {
            self.tracker_state.remove(&key);
        } else {
            self.tracker_state.insert(key, state);
        }
    }

    /// Advance a cell one step in the toggle cycle and return the new state.
    pub fn advance_cell(&mut self, habit_id: &str, day: u32) -> CellState {
        let next = self.cell(habit_id, day).advance();
        self.set_cell(habit_id, day, next);
        next
    }

    /// Rename a habit in place. Returns false if the habit is unknown or
    /// already carries that name.
    pub fn rename_habit(&mut self, habit_id: &str, name: &str) -> bool {
        match self.habits.iter_mut().find(|h| h.id == habit_id) {
            Some(habit) if habit.name != name => {
                habit.name = name.to_string();
                true
            }
            _ => false,
        }
    }

    /// Calendar date of a 1-based day index.
    pub fn date_of_day(&self, day: u32) -> Option<NaiveDate> {
        if day == 0 || day > self.day_count() {
            return None;
        }
        self.start_date
            .checked_add_signed(Duration::days(i64::from(day) - 1))
    }

    /// 1-based day index of a calendar date, if it falls inside the span.
    pub fn day_of_date(&self, date: NaiveDate) -> Option<u32> {
        let offset = date.signed_duration_since(self.start_date).num_days();
        let day = u32::try_from(offset + 1).ok()?;
        (day >= 1 && day <= self.day_count()).then_some(day)
    }

    /// Drop explicit `None` entries. Returns how many were removed.
    pub(crate) fn normalize(&mut self) -> usize {
        let before = self.tracker_state.len();
        self.tracker_state.retain(|_, state| *state != CellState::None);
        before - self.tracker_state.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> Challenge {
        Challenge {
            id: "c1".into(),
            name: "January".into(),
            description: String::new(),
            start_date: date("2024-01-01"),
            end_date: date("2024-01-31"),
            habits: vec![
                Habit::new("h1", "Run", HabitType::Mandatory),
                Habit::new("h2", "Read", HabitType::Optional),
            ],
            tracker_state: TrackerState::new(),
        }
    }

    #[test]
    fn advance_cycles_through_all_states() {
        assert_eq!(CellState::None.advance(), CellState::High);
        assert_eq!(CellState::High.advance(), CellState::Medium);
        assert_eq!(CellState::Medium.advance(), CellState::Low);
        assert_eq!(CellState::Low.advance(), CellState::None);
    }

    #[test]
    fn cell_state_rejects_out_of_range_integers() {
        assert!(serde_json::from_str::<CellState>("4").is_err());
        assert_eq!(serde_json::from_str::<CellState>("2").unwrap(), CellState::Medium);
        assert_eq!(serde_json::to_string(&CellState::Low).unwrap(), "3");
    }

    #[test]
    fn day_count_is_inclusive_and_clamped() {
        let mut c = sample();
        assert_eq!(c.day_count(), 31);
        c.end_date = c.start_date;
        assert_eq!(c.day_count(), 1);
        c.end_date = date("2023-12-01");
        assert_eq!(c.day_count(), 1);
    }

    #[test]
    fn toggling_back_to_none_removes_the_key() {
        let mut c = sample();
        for _ in 0..3 {
            c.advance_cell("h1", 5);
        }
        assert_eq!(c.cell("h1", 5), CellState::Low);
        assert_eq!(c.tracker_state.len(), 1);
        assert_eq!(c.advance_cell("h1", 5), CellState::None);
        assert!(c.tracker_state.is_empty());
    }

    #[test]
    fn rename_reports_whether_anything_changed() {
        let mut c = sample();
        assert!(c.rename_habit("h1", "Run 5k"));
        assert!(!c.rename_habit("h1", "Run 5k"));
        assert!(!c.rename_habit("missing", "x"));
        assert_eq!(c.habit("h1").unwrap().name, "Run 5k");
    }

    #[test]
    fn day_and_date_conversions_agree() {
        let c = sample();
        assert_eq!(c.date_of_day(1), Some(date("2024-01-01")));
        assert_eq!(c.date_of_day(31), Some(date("2024-01-31")));
        assert_eq!(c.date_of_day(32), None);
        assert_eq!(c.date_of_day(0), None);
        assert_eq!(c.day_of_date(date("2024-01-15")), Some(15));
        assert_eq!(c.day_of_date(date("2023-12-31")), None);
        assert_eq!(c.day_of_date(date("2024-02-01")), None);
    }

    #[test]
    fn json_shape_uses_camel_case_and_integer_states() {
        let mut c = sample();
        c.set_cell("h1", 1, CellState::High);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["startDate"], "2024-01-01");
        assert_eq!(json["endDate"], "2024-01-31");
        assert_eq!(json["trackerState"]["h1-1"], 1);
        assert_eq!(json["habits"][0]["type"], "mandatory");
    }

    #[test]
    fn older_documents_load_with_defaults() {
        let json = r#"{
            "id": "old",
            "name": "Legacy",
            "startDate": "2024-03-01",
            "endDate": "2024-03-10",
            "habits": [{"id": "ob-1", "name": "Obligatorio 1", "type": "obligatorio"},
                       {"id": "op-1", "name": "Opcional 1", "type": "opcional"}]
        }"#;
        let c: Challenge = serde_json::from_str(json).unwrap();
        assert_eq!(c.description, "");
        assert!(c.tracker_state.is_empty());
        assert_eq!(c.habits[0].kind, HabitType::Mandatory);
        assert_eq!(c.habits[1].kind, HabitType::Optional);

        let bare = r#"{"id": "x", "name": "x", "startDate": "2024-03-01", "endDate": "2024-03-02"}"#;
        let c: Challenge = serde_json::from_str(bare).unwrap();
        assert_eq!(c.habits, habit_template());
    }

    #[test]
    fn normalize_drops_explicit_none_cells() {
        let mut c = sample();
        c.tracker_state.insert("h1-1".into(), CellState::None);
        c.tracker_state.insert("h1-2".into(), CellState::High);
        assert_eq!(c.normalize(), 1);
        assert_eq!(c.tracker_state.len(), 1);
    }
}
