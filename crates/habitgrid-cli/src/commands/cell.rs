use chrono::NaiveDate;
use clap::{Args, Subcommand};
use habitgrid_core::challenge::CellState;
use habitgrid_core::error::ValidationError;

use super::{CommandResult, Workspace};

#[derive(Subcommand)]
pub enum CellAction {
    /// Advance a cell: none -> high -> medium -> low -> none
    Toggle {
        /// Habit ID
        habit: String,
        #[command(flatten)]
        when: DaySelector,
    },
    /// Print the grid of the active challenge
    Grid,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct DaySelector {
    /// 1-based day index
    #[arg(long)]
    day: Option<u32>,
    /// Calendar date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

pub async fn run(action: CellAction) -> CommandResult {
    let workspace = Workspace::open()?;
    let mut session = workspace.session().await?;

    match action {
        CellAction::Toggle { habit, when } => {
            let day = match (when.day, when.date) {
                (Some(day), _) => day,
                (None, Some(date)) => session.active().day_of_date(date).ok_or_else(|| {
                    ValidationError::InvalidValue {
                        field: "date".to_string(),
                        message: format!("{date} is outside the active challenge"),
                    }
                })?,
                (None, None) => return Err("either --day or --date is required".into()),
            };
            let (state, task) = session.toggle_cell(&habit, day)?;
            println!("{habit} day {day}: {}", state.label());
            workspace.persist(vec![task]).await?;
        }
        CellAction::Grid => {
            let challenge = session.active();
            for habit in &challenge.habits {
                let row: String = (1..=challenge.day_count())
                    .map(|day| symbol(challenge.cell(&habit.id, day)))
                    .collect();
                println!("{:<14} {row}", habit.id);
            }
        }
    }
    Ok(())
}

fn symbol(state: CellState) -> char {
    match state {
        CellState::None => '.',
        CellState::High => '#',
        CellState::Medium => '+',
        CellState::Low => '-',
    }
}
