use clap::Subcommand;

use super::{print_json, CommandResult, Workspace};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Completion and streaks of the active challenge
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Highest-scoring habits
    Top {
        /// Number of habits (defaults to dashboard.top_habits)
        #[arg(long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-day compliance
    Daily {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: StatsAction) -> CommandResult {
    let workspace = Workspace::open()?;
    let session = workspace.session().await?;
    let stats = session.stats();

    match action {
        StatsAction::Summary { json } => {
            if json {
                return print_json(&stats);
            }
            println!("Challenge:      {}", session.active().name);
            println!(
                "Completion:     {}% ({}/{} cells)",
                stats.completion_percentage, stats.completed_cells, stats.total_cells
            );
            println!("Current streak: {}", stats.current_streak);
            println!("Best streak:    {}", stats.highest_streak);
        }
        StatsAction::Top { limit, json } => {
            let top = stats.top_habits(limit.unwrap_or(workspace.config.dashboard.top_habits));
            if json {
                return print_json(&top);
            }
            for score in &top {
                println!("{:<14} {:>6.1}", score.chart_label(), score.score);
            }
        }
        StatsAction::Daily { json } => {
            if json {
                return print_json(&stats.daily);
            }
            for day in &stats.daily {
                println!("day {:>3}  {:>3}%  {:?}", day.day, day.percentage, day.band());
            }
        }
    }
    Ok(())
}
