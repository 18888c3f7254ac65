use chrono::NaiveDate;
use clap::Subcommand;
use habitgrid_core::challenge::{Challenge, ChallengeDraft};

use super::{print_json, CommandResult, Workspace};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// List all challenges
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one challenge (the active one by default)
    Show {
        /// Challenge ID
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a challenge and make it active
    Create {
        /// Challenge name
        name: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Optional description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Make a challenge active
    Select {
        /// Challenge ID
        id: String,
    },
    /// Delete a challenge
    Delete {
        /// Challenge ID
        id: String,
    },
}

pub async fn run(action: ChallengeAction) -> CommandResult {
    let workspace = Workspace::open()?;
    let mut session = workspace.session().await?;

    match action {
        ChallengeAction::List { json } => {
            if json {
                return print_json(&session.challenges());
            }
            for challenge in session.challenges() {
                let marker = if challenge.id == session.active_id() { "*" } else { " " };
                println!("{marker} {}", summary_line(challenge));
            }
        }
        ChallengeAction::Show { id, json } => {
            let challenge = match &id {
                Some(id) => session
                    .challenge(id)
                    .ok_or_else(|| format!("unknown challenge: {id}"))?,
                None => session.active(),
            };
            if json {
                return print_json(challenge);
            }
            println!("{}", summary_line(challenge));
            if !challenge.description.is_empty() {
                println!("  {}", challenge.description);
            }
            println!("  days:   {}", challenge.day_count());
            println!("  habits: {}", challenge.habits.len());
        }
        ChallengeAction::Create {
            name,
            start,
            end,
            description,
        } => {
            let draft = ChallengeDraft::new(name, start, end).with_description(description);
            let task = session.create_challenge(draft)?;
            println!("Challenge created: {}", session.active_id());
            workspace.persist(vec![task]).await?;
        }
        ChallengeAction::Select { id } => {
            session.select(&id)?;
            println!("Active challenge: {}", session.active().name);
        }
        ChallengeAction::Delete { id } => {
            let tasks = session.delete_challenge(&id)?;
            println!("Challenge deleted: {id}");
            println!("Active challenge: {}", session.active().name);
            workspace.persist(tasks).await?;
        }
    }
    Ok(())
}

fn summary_line(challenge: &Challenge) -> String {
    format!(
        "{}  {}  ({} .. {})",
        challenge.id, challenge.name, challenge.start_date, challenge.end_date
    )
}
