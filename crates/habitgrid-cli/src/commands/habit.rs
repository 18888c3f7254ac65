use clap::Subcommand;

use super::{print_json, CommandResult, Workspace};

#[derive(Subcommand)]
pub enum HabitAction {
    /// List habits of the active challenge
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a habit of the active challenge
    Rename {
        /// Habit ID
        id: String,
        /// New name
        name: String,
    },
}

pub async fn run(action: HabitAction) -> CommandResult {
    let workspace = Workspace::open()?;
    let mut session = workspace.session().await?;

    match action {
        HabitAction::List { json } => {
            let habits = &session.active().habits;
            if json {
                return print_json(habits);
            }
            for habit in habits {
                println!("{:<14} {:<10} {}", habit.id, habit.kind.as_str(), habit.name);
            }
        }
        HabitAction::Rename { id, name } => match session.rename_habit(&id, &name) {
            Some(task) => {
                println!("Habit renamed: {id}");
                workspace.persist(vec![task]).await?;
            }
            None => println!("Nothing to rename"),
        },
    }
    Ok(())
}
