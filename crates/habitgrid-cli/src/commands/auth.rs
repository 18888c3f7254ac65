use clap::Subcommand;
use habitgrid_core::storage::LocalStore;
use habitgrid_core::{Config, IdentityProvider, LocalIdentity};

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in as the configured local profile
    Login,
    /// Sign out
    Logout,
    /// Show the signed-in profile
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: AuthAction) -> CommandResult {
    let config = Config::load()?;
    let store = std::sync::Arc::new(LocalStore::open()?);
    let mut provider = LocalIdentity::new(store, config.identity());

    match action {
        AuthAction::Login => {
            let identity = provider.login()?;
            println!("Signed in as {}", identity.uid);
        }
        AuthAction::Logout => {
            provider.logout()?;
            println!("Signed out");
        }
        AuthAction::Whoami { json } => match provider.current_user() {
            Some(identity) if json => print_json(&identity)?,
            Some(identity) => {
                let name = identity.display_name.as_deref().unwrap_or("");
                println!("{} {name}", identity.uid);
            }
            None => println!("Not signed in"),
        },
    }
    Ok(())
}
