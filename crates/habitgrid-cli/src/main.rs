use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "habitgrid", version, about = "Habitgrid CLI")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Challenge management
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Habits of the active challenge
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Tracker cells of the active challenge
    Cell {
        #[command(subcommand)]
        action: commands::cell::CellAction,
    },
    /// Dashboard statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Local profile sign-in
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Challenge { action } => commands::challenge::run(action).await,
        Commands::Habit { action } => commands::habit::run(action).await,
        Commands::Cell { action } => commands::cell::run(action).await,
        Commands::Stats { action } => commands::stats::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
