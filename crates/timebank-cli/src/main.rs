use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "timebank", version, about = "Timebank CLI")]
struct Cli {
    /// Print events as JSON instead of the formatted display
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add time to the balance
    Add(commands::balance::AmountArgs),
    /// Subtract time from the balance
    Sub(commands::balance::AmountArgs),
    /// Reverse the most recent change
    Undo,
    /// Show the balance
    Status,
    /// Show the history, newest first
    History,
    /// Countdown control
    Countdown {
        #[command(subcommand)]
        action: commands::countdown::CountdownAction,
    },
    /// Erase the balance, history and countdown
    Clear,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let result = match cli.command {
        Commands::Add(args) => commands::balance::add(args, json),
        Commands::Sub(args) => commands::balance::sub(args, json),
        Commands::Undo => commands::balance::undo(json),
        Commands::Status => commands::balance::status(json),
        Commands::History => commands::balance::history(json),
        Commands::Countdown { action } => commands::countdown::run(action, json),
        Commands::Clear => commands::balance::clear(json),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
