use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stridelock-cli", version, about = "StrideLock CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's progress and a gate preview
    Status {
        #[command(subcommand)]
        action: commands::status::StatusAction,
    },
    /// Daily goal management
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Locked-app set management
    Lock {
        #[command(subcommand)]
        action: commands::lock::LockAction,
    },
    /// Enforcement configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Emergency override control
    Emergency {
        #[command(subcommand)]
        action: commands::emergency::EmergencyAction,
    },
    /// Block-event history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status { action } => commands::status::run(action),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Lock { action } => commands::lock::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Emergency { action } => commands::emergency::run(action),
        Commands::History { action } => commands::history::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
