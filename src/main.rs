use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{CheckCommand, ConfigCommand, InitCommand, InspectCommand, KeyCommand};
use fintrack::config::{self, Config};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(version)]
#[command(about = "Maintenance tool for the fintrack data file", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data file if it does not exist
    Init(InitCommand),

    /// Check that every collection is present
    Check(CheckCommand),

    /// Summarize the contents of the data file
    Inspect(InspectCommand),

    /// Manage the data encryption key
    Key(KeyCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Init(cmd)) => cmd.run(&config)?,
        Some(Commands::Check(cmd)) => cmd.run(&config)?,
        Some(Commands::Inspect(cmd)) => cmd.run(&config)?,
        Some(Commands::Key(cmd)) => cmd.run()?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
