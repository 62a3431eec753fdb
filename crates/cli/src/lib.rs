pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "cordwood",
    about = "Cordwood operator CLI",
    long_about = "Process dialog turns locally and manage the hosted bot environment.",
    after_help = "Examples:\n  cordwood respond --event turn.json\n  cordwood build\n  cordwood probe \"I want two cords of split firewood\"\n  cordwood destroy\n  cordwood config"
)]
pub struct Cli {
    /// Path to cordwood.toml (defaults to the standard lookup locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Process one turn event file and print the response")]
    Respond {
        #[arg(long, help = "Path to the inbound event JSON document")]
        event: PathBuf,
    },
    #[command(about = "Create the hosted bot environment and wait for it to become ready")]
    Build,
    #[command(about = "Send an ad hoc text into the hosted bot and print its reply")]
    Probe {
        text: String,
        #[arg(long, default_value = "smoke-test", help = "User id to attribute the probe to")]
        user_id: String,
    },
    #[command(about = "Tear down the hosted bot environment, tolerating partial failures")]
    Destroy,
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Respond { event } => commands::respond::run(cli.config, &event).await,
        Command::Build => commands::provision::build(cli.config).await,
        Command::Probe { text, user_id } => {
            commands::provision::probe(cli.config, &user_id, &text).await
        }
        Command::Destroy => commands::provision::destroy(cli.config).await,
        Command::Config => commands::config::run(cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
