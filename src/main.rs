mod api;
mod app;
mod chat;
mod commands;
mod config;
mod errors;
mod logging;
mod output;
mod parse;
mod tui;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::app::Runtime;
use crate::commands::ask::AskArgs;
use crate::commands::config::ConfigCommand;
use crate::errors::CliError;
use crate::output::{OutputMode, print_error};

#[derive(Debug, Parser)]
#[command(
    name = "gemchat",
    version,
    about = "Terminal chat with Google Gemini. Runs the chat screen when no command is given."
)]
struct Cli {
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    quiet: bool,
    #[arg(long, global = true)]
    verbose: bool,
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or change stored settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Send one prompt and print the formatted reply
    Ask(AskArgs),
    /// Open the interactive chat screen
    Tui,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
        verbose: cli.verbose,
        debug: cli.debug,
    };

    let result = run(cli, output.clone()).await;
    if let Err(err) = result {
        print_error(&err, &output);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli, output: OutputMode) -> Result<(), CliError> {
    let config = config::load_config()?;
    let config_path = config::config_path()?;

    match logging::init(&config, output.debug) {
        Ok(path) => output.print_verbose(&format!("Logging to {}", path.display())),
        Err(err) => output.print_verbose(&format!("Logging disabled: {err}")),
    }

    let mut runtime = Runtime {
        output,
        config,
        config_path,
        api_url_override: cli.api_url,
    };
    debug!(?runtime, "runtime resolved");

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Config { command } => commands::config::handle(&mut runtime, command).await,
        Commands::Ask(args) => commands::ask::handle(&runtime, args).await,
        Commands::Tui => commands::tui::handle(&runtime).await,
    }
}
