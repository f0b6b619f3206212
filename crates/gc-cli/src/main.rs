//! gridctl CLI
//!
//! Operator console for an OpenSim grid:
//! - Robust directory process and estate simulators in tmux windows
//! - Paced start-all / stop-all
//! - Login administration and console access

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gc_core::config::{self, PanelConfig};
use gc_core::types::StopMode;
use gc_core::DetectOptions;
use gc_orchestrator::{GridContext, LoginAction, Orchestrator};
use gridctl::commands;
use gridctl::output::print_error;

#[derive(Parser)]
#[command(name = "gridctl")]
#[command(author, version, about = "Operator console for an OpenSim grid")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the panel configuration file (gridctl.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show transport, host load and the state of every process
    Status {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Manage estate simulators
    Estate {
        #[command(subcommand)]
        action: EstateAction,
    },

    /// Manage the Robust directory process
    Robust {
        #[command(subcommand)]
        action: RobustAction,
    },

    /// Login administration on a console
    Login {
        #[command(subcommand)]
        action: LoginCommand,
    },

    /// Show the tail of a console, or attach to it
    Console {
        /// `robust`, `estate:<name>` or an estate name
        target: String,
        /// Number of lines to capture
        #[arg(short = 'n', long)]
        lines: Option<usize>,
        /// Attach the terminal to the console (detach with the tmux prefix + d)
        #[arg(short, long)]
        attach: bool,
    },

    /// Show CPU, memory and disk usage of the farm host
    Sysinfo {
        #[arg(long)]
        json: bool,
    },

    /// Manage the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Forget the session marker of a target (the process is not touched)
    ClearSession {
        target: String,
    },
}

#[derive(Subcommand)]
enum EstateAction {
    /// List discovered estates
    List {
        #[arg(long)]
        json: bool,
    },
    /// Start an estate
    Start { name: String },
    /// Stop an estate (graceful shutdown unless --force)
    Stop {
        name: String,
        /// Signal the process and clear its session marker
        #[arg(short, long)]
        force: bool,
    },
    /// Stop, wait, then start an estate
    Restart {
        name: String,
        #[arg(short, long)]
        force: bool,
    },
    /// Start every stopped estate, paced in batches
    StartAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Stop every running estate, paced in batches
    StopAll {
        #[arg(short, long)]
        force: bool,
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or set extra launch arguments
    Args {
        name: String,
        /// Replace the saved arguments
        #[arg(long)]
        set: Option<String>,
    },
    /// Ask an estate to re-read its configuration
    Reload { name: String },
}

#[derive(Subcommand)]
enum RobustAction {
    /// Start Robust
    Start,
    /// Stop Robust (graceful shutdown unless --force)
    Stop {
        #[arg(short, long)]
        force: bool,
    },
    /// Stop, wait, then start Robust
    Restart {
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum LoginCommand {
    /// Allow logins
    Enable {
        target: Option<String>,
        /// Every running estate
        #[arg(long, conflicts_with = "target")]
        all: bool,
    },
    /// Refuse logins
    Disable {
        target: Option<String>,
        #[arg(long, conflicts_with = "target")]
        all: bool,
    },
    /// Read the login state back from the console
    Status {
        target: Option<String>,
        #[arg(long, conflicts_with = "target")]
        all: bool,
    },
    /// Minimum user level allowed to log in
    Level { level: u32, target: String },
    /// Message shown at login
    Text { message: String, target: String },
    /// Reset login restrictions
    Reset { target: String },
}

impl LoginCommand {
    fn into_parts(self) -> (LoginAction, Option<String>, bool) {
        match self {
            LoginCommand::Enable { target, all } => (LoginAction::Enable, target, all),
            LoginCommand::Disable { target, all } => (LoginAction::Disable, target, all),
            LoginCommand::Status { target, all } => (LoginAction::Status, target, all),
            LoginCommand::Level { level, target } => (LoginAction::Level(level), Some(target), false),
            LoginCommand::Text { message, target } => (LoginAction::Text(message), Some(target), false),
            LoginCommand::Reset { target } => (LoginAction::Reset, Some(target), false),
        }
    }
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show effective settings
    Show,
    /// Set a value (VG_BASE, VG_ESTATES, VG_REMOTE_HOST, ...)
    Set { key: String, value: String },
    /// Show the settings file path
    Path,
}

fn stop_mode(force: bool) -> StopMode {
    if force {
        StopMode::Forced
    } else {
        StopMode::Graceful
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn settings_action(action: SettingsAction, path: &Path) -> Result<()> {
    match action {
        SettingsAction::Show => commands::settings_show(path),
        SettingsAction::Set { key, value } => commands::settings_set(path, &key, &value),
        SettingsAction::Path => commands::settings_path(path),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings_path = config::default_settings_path();

    // Settings never need the farm host
    let command = match cli.command.unwrap_or(Commands::Status { json: false }) {
        Commands::Settings { action } => return settings_action(action, &settings_path),
        other => other,
    };

    let settings = config::load_settings(&settings_path);
    let panel = PanelConfig::load_or_default(cli.config.as_deref());
    let ctx = GridContext::detect(settings, panel, DetectOptions::from_env()).await;
    tracing::info!("Transport: {}", ctx.transport);
    let orch = Orchestrator::new(ctx);

    match command {
        Commands::Status { json } => commands::status_command(&orch, json).await,

        Commands::Estate { action } => match action {
            EstateAction::List { json } => commands::estate_list(&orch, json).await,
            EstateAction::Start { name } => commands::estate_start(&orch, &name).await,
            EstateAction::Stop { name, force } => {
                commands::estate_stop(&orch, &name, stop_mode(force)).await
            }
            EstateAction::Restart { name, force } => {
                commands::estate_restart(&orch, &name, stop_mode(force)).await
            }
            EstateAction::StartAll { yes } => commands::estate_start_all(&orch, yes).await,
            EstateAction::StopAll { force, yes } => {
                commands::estate_stop_all(&orch, stop_mode(force), yes).await
            }
            EstateAction::Args { name, set } => {
                commands::estate_args(&orch, &name, set.as_deref()).await
            }
            EstateAction::Reload { name } => commands::estate_reload(&orch, &name).await,
        },

        Commands::Robust { action } => match action {
            RobustAction::Start => commands::robust_start(&orch).await,
            RobustAction::Stop { force } => commands::robust_stop(&orch, stop_mode(force)).await,
            RobustAction::Restart { force } => {
                commands::robust_restart(&orch, stop_mode(force)).await
            }
        },

        Commands::Login { action } => {
            let (action, target, all) = action.into_parts();
            commands::login_command(&orch, action, target.as_deref(), all).await
        }

        Commands::Console {
            target,
            lines,
            attach,
        } => commands::console_command(&orch, &target, lines, attach).await,

        Commands::Sysinfo { json } => commands::sysinfo_command(&orch, json).await,

        Commands::ClearSession { target } => commands::clear_session_command(&orch, &target),

        Commands::Settings { action } => settings_action(action, &settings_path),
    }
}
