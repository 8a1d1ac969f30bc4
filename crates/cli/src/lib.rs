pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use scuderia_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "scuderia",
    about = "Scuderia picker operator CLI",
    long_about = "Operate the Scuderia picker database: migrations, seed picks, statistics, \
                  resets, and driver availability.",
    after_help = "Examples:\n  scuderia migrate\n  scuderia stats --json\n  \
                  scuderia reset --confirm RESET\n  scuderia available\n  \
                  scuderia available --roster roster.json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a scuderia.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the configured database URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the canonical leaderboard seed picks and verify them")]
    Seed,
    #[command(about = "Show pick totals and every pick, most recent first")]
    Stats {
        #[arg(long, help = "Emit a machine-readable JSON report")]
        json: bool,
    },
    #[command(about = "Delete every pick (requires --confirm RESET)")]
    Reset {
        #[arg(long, value_name = "TOKEN", help = "Type RESET to confirm")]
        confirm: Option<String>,
    },
    #[command(about = "Show available drivers per team, from the live roster or --roster")]
    Available {
        #[arg(
            long,
            value_name = "FILE",
            help = "JSON roster: [{\"name\": .., \"drivers\": [..]}]"
        )]
        roster: Option<PathBuf>,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();
    init_logging(&options);

    let result = match &cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Stats { json } => commands::stats::run(&options, *json),
        Command::Reset { confirm } => commands::reset::run(&options, confirm.as_deref()),
        Command::Available { roster } => commands::available::run(&options, roster.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command payload. A config
/// that fails to load falls back to info/compact; the command itself reports
/// the config error.
fn init_logging(options: &LoadOptions) {
    let (level, format) = match AppConfig::load(options.clone()) {
        Ok(config) => {
            (config.logging.level.parse::<Level>().unwrap_or(Level::INFO), config.logging.format)
        }
        Err(_) => (Level::INFO, LogFormat::Compact),
    };

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
