//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::logging::{self, LoggerConfig, LoggerFormat};

/// Lifecycle supervisor for a cluster agent
#[derive(Parser)]
#[command(
    name = "warden",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Log format: text or json
    #[arg(long, global = true, env = "WARDEN_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Log filter directive, e.g. `info` or `warden=debug`
    #[arg(long, global = true, env = "WARDEN_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write configuration, launch the agent and bring it into the cluster
    Start(commands::start::StartArgs),

    /// Take the agent out of the cluster and terminate it
    Stop(commands::stop::StopArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if logging cannot be initialised or the command fails.
    pub fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            log_format,
            log_level,
            command,
        } = self;

        logging::init(&LoggerConfig {
            format: log_format,
            level: log_level,
            use_color: !no_color && LoggerConfig::default().use_color,
        })?;

        let app = AppContext::new(&AppFlags { no_color, quiet });
        match command {
            Command::Start(args) => commands::start::run(&args, &app),
            Command::Stop(args) => commands::stop::run(&args, &app),
        }
    }
}
