//! Command implementations

pub mod start;
pub mod stop;

use std::path::PathBuf;

use clap::Args;

/// Arguments shared by every command.
#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Supervisor configuration file
    #[arg(long, value_name = "FILE")]
    pub config_file: PathBuf,
}
