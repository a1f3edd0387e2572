//! warden - lifecycle supervisor for a cluster agent

use clap::Parser;
use warden::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
