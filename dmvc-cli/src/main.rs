//! DMVC CLI - model and controller generator.
//!
//! ```bash
//! dmvc generate model Widget
//! dmvc generate controller Widget
//! ```

mod commands;
mod templates;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const USAGE: &str = "Usage: dmvc generate [model|controller] Name";

#[derive(Parser)]
#[command(name = "dmvc", about = "DMVC code generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a model or controller file in the current project
    Generate {
        #[command(subcommand)]
        target: Target,
    },
}

#[derive(Subcommand)]
enum Target {
    /// Write src/models/<name>.rs
    Model { name: String },
    /// Write src/controllers/<name>_controller.rs
    Controller { name: String },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    let base = PathBuf::from(".");
    let result = match cli.command {
        Commands::Generate { target: Target::Model { name } } => {
            commands::generate::model(&name, &base).map(|path| println!("Created model: {}", path.display()))
        }
        Commands::Generate { target: Target::Controller { name } } => commands::generate::controller(&name, &base)
            .map(|path| println!("Created controller: {}", path.display())),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
