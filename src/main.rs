// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
mod bridge;
mod catalog;
mod config;
mod engine;
mod input;
mod playsync;
mod question;
mod scores;
mod session;
mod surface;
#[cfg(test)]
mod test;
mod util;

use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};

use crate::scores::Store;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A listening quiz."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists all samples in the given catalog.
    Samples {
        /// The path to the sample catalog.
        path: String,
    },
    /// Prints the current and high score.
    Scores {
        /// The path to the quiz config.
        config_path: String,
    },
    /// Start will start the quiz session.
    Start {
        /// The path to the quiz config.
        config_path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Samples { path } => {
            let catalog = config::parse_catalog(&PathBuf::from(&path))?;

            if catalog.is_empty() {
                println!("No samples found in {}.", path.as_str());
                return Ok(());
            }

            println!("Samples (count: {}):", catalog.len());
            for sample in catalog.sorted_list() {
                println!("- {}", sample);
            }
        }
        Commands::Scores { config_path } => {
            let quiz = config::Quiz::deserialize(&PathBuf::from(config_path))?;
            let store = scores::FileStore::open(&quiz.scores())?;

            println!("Current score: {}", store.current());
            println!("High score: {}", store.high());
        }
        Commands::Start { config_path } => {
            let session = config::init_session(&PathBuf::from(config_path))?.await?;

            println!(
                "Final score: {} (high score: {}) after {} rounds.",
                session.tracker().current(),
                session.tracker().high(),
                session.rounds_completed(),
            );
        }
    }

    Ok(())
}
