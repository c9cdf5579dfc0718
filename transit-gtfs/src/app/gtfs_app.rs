use std::path::Path;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use super::{import_feed, prepare_feed, AppError};

/// Command line tool importing GTFS feeds into a transit network snapshot
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct GtfsApp {
    #[command(subcommand)]
    pub op: GtfsOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum GtfsOperation {
    /// import a feed into the network
    Import {
        /// directory holding the unzipped feed files
        #[arg(long)]
        feed_directory: String,

        /// TOML file with the import parameters. values can be overridden
        /// with TRANSIT_GTFS__<KEY> environment variables.
        #[arg(long)]
        config_file: String,

        /// JSON network snapshot to import into. the network starts empty
        /// when missing.
        #[arg(long)]
        network_file: Option<String>,

        /// where to write the resulting network. without it, the network file is
        /// overwritten when the import succeeds.
        #[arg(long)]
        output_file: Option<String>,
    },
    /// print the feed agencies, lines and services with their matches in the
    /// network, to write the selections of an import configuration.
    Prepare {
        #[arg(long)]
        feed_directory: String,

        #[arg(long)]
        network_file: Option<String>,
    },
}

impl GtfsOperation {
    pub fn run(&self) -> Result<(), AppError> {
        match self {
            GtfsOperation::Import {
                feed_directory,
                config_file,
                network_file,
                output_file,
            } => import_feed::run(
                Path::new(feed_directory),
                Path::new(config_file),
                network_file.as_ref().map(Path::new),
                output_file.as_ref().map(Path::new),
            ),
            GtfsOperation::Prepare {
                feed_directory,
                network_file,
            } => prepare_feed::run(
                Path::new(feed_directory),
                network_file.as_ref().map(Path::new),
            ),
        }
    }
}
