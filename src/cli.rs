use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use tracing::Level;

use crate::{
    config::{PortCount, Settings, CHUNK_SIZE, DEFAULT_CONFIG_PATH, DEFAULT_SOURCE_PATH},
    endpoint::{LinkNamespace, DEFAULT_LINK_PREFIX},
    source::WaitPolicy,
};

/// The command line interface for the GPS splitter.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a key-value configuration file holding `gps_port = N`.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// The physical GPS device to read from.
    #[arg(long, default_value = DEFAULT_SOURCE_PATH)]
    pub source: PathBuf,

    /// Endpoints are published as this prefix followed by their index.
    #[arg(long, default_value = DEFAULT_LINK_PREFIX)]
    pub link_prefix: PathBuf,

    /// Seconds between checks while waiting for the source device.
    #[arg(long, default_value_t = 2)]
    pub wait_interval_secs: u64,

    /// How many times to wait for the source device before giving up.
    #[arg(long, default_value_t = 30)]
    pub wait_attempts: u32,

    /// Log level for stdout.
    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,

    /// Also log to a daily rotated file in this directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The run settings described by the arguments.
    pub fn settings(&self) -> Settings {
        Settings {
            config_path: self.config.clone(),
            source_path: self.source.clone(),
            links: LinkNamespace::new(&self.link_prefix),
            wait: WaitPolicy {
                interval: Duration::from_secs(self.wait_interval_secs),
                attempts: self.wait_attempts,
            },
            chunk_size: CHUNK_SIZE,
        }
    }
}

/// Commands available in the command line interface.
#[derive(Subcommand)]
pub enum Commands {
    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),
}

/// Helpful examples for users.
#[derive(Subcommand, Clone)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,
}

/// Handle a subcommand.
pub fn handle_command(command: Commands) {
    match command {
        Commands::Examples(Examples::Config) => print!("{}", PortCount::example()),
    }
}
