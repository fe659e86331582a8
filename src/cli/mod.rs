use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod convert;
mod inspect;

pub use config::Config;

/// qrda-qpp - QRDA Category III to QPP JSON converter
#[derive(Parser)]
#[command(name = "qrda-qpp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a QRDA III file to QPP JSON
    Convert {
        /// Input QRDA III XML file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output JSON path (defaults to <INPUT stem>-qpp.json next to the input)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Walk through elements whose template ids are all unknown instead of failing
        #[arg(long)]
        allow_unknown_templates: bool,

        /// Skip node validation (field validation still applies)
        #[arg(long)]
        skip_validation: bool,
    },

    /// Print the decoded node tree of a QRDA III file
    Inspect {
        /// Input QRDA III XML file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Walk through elements whose template ids are all unknown instead of failing
        #[arg(long)]
        allow_unknown_templates: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            allow_unknown_templates,
            skip_validation,
        } => convert::run(input, output, config, allow_unknown_templates, skip_validation),
        Commands::Inspect {
            input,
            allow_unknown_templates,
        } => inspect::run(input, allow_unknown_templates),
    }
}
