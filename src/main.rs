//! # qrda-qpp
//!
//! A command-line tool for converting QRDA Category III reports to QPP JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Convert a report; writes report-qpp.json, or report-error.json when invalid
//! qrda-qpp convert report.xml
//!
//! # Show what the decoders made of a report
//! qrda-qpp -v inspect report.xml
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
