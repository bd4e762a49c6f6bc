mod call_record;
mod cli;
mod confirmation_test;
mod errors;
mod gene_summary;
mod globals;
mod join;
mod logger;
mod molecule_counts;
mod normalize;
mod os_utils;
mod partition;
mod pipeline;
mod raw_table;
mod report_output;
mod review;
mod revision;
mod run_metadata;
mod run_stats;
mod sample_manifest;
mod summarize;
mod variant_summary;

use std::process;

use hhmmss::Hhmmss;
use log::{error, info};

use crate::cli::Commands;
use crate::errors::ReviewError;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;
use crate::review::run_review_command;
use crate::summarize::run_summarize_command;

fn run(settings: &cli::Settings) -> Result<(), ReviewError> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    info!("Running on {} threads", settings.shared.thread_count);

    let start = std::time::Instant::now();

    match &settings.command {
        Commands::Review(x) => {
            run_review_command(&settings.shared, x)?;
        }
        Commands::Summarize(x) => {
            run_summarize_command(x)?;
        }
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the output directory for the log file:
    setup_output_dir_and_logger(
        settings.get_output_dir(),
        settings.shared.clobber,
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        error!("{err}");
        process::exit(exitcode::DATAERR);
    }
}
