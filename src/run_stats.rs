//! Track stats for the whole callreview run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::Serialize;
use unwrap::unwrap;

use crate::pipeline::ReviewOutput;

pub const RUN_STATS_FILENAME: &str = "run.stats.json";

#[derive(Default, Serialize)]
pub struct InputStats {
    pub tumor_record_count: usize,

    /// Comparator records remaining after control sample filtration, if comparator data was given
    pub comparator_record_count: Option<usize>,

    pub manifest_sample_count: Option<usize>,

    /// Complete sample rows in the run summary, if a run summary was given
    pub run_summary_sample_count: Option<usize>,
}

#[derive(Default, Serialize)]
pub struct ReviewStats {
    pub with_comparator_support_count: usize,
    pub flagged_for_revision_count: usize,
    pub without_comparator_data_count: usize,
    pub reviewed_detected_call_count: usize,
}

impl ReviewStats {
    pub fn new(output: &ReviewOutput) -> Self {
        Self {
            with_comparator_support_count: output.with_comparator_support.len(),
            flagged_for_revision_count: output.flagged_for_revision.len(),
            without_comparator_data_count: output.without_comparator_data.len(),
            reviewed_detected_call_count: output
                .reviewed_calls
                .iter()
                .filter(|x| x.call.is_detected())
                .count(),
        }
    }
}

#[derive(Serialize)]
pub struct ReviewRunStats {
    pub input_stats: InputStats,
    pub review_stats: ReviewStats,
    pub total_runtime_secs: f64,
}

#[derive(Serialize)]
pub struct SummarizeRunStats {
    pub reviewed_record_count: usize,
    pub sample_count: usize,
    pub gene_count: usize,
    pub detected_sample_count: usize,
    pub detected_variant_count: usize,
    pub total_runtime_secs: f64,
}

/// Write run_stats structure out in json format
pub fn write_run_stats<T: Serialize>(output_dir: &Utf8Path, run_stats: &T) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &run_stats).unwrap();
}
