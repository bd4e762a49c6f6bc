use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use serde::Serialize;
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

use super::utils::{
    canonicalize_string_path, check_non_negative, check_optional_filename,
    check_required_filename,
};
use crate::join::DuplicateKeyPolicy;
use crate::normalize::{DEFAULT_COMPARATOR_SAMPLE_TAG, DEFAULT_CONTROL_MARKERS};
use crate::pipeline::DEFAULT_CONFIRMATION_GENES;
use crate::review::SETTINGS_FILENAME;

#[derive(Args, Serialize)]
pub struct ReviewSettings {
    /// Directory for all review command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_review_output"))]
    pub output_dir: Utf8PathBuf,

    /// Tumor assay mutation calls, in tab-delimited format with a header line
    #[arg(long = "calls", value_name = "FILE")]
    pub calls_filename: String,

    /// Comparator (background) assay mutation calls, in tab-delimited format with a header line
    ///
    /// If this is not given, no call is reviewed and the tumor calls are written out unchanged.
    ///
    #[arg(long = "comparator", value_name = "FILE")]
    pub comparator_filename: Option<String>,

    /// Sample list with external identifiers for each sample, in tab-delimited format
    #[arg(long = "manifest", value_name = "FILE")]
    pub manifest_filename: Option<String>,

    /// Run summary sheet with per-sample run metadata, in tab-delimited format with a header line
    ///
    /// All run summary columns are added to every tumor call of the matching sample.
    ///
    #[arg(long = "run-summary", value_name = "FILE")]
    pub run_summary_filename: Option<String>,

    /// Sequencing flow cell identifier added to every tumor call
    #[arg(long, value_name = "ID")]
    pub flowcell_id: Option<String>,

    /// Gene for which detected tumor calls are checked against the comparator assay. May be
    /// given more than once.
    #[arg(long = "confirmation-gene", value_name = "GENE", default_values = DEFAULT_CONFIRMATION_GENES)]
    pub confirmation_genes: Vec<String>,

    /// Detected calls are revised when the exact test p-value is above this level
    #[arg(long, default_value_t = 0.01)]
    pub max_p_value: f64,

    /// Detected calls are revised when the exact test odds ratio is below this level
    #[arg(long, default_value_t = 2.0)]
    pub min_odds_ratio: f64,

    /// Continuity correction added to each molecule count before the exact test
    #[arg(long, default_value_t = 0.1)]
    pub exact_test_pseudocount: f64,

    /// Handling of a variant key found on more than one comparator row
    #[arg(long, value_enum, default_value_t = DuplicateKeyPolicy::Fail)]
    pub duplicate_comparator_keys: DuplicateKeyPolicy,

    /// Also run the pooled proportions z-test and chi-squared test for each reviewed call
    ///
    /// These results are reported for reference only and never change a call.
    ///
    #[arg(long)]
    pub auxiliary_tests: bool,

    /// Continuity correction added to each molecule count before the proportions z-test
    #[arg(long, default_value_t = 0.0)]
    pub proportions_pseudocount: f64,

    /// Continuity correction added to each molecule count before the chi-squared test
    #[arg(long, default_value_t = 0.0)]
    pub chi_squared_pseudocount: f64,

    /// Apply the Yates continuity correction to the chi-squared test
    #[arg(long)]
    pub yates_correction: bool,

    /// Rows with a sample identifier containing this text are removed as control samples. May be
    /// given more than once.
    #[arg(long = "control-marker", value_name = "TEXT", default_values = DEFAULT_CONTROL_MARKERS)]
    pub control_markers: Vec<String>,

    /// Tag removed from comparator sample identifiers so they match tumor sample identifiers
    #[arg(long, value_name = "TEXT", default_value = DEFAULT_COMPARATOR_SAMPLE_TAG)]
    pub comparator_sample_tag: String,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_review_settings(
    mut settings: ReviewSettings,
) -> SimpleResult<ReviewSettings> {
    check_required_filename(&settings.calls_filename, "tumor calls")?;
    check_optional_filename(settings.comparator_filename.as_ref(), "comparator calls")?;
    check_optional_filename(settings.manifest_filename.as_ref(), "sample manifest")?;
    check_optional_filename(settings.run_summary_filename.as_ref(), "run summary")?;

    if settings.flowcell_id.as_ref().is_some_and(|x| x.is_empty()) {
        bail!("--flowcell-id argument can't be empty");
    }

    if settings.confirmation_genes.iter().any(|x| x.is_empty()) {
        bail!("--confirmation-gene arguments can't be empty");
    }

    if !(settings.max_p_value > 0.0 && settings.max_p_value <= 1.0) {
        bail!(
            "--max-p-value argument must be in (0,1], found {}",
            settings.max_p_value
        );
    }
    check_non_negative(settings.min_odds_ratio, "min-odds-ratio")?;
    check_non_negative(settings.exact_test_pseudocount, "exact-test-pseudocount")?;
    check_non_negative(settings.proportions_pseudocount, "proportions-pseudocount")?;
    check_non_negative(settings.chi_squared_pseudocount, "chi-squared-pseudocount")?;

    if settings.control_markers.iter().any(|x| x.is_empty()) {
        bail!("--control-marker arguments can't be empty, since they would match every sample");
    }

    settings.calls_filename = canonicalize_string_path(&settings.calls_filename)?;
    settings.comparator_filename = settings
        .comparator_filename
        .map(|x| canonicalize_string_path(&x))
        .transpose()?;
    settings.manifest_filename = settings
        .manifest_filename
        .map(|x| canonicalize_string_path(&x))
        .transpose()?;
    settings.run_summary_filename = settings
        .run_summary_filename
        .map(|x| canonicalize_string_path(&x))
        .transpose()?;

    Ok(settings)
}

/// Write review settings out in json format
pub fn write_review_settings(output_dir: &Utf8Path, settings: &ReviewSettings) {
    use log::info;

    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing review settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create review settings json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &settings).unwrap();
}
