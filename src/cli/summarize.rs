use camino::Utf8PathBuf;
use clap::Args;
use const_format::concatcp;
use simple_error::SimpleResult;

use super::utils::{canonicalize_string_path, check_optional_filename, check_required_filename};

#[derive(Args)]
pub struct SummarizeSettings {
    /// Directory for all summarize command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_summarize_output"))]
    pub output_dir: Utf8PathBuf,

    /// Reviewed calls written by the review command, or any call table in the same format
    #[arg(long = "reviewed-calls", value_name = "FILE")]
    pub reviewed_calls_filename: String,

    /// Sample list with external identifiers for each sample, in tab-delimited format
    ///
    /// When given, samples are reported in manifest order, and detected variants are listed with
    /// their sample's external identifiers.
    ///
    #[arg(long = "manifest", value_name = "FILE")]
    pub manifest_filename: Option<String>,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_summarize_settings(
    mut settings: SummarizeSettings,
) -> SimpleResult<SummarizeSettings> {
    check_required_filename(&settings.reviewed_calls_filename, "reviewed calls")?;
    check_optional_filename(settings.manifest_filename.as_ref(), "sample manifest")?;

    settings.reviewed_calls_filename = canonicalize_string_path(&settings.reviewed_calls_filename)?;
    settings.manifest_filename = settings
        .manifest_filename
        .map(|x| canonicalize_string_path(&x))
        .transpose()?;

    Ok(settings)
}
