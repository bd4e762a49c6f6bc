use camino::Utf8PathBuf;
use simple_error::{SimpleResult, bail};

/// Check a required input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_required_filename(filename: &str, label: &str) -> SimpleResult<()> {
    if filename.is_empty() {
        bail!("Must specify {label} file");
    }
    check_input_file(filename, label)
}

/// Check an optional input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_optional_filename(filename_opt: Option<&String>, label: &str) -> SimpleResult<()> {
    if let Some(filename) = filename_opt {
        check_input_file(filename, label)?;
    }
    Ok(())
}

fn check_input_file(filename: &str, label: &str) -> SimpleResult<()> {
    let path = std::path::Path::new(filename);
    if !path.exists() {
        bail!("Can't find specified {label} file: '{filename}'");
    }
    if !path.is_file() {
        bail!("Specified {label} file path does not appear to be a file: '{filename}'");
    }
    Ok(())
}

/// Convert an input file path to its canonical absolute form, so that the settings written to
/// the output directory remain valid from any working directory
///
pub fn canonicalize_string_path(filename: &str) -> SimpleResult<String> {
    match Utf8PathBuf::from(filename).canonicalize_utf8() {
        Ok(x) => Ok(x.to_string()),
        Err(e) => bail!("Can't canonicalize input file path '{filename}': {e}"),
    }
}

/// Check that a numeric option is finite and not negative
pub fn check_non_negative(value: f64, option_name: &str) -> SimpleResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        bail!("--{option_name} argument must be a finite non-negative number, found {value}");
    }
    Ok(())
}
