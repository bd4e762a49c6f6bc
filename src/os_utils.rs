//! Utilities pertaining to the filesystem
//!

use camino::Utf8Path;
use simple_error::{SimpleResult, bail};

/// Create a novel directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
/// * `label` - used to describe the error directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dir.exists() && !dir.is_dir() {
        bail!("Can't create new {label} directory at '{dir}': path exists and is not a directory");
    }
    if !dir.is_dir() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            bail!("Can't create new {label} directory at '{dir}': {e}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_all_on_file() {
        let filename = Utf8Path::new("./test_data/calls.tsv");
        assert!(create_dir_all(filename, "output").is_err());
    }
}
