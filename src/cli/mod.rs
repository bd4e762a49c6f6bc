mod review;
mod shared;
mod summarize;
mod utils;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use simple_error::{SimpleResult, bail};

use self::review::validate_and_fix_review_settings;
pub use self::review::{ReviewSettings, write_review_settings};
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;
use self::summarize::validate_and_fix_summarize_settings;
pub use self::summarize::SummarizeSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Review tumor mutant calls against comparator (background) assay calls, and revise calls
    /// the comparator assay does not support
    Review(ReviewSettings),

    /// Summarize reviewed calls into per-sample gene status and mutant description tables
    Summarize(SummarizeSettings),
}

#[derive(Parser)]
#[command(
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    pub fn get_output_dir(&self) -> &Utf8Path {
        match &self.command {
            Commands::Review(x) => &x.output_dir,
            Commands::Summarize(x) => &x.output_dir,
        }
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{label} already exists: \"{dirname}\"");
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes no logger has been setup yet
///
pub fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::Review(x) => {
            let x = validate_and_fix_review_settings(x)?;
            Commands::Review(x)
        }
        Commands::Summarize(x) => {
            let x = validate_and_fix_summarize_settings(x)?;
            Commands::Summarize(x)
        }
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review_command() {
        let settings = Settings::try_parse_from([
            "callreview",
            "review",
            "--calls",
            "calls.tsv",
            "--comparator",
            "bc.tsv",
            "--confirmation-gene",
            "TP53",
            "--duplicate-comparator-keys",
            "first",
            "--threads",
            "2",
        ])
        .unwrap();
        assert!(!settings.shared.clobber);
        match settings.command {
            Commands::Review(x) => {
                assert_eq!(x.calls_filename, "calls.tsv");
                assert_eq!(x.comparator_filename.as_deref(), Some("bc.tsv"));
                assert_eq!(x.confirmation_genes, vec!["TP53"]);
                assert_eq!(x.max_p_value, 0.01);
                assert_eq!(x.min_odds_ratio, 2.0);
                assert_eq!(x.exact_test_pseudocount, 0.1);
                assert_eq!(
                    x.duplicate_comparator_keys,
                    crate::join::DuplicateKeyPolicy::First
                );
                assert_eq!(x.control_markers, vec!["PC", "NC", "NTC"]);
                assert_eq!(x.comparator_sample_tag, "BC");
                assert_eq!(x.output_dir.as_str(), "callreview_review_output");
            }
            Commands::Summarize(_) => panic!("Unexpected command"),
        }
    }

    #[test]
    fn test_parse_review_default_genes() {
        let settings = Settings::try_parse_from(["callreview", "review", "--calls", "calls.tsv"])
            .unwrap();
        match settings.command {
            Commands::Review(x) => assert_eq!(x.confirmation_genes, vec!["TP53", "KRAS"]),
            Commands::Summarize(_) => panic!("Unexpected command"),
        }
    }
}
