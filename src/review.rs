use std::collections::HashSet;

use camino::Utf8Path;
use log::info;

use crate::call_record::CallRecord;
use crate::cli;
use crate::confirmation_test::ConfirmationTestSettings;
use crate::errors::Result;
use crate::normalize::normalize_call_table;
use crate::pipeline::{ReviewConfig, run_review};
use crate::raw_table::RawTable;
use crate::report_output::{
    write_call_records, write_comparator_reviews, write_revision_audit, write_sample_manifest,
};
use crate::revision::RevisionPolicy;
use crate::run_metadata::{annotate_run_metadata, build_run_summary};
use crate::run_stats::{InputStats, ReviewRunStats, ReviewStats, write_run_stats};
use crate::sample_manifest::build_sample_manifest;

pub const COMPARATOR_SUPPORTED_FILENAME: &str = "comparator_supported.tsv";
pub const FLAGGED_FOR_REVISION_FILENAME: &str = "flagged_for_revision.tsv";
pub const NO_COMPARATOR_DATA_FILENAME: &str = "no_comparator_data.tsv";
pub const RESULTS_REVIEW_FILENAME: &str = "results_review.tsv";
pub const REVISION_AUDIT_FILENAME: &str = "revision_audit.json";
pub const SAMPLE_MAPPING_FILENAME: &str = "sample_mapping.tsv";
pub const SETTINGS_FILENAME: &str = "review.settings.json";

fn get_review_config(shared_settings: &cli::SharedSettings, settings: &cli::ReviewSettings) -> ReviewConfig {
    ReviewConfig {
        confirmation_genes: settings.confirmation_genes.clone(),
        test_settings: ConfirmationTestSettings {
            exact_test_pseudocount: settings.exact_test_pseudocount,
            auxiliary_tests: settings.auxiliary_tests,
            proportions_pseudocount: settings.proportions_pseudocount,
            chi_squared_pseudocount: settings.chi_squared_pseudocount,
            yates_correction: settings.yates_correction,
        },
        revision_policy: RevisionPolicy {
            max_p_value: settings.max_p_value,
            min_odds_ratio: settings.min_odds_ratio,
            ..Default::default()
        },
        duplicate_policy: settings.duplicate_comparator_keys,
        thread_count: shared_settings.thread_count,
    }
}

fn read_call_table(
    filename: &str,
    label: &str,
    control_markers: &[String],
    sample_tag: Option<&str>,
) -> Result<Vec<CallRecord>> {
    let table = RawTable::from_tsv_file(Utf8Path::new(filename), label)?;
    normalize_call_table(&table, label, control_markers, sample_tag)
}

pub fn run_review_command(
    shared_settings: &cli::SharedSettings,
    settings: &cli::ReviewSettings,
) -> Result<()> {
    cli::write_review_settings(&settings.output_dir, settings);

    let start = std::time::Instant::now();
    let output_dir = &settings.output_dir;

    let mut tumor = read_call_table(
        &settings.calls_filename,
        "tumor calls",
        &settings.control_markers,
        None,
    )?;

    let comparator = settings
        .comparator_filename
        .as_ref()
        .map(|x| {
            read_call_table(
                x,
                "comparator calls",
                &settings.control_markers,
                Some(settings.comparator_sample_tag.as_str()),
            )
        })
        .transpose()?;

    let run_summary = match &settings.run_summary_filename {
        Some(filename) => {
            let table = RawTable::from_tsv_file(Utf8Path::new(filename), "run summary")?;
            Some(build_run_summary(&table)?)
        }
        None => None,
    };
    annotate_run_metadata(
        &mut tumor,
        settings.flowcell_id.as_deref(),
        run_summary.as_ref(),
    );

    let manifest = match &settings.manifest_filename {
        Some(filename) => {
            let table = RawTable::from_tsv_file(Utf8Path::new(filename), "sample manifest")?;
            let called_samples = tumor
                .iter()
                .map(|x| x.sample_id.clone())
                .collect::<HashSet<_>>();
            Some(build_sample_manifest(&table, Some(&called_samples))?)
        }
        None => None,
    };

    let config = get_review_config(shared_settings, settings);
    let output = run_review(&tumor, comparator.as_deref(), &config)?;

    write_call_records(
        &output_dir.join(RESULTS_REVIEW_FILENAME),
        "reviewed calls",
        &output.reviewed_calls,
    )?;
    write_comparator_reviews(
        &output_dir.join(COMPARATOR_SUPPORTED_FILENAME),
        "comparator supported calls",
        &output.with_comparator_support,
    )?;
    write_comparator_reviews(
        &output_dir.join(FLAGGED_FOR_REVISION_FILENAME),
        "calls flagged for revision",
        &output.flagged_for_revision,
    )?;
    write_call_records(
        &output_dir.join(NO_COMPARATOR_DATA_FILENAME),
        "calls without comparator data",
        &output.without_comparator_data,
    )?;
    write_revision_audit(
        &output_dir.join(REVISION_AUDIT_FILENAME),
        &output.revision_audit,
    )?;
    if let Some(manifest) = &manifest {
        write_sample_manifest(&output_dir.join(SAMPLE_MAPPING_FILENAME), manifest)?;
    }

    info!(
        "Review complete, {} of {} comparator supported calls revised",
        output.flagged_for_revision.len(),
        output.with_comparator_support.len()
    );

    let run_stats = ReviewRunStats {
        input_stats: InputStats {
            tumor_record_count: tumor.len(),
            comparator_record_count: comparator.as_ref().map(|x| x.len()),
            manifest_sample_count: manifest.as_ref().map(|x| x.samples.len()),
            run_summary_sample_count: run_summary.as_ref().map(|x| x.sample_count()),
        },
        review_stats: ReviewStats::new(&output),
        total_runtime_secs: start.elapsed().as_secs_f64(),
    };
    write_run_stats(output_dir, &run_stats);

    Ok(())
}
