//! Tab-delimited and json report writers for call review results
//!

use std::fs::File;

use camino::Utf8Path;
use csv::WriterBuilder;
use itertools::Itertools;
use log::info;
use strum::IntoEnumIterator;
use thousands::Separable;

use crate::call_record::CallRecord;
use crate::errors::{Result, ReviewError};
use crate::gene_summary::GeneSummary;
use crate::normalize::CallField;
use crate::partition::ComparatorReview;
use crate::revision::RevisionAuditEntry;
use crate::sample_manifest::{SampleManifest, SampleMapping};
use crate::variant_summary::VariantSummaryRow;

const TEST_RESULT_COLUMNS: &[&str] = &[
    "mutant_molecules_tumor",
    "reference_molecules_tumor",
    "mutant_molecules_comparator",
    "reference_molecules_comparator",
    "fisher_p_value",
    "fisher_odds_ratio",
    "ztest_statistic",
    "ztest_p_value",
    "chi2_statistic",
    "chi2_p_value",
    "chi2_dof",
    "revised",
];

/// Raw call fields reported for both assays in the comparator review tables
const RAW_COMPARISON_FIELDS: &[CallField] = &[
    CallField::Call,
    CallField::UidsPerAmplicon,
    CallField::Supermutants,
    CallField::GenomeEquivalents,
    CallField::MafPercent,
    CallField::MutantMolecules,
];

/// Variant summary fields before and after the extra input columns
const VARIANT_LEAD_FIELDS: &[CallField] = &[
    CallField::GenomeEquivalents,
    CallField::GeneName,
    CallField::AmpliconId,
    CallField::CdsChange,
    CallField::AaChange,
];
const VARIANT_TRAIL_FIELDS: &[CallField] = &[
    CallField::MafPercent,
    CallField::MutantMolecules,
    CallField::Call,
    CallField::UidsPerAmplicon,
    CallField::Supermutants,
    CallField::CommentInternal,
    CallField::CommentExternal,
];

const MANIFEST_COLUMNS: &[&str] = &["external_id1", "external_id2", "external_id3"];

fn create_tsv_writer(filename: &Utf8Path, label: &str) -> Result<csv::Writer<File>> {
    info!("Writing {label} to file: '{filename}'");
    let file = File::create(filename).map_err(|e| {
        ReviewError::Io(std::io::Error::new(
            e.kind(),
            format!("Unable to create {label} file '{filename}': {e}"),
        ))
    })?;
    Ok(WriterBuilder::new().delimiter(b'\t').from_writer(file))
}

fn format_optional_number(value: Option<f64>) -> String {
    value.map(|x| x.to_string()).unwrap_or_default()
}

/// Names of all extra input columns carried by `records`, in first-appearance order
fn extra_columns<'a>(records: impl Iterator<Item = &'a CallRecord>) -> Vec<String> {
    records
        .flat_map(|x| x.extra_fields.iter().map(|(name, _)| name.clone()))
        .unique()
        .collect()
}

fn call_record_header(extra_columns: &[String]) -> Vec<String> {
    CallField::iter()
        .map(|x| x.name().to_string())
        .chain(extra_columns.iter().cloned())
        .collect()
}

fn call_field_cell(record: &CallRecord, field: CallField) -> String {
    match field {
        CallField::SampleId => record.sample_id.clone(),
        CallField::GeneName => record.gene_name.clone(),
        CallField::CdsChange => record.cds_change.clone(),
        CallField::AaChange => record.aa_change.clone(),
        CallField::Call => record.call.to_string(),
        CallField::UidsPerAmplicon => format_optional_number(record.uids_per_amplicon),
        CallField::Supermutants => format_optional_number(record.supermutants),
        CallField::GenomeEquivalents => format_optional_number(record.genome_equivalents),
        CallField::CommentInternal => record.comment_internal.clone().unwrap_or_default(),
        CallField::CommentExternal => record.comment_external.clone().unwrap_or_default(),
        CallField::AmpliconId => record.amplicon_id.clone().unwrap_or_default(),
        CallField::MafPercent => format_optional_number(record.maf_percent),
        CallField::MutantMolecules => format_optional_number(record.mutant_molecules),
    }
}

fn extra_field_cells(record: &CallRecord, extra_columns: &[String]) -> Vec<String> {
    extra_columns
        .iter()
        .map(|x| record.extra_field(x).unwrap_or_default().to_string())
        .collect()
}

/// Cells of one call record in `call_record_header` column order
fn call_record_cells(record: &CallRecord, extra_columns: &[String]) -> Vec<String> {
    let mut cells = CallField::iter()
        .map(|field| call_field_cell(record, field))
        .collect::<Vec<_>>();
    cells.extend(extra_field_cells(record, extra_columns));
    cells
}

/// Write call records with canonical column names, followed by all extra input columns
///
/// The output can be read back in as a call table.
///
pub fn write_call_records(filename: &Utf8Path, label: &str, records: &[CallRecord]) -> Result<()> {
    let extra_columns = extra_columns(records.iter());
    let mut writer = create_tsv_writer(filename, label)?;
    writer.write_record(call_record_header(&extra_columns))?;
    for record in records {
        writer.write_record(call_record_cells(record, &extra_columns))?;
    }
    writer.flush()?;
    info!(
        "Wrote {} records to {label} file",
        records.len().separate_with_commas()
    );
    Ok(())
}

fn comparator_review_header(extra_columns: &[String]) -> Vec<String> {
    let mut header = call_record_header(extra_columns);
    for field in RAW_COMPARISON_FIELDS {
        header.push(format!("{}_tumor", field.name()));
        header.push(format!("{}_comparator", field.name()));
    }
    header.extend(TEST_RESULT_COLUMNS.iter().map(|x| x.to_string()));
    header
}

fn comparator_review_cells(review: &ComparatorReview, extra_columns: &[String]) -> Vec<String> {
    let result = &review.result;
    let counts = &result.counts;
    let mut row = call_record_cells(&review.record, extra_columns);
    for &field in RAW_COMPARISON_FIELDS {
        row.push(call_field_cell(&review.record, field));
        row.push(call_field_cell(&review.comparator, field));
    }
    row.extend([
        counts.mutant_molecules_tumor.to_string(),
        counts.reference_molecules_tumor.to_string(),
        counts.mutant_molecules_comparator.to_string(),
        counts.reference_molecules_comparator.to_string(),
        result.exact.p_value.to_string(),
        result.exact.odds_ratio.to_string(),
        format_optional_number(result.proportions.map(|x| x.z_statistic)),
        format_optional_number(result.proportions.map(|x| x.p_value)),
        format_optional_number(result.chi_squared.map(|x| x.statistic)),
        format_optional_number(result.chi_squared.map(|x| x.p_value)),
        result
            .chi_squared
            .map(|x| x.degrees_of_freedom.to_string())
            .unwrap_or_default(),
        review.revised.to_string(),
    ]);
    row
}

/// Write reviewed calls with the raw values of both assays, molecule counts and test results
///
/// Auxiliary test columns are left empty when those tests were not run.
///
pub fn write_comparator_reviews(
    filename: &Utf8Path,
    label: &str,
    reviews: &[ComparatorReview],
) -> Result<()> {
    let extra_columns = extra_columns(reviews.iter().map(|x| &x.record));
    let mut writer = create_tsv_writer(filename, label)?;
    writer.write_record(comparator_review_header(&extra_columns))?;
    for review in reviews {
        writer.write_record(comparator_review_cells(review, &extra_columns))?;
    }
    writer.flush()?;
    info!(
        "Wrote {} records to {label} file",
        reviews.len().separate_with_commas()
    );
    Ok(())
}

/// Write the list of revised calls, with the test results responsible for each revision
pub fn write_revision_audit(filename: &Utf8Path, audit: &[RevisionAuditEntry]) -> Result<()> {
    info!("Writing call revision audit to file: '{filename}'");
    let file = File::create(filename)?;
    serde_json::to_writer_pretty(&file, audit)?;
    Ok(())
}

pub fn write_sample_manifest(filename: &Utf8Path, manifest: &SampleManifest) -> Result<()> {
    let mut writer = create_tsv_writer(filename, "sample mapping")?;
    writer.write_record(std::iter::once("sample_id").chain(MANIFEST_COLUMNS.iter().copied()))?;
    for sample in manifest.samples.iter() {
        writer.write_record([
            sample.sample_id.as_str(),
            sample.external_id1.as_deref().unwrap_or_default(),
            sample.external_id2.as_deref().unwrap_or_default(),
            sample.external_id3.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Manifest cells for one sample, empty if the sample has no manifest entry
fn manifest_cells(mapping: Option<&SampleMapping>) -> [String; 3] {
    match mapping {
        Some(x) => [
            x.external_id1.clone().unwrap_or_default(),
            x.external_id2.clone().unwrap_or_default(),
            x.external_id3.clone().unwrap_or_default(),
        ],
        None => Default::default(),
    }
}

/// Write one row per sample with a status column for each gene
pub fn write_gene_summary(filename: &Utf8Path, summary: &GeneSummary) -> Result<()> {
    let mut writer = create_tsv_writer(filename, "gene summary")?;
    let mut header = vec!["sample_id"];
    header.extend_from_slice(MANIFEST_COLUMNS);
    header.extend(["total_genome_equivalents", "overall_status"]);
    header.extend(summary.genes.iter().map(|x| x.as_str()));
    writer.write_record(header)?;

    for sample in summary.samples.iter() {
        let mut row = vec![sample.sample_id.clone()];
        row.extend(manifest_cells(sample.mapping.as_ref()));
        row.push(format_optional_number(sample.total_genome_equivalents));
        row.push(sample.overall_status.to_string());
        for gene in summary.genes.iter() {
            let status = sample
                .gene_status
                .get(gene)
                .map(|x| x.to_string())
                .unwrap_or_default();
            row.push(status);
        }
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one row per sample with the mutation description of all detected calls
pub fn write_mutant_summary(filename: &Utf8Path, summary: &GeneSummary) -> Result<()> {
    let mut writer = create_tsv_writer(filename, "mutant summary")?;
    let mut header = vec!["sample_id"];
    header.extend_from_slice(MANIFEST_COLUMNS);
    header.extend(["total_genome_equivalents", "overall_status", "description"]);
    writer.write_record(header)?;

    for sample in summary.samples.iter() {
        let mut row = vec![sample.sample_id.clone()];
        row.extend(manifest_cells(sample.mapping.as_ref()));
        row.push(format_optional_number(sample.total_genome_equivalents));
        row.push(sample.overall_status.to_string());
        row.push(sample.description_label().to_string());
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one row per detected variant with the sample's external identifiers
pub fn write_variant_summary(filename: &Utf8Path, rows: &[VariantSummaryRow]) -> Result<()> {
    let extra_columns = extra_columns(rows.iter().map(|x| &x.record));
    let mut writer = create_tsv_writer(filename, "variant summary")?;
    writer.write_record(variant_summary_header(&extra_columns))?;
    for row in rows {
        writer.write_record(variant_summary_cells(row, &extra_columns))?;
    }
    writer.flush()?;
    info!(
        "Wrote {} detected variants to variant summary file",
        rows.len().separate_with_commas()
    );
    Ok(())
}

fn variant_summary_header(extra_columns: &[String]) -> Vec<String> {
    std::iter::once("sample_id")
        .chain(MANIFEST_COLUMNS.iter().copied())
        .chain(VARIANT_LEAD_FIELDS.iter().map(|x| x.name()))
        .map(|x| x.to_string())
        .chain(extra_columns.iter().cloned())
        .chain(VARIANT_TRAIL_FIELDS.iter().map(|x| x.name().to_string()))
        .collect()
}

fn variant_summary_cells(row: &VariantSummaryRow, extra_columns: &[String]) -> Vec<String> {
    let record = &row.record;
    let mut cells = vec![record.sample_id.clone()];
    cells.extend(manifest_cells(row.mapping.as_ref()));
    cells.extend(VARIANT_LEAD_FIELDS.iter().map(|&x| call_field_cell(record, x)));
    cells.extend(extra_field_cells(record, extra_columns));
    cells.extend(VARIANT_TRAIL_FIELDS.iter().map(|&x| call_field_cell(record, x)));
    cells
}
