//! Detected-variant listing of reviewed calls, joined to the sample manifest
//!

use itertools::Itertools;
use log::warn;

use crate::call_record::CallRecord;
use crate::sample_manifest::{SampleManifest, SampleMapping};

/// One detected variant with its sample's manifest entry, if any
#[derive(Clone, Debug, PartialEq)]
pub struct VariantSummaryRow {
    pub mapping: Option<SampleMapping>,
    pub record: CallRecord,
}

/// List every detected (MD) call in input order, with the sample's external identifiers
///
/// Every detected call is reported, including calls of samples absent from the manifest.
///
pub fn summarize_variants(
    records: &[CallRecord],
    manifest: Option<&SampleManifest>,
) -> Vec<VariantSummaryRow> {
    let rows = records
        .iter()
        .filter(|x| x.call.is_detected())
        .map(|record| VariantSummaryRow {
            mapping: manifest.and_then(|x| x.get(&record.sample_id)).cloned(),
            record: record.clone(),
        })
        .collect::<Vec<_>>();

    if manifest.is_some() {
        let unlisted = rows
            .iter()
            .filter(|x| x.mapping.is_none())
            .map(|x| x.record.sample_id.as_str())
            .unique()
            .collect::<Vec<_>>();
        if !unlisted.is_empty() {
            warn!(
                "{} samples with detected variants are missing from the sample manifest: {}",
                unlisted.len(),
                unlisted.join(", ")
            );
        }
    }

    rows
}
