//! Per-sample run metadata from the run summary sheet, stamped onto tumor call records
//!

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::{debug, info, warn};
use thousands::Separable;

use crate::call_record::CallRecord;
use crate::errors::{Result, ReviewError};
use crate::raw_table::RawTable;

/// Column holding the sequencing flow cell identifier on annotated call records
pub const FLOWCELL_ID_COLUMN: &str = "FlowCellID";

const SAMPLE_ID_HEADERS: &[&str] = &["Sample_ID", "Sample ID", "SampleId", "SampleID"];

/// Row number column of the run summary sheet, never carried onto call records
const ROW_NUMBER_HEADER: &str = "#";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Metadata column names, in input order
    pub columns: Vec<String>,

    /// Metadata values for each sample identifier, aligned with `columns`
    samples: HashMap<String, Vec<String>>,
}

impl RunSummary {
    pub fn get(&self, sample_id: &str) -> Option<&[String]> {
        self.samples.get(sample_id).map(|x| x.as_slice())
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// Build per-sample run metadata from the run summary table
///
/// Rows with any blank cell are skipped, which removes the spreadsheet's total and note lines
/// along with incomplete sample entries. A sample identifier found on more than one complete row
/// is a duplicate key error.
///
pub fn build_run_summary(table: &RawTable) -> Result<RunSummary> {
    let sample_index = table
        .columns
        .iter()
        .position(|x| SAMPLE_ID_HEADERS.contains(&x.as_str()))
        .ok_or_else(|| {
            ReviewError::schema(
                SAMPLE_ID_HEADERS[0],
                format!(
                    "no sample identifier column found in run summary, expected one of: {}",
                    SAMPLE_ID_HEADERS.join(", ")
                ),
            )
        })?;

    let metadata_indices = table
        .columns
        .iter()
        .enumerate()
        .filter(|&(index, name)| {
            index != sample_index && !name.is_empty() && name != ROW_NUMBER_HEADER
        })
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let mut samples = HashMap::new();
    let mut skipped_row_count = 0;
    for row in table.rows.iter() {
        let sample_id = &row[sample_index];
        let is_complete = std::iter::once(&sample_index)
            .chain(metadata_indices.iter())
            .all(|&index| !row[index].is_empty());
        if !is_complete {
            debug!("Skipping incomplete run summary row for sample '{sample_id}'");
            skipped_row_count += 1;
            continue;
        }

        let values = metadata_indices
            .iter()
            .map(|&index| row[index].clone())
            .collect::<Vec<_>>();
        if samples.insert(sample_id.clone(), values).is_some() {
            return Err(ReviewError::DuplicateKey {
                dataset: "run summary".to_string(),
                key: sample_id.clone(),
            });
        }
    }

    if skipped_row_count > 0 {
        info!(
            "Skipped {} incomplete run summary rows",
            skipped_row_count.separate_with_commas()
        );
    }

    Ok(RunSummary {
        columns: metadata_indices
            .iter()
            .map(|&index| table.columns[index].clone())
            .collect(),
        samples,
    })
}

/// Stamp each record with the flow cell identifier and its sample's run summary values
///
/// Records of samples missing from the run summary get blank run summary values, so that every
/// record carries the same metadata columns.
///
pub fn annotate_run_metadata(
    records: &mut [CallRecord],
    flowcell_id: Option<&str>,
    run_summary: Option<&RunSummary>,
) {
    if let Some(flowcell_id) = flowcell_id {
        for record in records.iter_mut() {
            record.set_extra_field(FLOWCELL_ID_COLUMN, flowcell_id);
        }
    }

    let Some(run_summary) = run_summary else {
        return;
    };

    let mut missing_samples = HashSet::new();
    for record in records.iter_mut() {
        let values = run_summary.get(&record.sample_id);
        if values.is_none() {
            missing_samples.insert(record.sample_id.clone());
        }
        for (index, column) in run_summary.columns.iter().enumerate() {
            let value = values.map(|x| x[index].as_str()).unwrap_or_default();
            record.set_extra_field(column, value);
        }
    }

    if !missing_samples.is_empty() {
        warn!(
            "{} called samples are missing from the run summary: {}",
            missing_samples.len(),
            missing_samples.iter().sorted().join(", ")
        );
    }
}
