//! Left join of tumor calls to comparator calls on the variant key
//!

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::Serialize;

use crate::call_record::{CallRecord, ComparatorCallRecord, MutationCallRecord, VariantKey};
use crate::errors::{Result, ReviewError};

/// How to resolve a variant key found on more than one comparator row
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, clap::ValueEnum, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DuplicateKeyPolicy {
    /// Stop with a data integrity error
    #[default]
    Fail,

    /// Use the first comparator row in input order
    First,
}

/// One tumor call with its matching comparator call, if any
#[derive(Clone, Debug, PartialEq)]
pub struct JoinedObservation {
    pub tumor: MutationCallRecord,
    pub comparator: Option<ComparatorCallRecord>,
}

impl JoinedObservation {
    pub fn key(&self) -> VariantKey {
        self.tumor.key()
    }

    pub fn has_comparator(&self) -> bool {
        self.comparator.is_some()
    }
}

/// Check that no variant key occurs more than once in `records`
///
/// # Arguments
/// * `dataset` - Dataset description used in the error message
///
pub fn check_unique_keys(records: &[CallRecord], dataset: &str) -> Result<()> {
    let mut keys = HashSet::new();
    for record in records {
        let key = record.key();
        if keys.contains(&key) {
            return Err(ReviewError::DuplicateKey {
                dataset: dataset.to_string(),
                key: key.to_string(),
            });
        }
        keys.insert(key);
    }
    Ok(())
}

/// Tumor calls eligible for comparator confirmation: detected calls in the allowed genes
pub fn select_confirmation_candidates(
    tumor: &[MutationCallRecord],
    confirmation_genes: &[String],
) -> Vec<MutationCallRecord> {
    tumor
        .iter()
        .filter(|x| x.call.is_detected() && confirmation_genes.contains(&x.gene_name))
        .cloned()
        .collect()
}

/// Comparator calls in the allowed genes, regardless of call value
pub fn restrict_to_genes(
    comparator: &[ComparatorCallRecord],
    confirmation_genes: &[String],
) -> Vec<ComparatorCallRecord> {
    comparator
        .iter()
        .filter(|x| confirmation_genes.contains(&x.gene_name))
        .cloned()
        .collect()
}

/// Build the comparator lookup, applying the duplicate key policy
fn index_comparator_records(
    comparator: &[ComparatorCallRecord],
    policy: DuplicateKeyPolicy,
) -> Result<HashMap<VariantKey, &ComparatorCallRecord>> {
    let mut index = HashMap::new();
    let mut reported_keys = HashSet::new();
    for record in comparator {
        let key = record.key();
        if index.contains_key(&key) {
            match policy {
                DuplicateKeyPolicy::Fail => {
                    return Err(ReviewError::DuplicateKey {
                        dataset: "comparator".to_string(),
                        key: key.to_string(),
                    });
                }
                DuplicateKeyPolicy::First => {
                    if reported_keys.insert(key.clone()) {
                        warn!(
                            "Variant key '{key}' occurs more than once in comparator data, using the first occurrence"
                        );
                    }
                }
            }
        } else {
            index.insert(key, record);
        }
    }
    Ok(index)
}

/// Left join tumor calls to comparator calls on (sample, cds change, aa change)
///
/// The output holds exactly one observation per tumor record, in tumor input order.
///
/// A comparator match reporting a different gene than the tumor call is a data integrity error.
///
pub fn join_comparator_calls(
    tumor: &[MutationCallRecord],
    comparator: &[ComparatorCallRecord],
    policy: DuplicateKeyPolicy,
) -> Result<Vec<JoinedObservation>> {
    let comparator_index = index_comparator_records(comparator, policy)?;

    let mut joined = Vec::with_capacity(tumor.len());
    for record in tumor {
        let matched = comparator_index.get(&record.key()).copied();
        if let Some(matched) = matched {
            if matched.gene_name != record.gene_name {
                return Err(ReviewError::DataIntegrity(format!(
                    "variant '{}' is annotated to gene '{}' in tumor data and gene '{}' in comparator data",
                    record.key(),
                    record.gene_name,
                    matched.gene_name
                )));
            }
        }
        joined.push(JoinedObservation {
            tumor: record.clone(),
            comparator: matched.cloned(),
        });
    }
    Ok(joined)
}
