//! End-to-end comparator review of one run's tumor calls
//!

use std::collections::HashMap;
use std::sync::mpsc::channel;

use log::info;
use serde::Serialize;
use thousands::Separable;

use crate::call_record::{ComparatorCallRecord, MutationCallRecord, VariantKey};
use crate::confirmation_test::{ConfirmationResult, ConfirmationTestSettings, run_confirmation_tests};
use crate::errors::Result;
use crate::join::{
    DuplicateKeyPolicy, JoinedObservation, check_unique_keys, join_comparator_calls,
    restrict_to_genes, select_confirmation_candidates,
};
use crate::molecule_counts::derive_counts;
use crate::partition::{
    ComparatorReview, PartitionedResults, ReviewedObservation, partition_results,
};
use crate::revision::{RevisionAuditEntry, RevisionPolicy, TestedObservation, apply_revision_policy};

pub const DEFAULT_CONFIRMATION_GENES: [&str; 2] = ["TP53", "KRAS"];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewConfig {
    /// Genes for which tumor calls are checked against the comparator assay
    pub confirmation_genes: Vec<String>,

    pub test_settings: ConfirmationTestSettings,
    pub revision_policy: RevisionPolicy,
    pub duplicate_policy: DuplicateKeyPolicy,
    pub thread_count: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            confirmation_genes: DEFAULT_CONFIRMATION_GENES
                .iter()
                .map(|x| x.to_string())
                .collect(),
            test_settings: ConfirmationTestSettings::default(),
            revision_policy: RevisionPolicy::default(),
            duplicate_policy: DuplicateKeyPolicy::default(),
            thread_count: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReviewOutput {
    /// Copy of the full tumor input with revised calls replaced
    pub reviewed_calls: Vec<MutationCallRecord>,

    pub with_comparator_support: Vec<ComparatorReview>,
    pub flagged_for_revision: Vec<ComparatorReview>,
    pub without_comparator_data: Vec<MutationCallRecord>,
    pub revision_audit: Vec<RevisionAuditEntry>,
}

/// Derive molecule counts and run confirmation tests for every joined observation with a
/// comparator match
///
/// Tests run on a dedicated worker pool. Results are returned in input order, with `None` for
/// observations lacking a comparator match. If any observation fails, the error from the
/// earliest failing observation in input order is returned.
///
fn test_joined_observations(
    joined: &[JoinedObservation],
    settings: &ConfirmationTestSettings,
    thread_count: usize,
) -> Result<Vec<Option<ConfirmationResult>>> {
    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()?;

    let (tx, rx) = channel();
    worker_pool.scope(move |scope| {
        for (index, obs) in joined.iter().enumerate() {
            let Some(comparator) = obs.comparator.as_ref() else {
                continue;
            };
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = derive_counts(&obs.tumor, comparator)
                    .and_then(|counts| run_confirmation_tests(&obs.key(), &counts, settings));
                tx.send((index, result)).unwrap();
            });
        }
    });

    let mut results = (0..joined.len()).map(|_| None).collect::<Vec<_>>();
    for (index, result) in rx {
        results[index] = Some(result);
    }

    results.into_iter().map(|x| x.transpose()).collect()
}

/// Review tumor mutant calls against comparator assay calls
///
/// Without comparator data no call can be confirmed or revised, so the reviewed dataset is a
/// copy of the tumor input and every view is empty.
///
pub fn run_review(
    tumor: &[MutationCallRecord],
    comparator: Option<&[ComparatorCallRecord]>,
    config: &ReviewConfig,
) -> Result<ReviewOutput> {
    check_unique_keys(tumor, "tumor")?;

    let Some(comparator) = comparator else {
        info!("No comparator data provided, skipping call review");
        return Ok(ReviewOutput {
            reviewed_calls: tumor.to_vec(),
            ..Default::default()
        });
    };

    let candidates = select_confirmation_candidates(tumor, &config.confirmation_genes);
    let comparator = restrict_to_genes(comparator, &config.confirmation_genes);
    info!(
        "Selected {} detected tumor calls and {} comparator calls in confirmation genes: {}",
        candidates.len().separate_with_commas(),
        comparator.len().separate_with_commas(),
        config.confirmation_genes.join(",")
    );

    let joined = join_comparator_calls(&candidates, &comparator, config.duplicate_policy)?;
    let results =
        test_joined_observations(&joined, &config.test_settings, config.thread_count)?;

    let (tested_index, (tested, tested_comparators)): (Vec<_>, (Vec<_>, Vec<_>)) = joined
        .iter()
        .zip(results)
        .enumerate()
        .filter_map(|(index, (obs, result))| {
            let comparator = obs.comparator.clone()?;
            result.map(|result| {
                let tested = TestedObservation {
                    record: obs.tumor.clone(),
                    result,
                };
                (index, (tested, comparator))
            })
        })
        .unzip();
    info!(
        "Tested {} tumor calls with comparator data",
        tested.len().separate_with_commas()
    );

    let revision = apply_revision_policy(&tested, &config.revision_policy);
    info!(
        "Revised {} tumor calls to not detected",
        revision.audit.len().separate_with_commas()
    );

    let mut observations = joined
        .into_iter()
        .map(|obs| ReviewedObservation::NoComparator(obs.tumor))
        .collect::<Vec<_>>();
    let revised_calls = revision
        .records
        .into_iter()
        .zip(revision.changed)
        .zip(tested)
        .zip(tested_comparators);
    for (index, (((record, revised), obs), comparator)) in tested_index.into_iter().zip(revised_calls)
    {
        observations[index] = ReviewedObservation::Tested(ComparatorReview {
            record,
            comparator,
            result: obs.result,
            revised,
        });
    }

    let PartitionedResults {
        with_comparator_support,
        flagged_for_revision,
        without_comparator_data,
    } = partition_results(observations);

    let replacements = flagged_for_revision
        .iter()
        .map(|x| (x.record.key(), &x.record))
        .collect::<HashMap<VariantKey, _>>();
    let reviewed_calls = tumor
        .iter()
        .map(|x| match replacements.get(&x.key()) {
            Some(&revised) => revised.clone(),
            None => x.clone(),
        })
        .collect();

    Ok(ReviewOutput {
        reviewed_calls,
        with_comparator_support,
        flagged_for_revision,
        without_comparator_data,
        revision_audit: revision.audit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_record::{Call, CallRecord};
    use crate::errors::ReviewError;

    fn rec(sample_id: &str, gene: &str, cds: &str, call: Call) -> CallRecord {
        CallRecord::new_test_record(sample_id, gene, cds, "p.X", call)
    }

    fn config() -> ReviewConfig {
        ReviewConfig {
            thread_count: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_review() {
        let tumor = vec![
            // Supported by comparator: (10,0) vs (0,10)
            rec("S1", "KRAS", "c.1", Call::MutationDetected).with_counts(10.0, 10.0, 10.0),
            // Not supported by comparator: (1,9) vs (1,9)
            rec("S1", "TP53", "c.2", Call::MutationDetected).with_counts(10.0, 1.0, 10.0),
            // No comparator match
            rec("S2", "KRAS", "c.1", Call::MutationDetected).with_counts(10.0, 5.0, 10.0),
            // Not a confirmation candidate
            rec("S2", "TP53", "c.3", Call::NotDetected),
            rec("S2", "PIK3CA", "c.4", Call::MutationDetected),
        ];
        let comparator = vec![
            rec("S1", "KRAS", "c.1", Call::NotDetected).with_counts(10.0, 0.0, 10.0),
            rec("S1", "TP53", "c.2", Call::MutationDetected).with_counts(10.0, 1.0, 10.0),
            rec("S2", "PIK3CA", "c.4", Call::MutationDetected).with_counts(10.0, 1.0, 10.0),
        ];

        let output = run_review(&tumor, Some(&comparator), &config()).unwrap();

        assert_eq!(output.reviewed_calls.len(), tumor.len());
        assert_eq!(output.reviewed_calls[0], tumor[0]);
        assert_eq!(output.reviewed_calls[1].call, Call::NotDetected);
        assert_eq!(
            output.reviewed_calls[1].comment_internal.as_deref(),
            Some(" BC experiment did not support this mutant being detected")
        );
        assert_eq!(&output.reviewed_calls[2..], &tumor[2..]);

        assert_eq!(output.with_comparator_support.len(), 2);
        assert_eq!(output.flagged_for_revision.len(), 1);
        assert_eq!(output.flagged_for_revision[0].record.cds_change, "c.2");

        // Each view keeps the matched comparator call alongside the tumor call
        let supported = &output.with_comparator_support[0];
        assert_eq!(supported.comparator, comparator[0]);
        assert_eq!(supported.comparator.supermutants, Some(0.0));
        assert_eq!(supported.comparator.call, Call::NotDetected);
        assert_eq!(output.flagged_for_revision[0].comparator, comparator[1]);
        assert_eq!(output.without_comparator_data, vec![tumor[2].clone()]);

        assert_eq!(output.revision_audit.len(), 1);
        assert_eq!(output.revision_audit[0].original, tumor[1]);

        // Every candidate lands in exactly one of the two top-level views
        assert_eq!(
            output.with_comparator_support.len() + output.without_comparator_data.len(),
            3
        );
    }

    #[test]
    fn test_run_review_without_comparator() {
        let tumor = vec![rec("S1", "KRAS", "c.1", Call::MutationDetected)];
        let output = run_review(&tumor, None, &config()).unwrap();
        assert_eq!(output.reviewed_calls, tumor);
        assert!(output.with_comparator_support.is_empty());
        assert!(output.flagged_for_revision.is_empty());
        assert!(output.without_comparator_data.is_empty());
        assert!(output.revision_audit.is_empty());
    }

    #[test]
    fn test_run_review_unmatched_call_untouched() {
        let tumor = vec![rec("S1", "KRAS", "c.1", Call::MutationDetected)];
        let comparator = vec![rec("S9", "KRAS", "c.1", Call::MutationDetected)];
        let output = run_review(&tumor, Some(&comparator), &config()).unwrap();
        assert_eq!(output.reviewed_calls, tumor);
        assert_eq!(output.without_comparator_data, tumor);
        assert!(output.with_comparator_support.is_empty());
    }

    #[test]
    fn test_run_review_first_error_in_input_order() {
        let tumor = vec![
            rec("S1", "KRAS", "c.1", Call::MutationDetected).with_counts(10.0, 1.0, 10.0),
            rec("S1", "KRAS", "c.2", Call::MutationDetected).with_counts(0.0, 0.0, 10.0),
            rec("S1", "KRAS", "c.3", Call::MutationDetected).with_counts(-1.0, 0.0, 10.0),
        ];
        let comparator = tumor
            .iter()
            .map(|x| rec(&x.sample_id, "KRAS", &x.cds_change, Call::NotDetected).with_counts(10.0, 0.0, 10.0))
            .collect::<Vec<_>>();
        let result = run_review(&tumor, Some(&comparator), &config());
        assert!(matches!(
            result,
            Err(ReviewError::Arithmetic { key, .. }) if key == "S1_c.2_p.X"
        ));
    }

    #[test]
    fn test_run_review_duplicate_tumor_key() {
        let tumor = vec![
            rec("S1", "KRAS", "c.1", Call::MutationDetected),
            rec("S1", "KRAS", "c.1", Call::NotDetected),
        ];
        let result = run_review(&tumor, None, &config());
        assert!(matches!(result, Err(ReviewError::DuplicateKey { .. })));
    }
}
