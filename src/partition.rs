//! Partition of reviewed tumor calls into report views
//!

use serde::Serialize;

use crate::call_record::{ComparatorCallRecord, MutationCallRecord};
use crate::confirmation_test::ConfirmationResult;

/// A tumor call tested against its comparator match, after revision
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparatorReview {
    pub record: MutationCallRecord,

    /// The matched comparator call, with the raw counts behind the comparator side of the test
    pub comparator: ComparatorCallRecord,

    pub result: ConfirmationResult,

    /// True if the revision policy changed this call
    pub revised: bool,
}

/// One reviewed tumor call from the confirmation candidate set
#[derive(Clone, Debug, PartialEq)]
pub enum ReviewedObservation {
    Tested(ComparatorReview),
    NoComparator(MutationCallRecord),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartitionedResults {
    /// Calls with a comparator match, whatever the test outcome
    pub with_comparator_support: Vec<ComparatorReview>,

    /// Calls with a comparator match which were revised to not detected
    pub flagged_for_revision: Vec<ComparatorReview>,

    /// Calls without a comparator match, unchanged
    pub without_comparator_data: Vec<MutationCallRecord>,
}

/// Split reviewed observations into the three report views, preserving input order
pub fn partition_results(observations: Vec<ReviewedObservation>) -> PartitionedResults {
    let mut results = PartitionedResults::default();
    for obs in observations {
        match obs {
            ReviewedObservation::Tested(x) => {
                if x.revised {
                    results.flagged_for_revision.push(x.clone());
                }
                results.with_comparator_support.push(x);
            }
            ReviewedObservation::NoComparator(x) => {
                results.without_comparator_data.push(x);
            }
        }
    }
    results
}
