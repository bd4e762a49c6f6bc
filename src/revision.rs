//! Revision of tumor mutant calls which the comparator assay fails to support
//!

use serde::Serialize;

use crate::call_record::{Call, MutationCallRecord, VariantKey};
use crate::confirmation_test::{ConfirmationResult, ExactTestResult};

pub const DEFAULT_REVISION_COMMENT: &str =
    " BC experiment did not support this mutant being detected";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RevisionPolicy {
    /// Exact test p-values above this level do not support the tumor call
    pub max_p_value: f64,

    /// Odds ratios below this level do not support the tumor call
    pub min_odds_ratio: f64,

    /// Text appended to the internal comment of every revised call
    pub comment_suffix: String,
}

impl Default for RevisionPolicy {
    fn default() -> Self {
        Self {
            max_p_value: 0.01,
            min_odds_ratio: 2.0,
            comment_suffix: DEFAULT_REVISION_COMMENT.to_string(),
        }
    }
}

impl RevisionPolicy {
    /// True if the exact test result fails to support a detected mutation
    ///
    /// An undefined odds ratio never fails the odds ratio threshold by itself.
    ///
    pub fn is_unsupported(&self, exact: &ExactTestResult) -> bool {
        exact.p_value > self.max_p_value || exact.odds_ratio < self.min_odds_ratio
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RevisionOutcome {
    pub changed: bool,
    pub call: Call,
    pub comment_internal: Option<String>,
}

/// Decide the revised call and internal comment for one tested record
///
/// Only a detected call can change, so revising a call twice has no further effect.
///
pub fn revise_call(
    record: &MutationCallRecord,
    exact: &ExactTestResult,
    policy: &RevisionPolicy,
) -> RevisionOutcome {
    if record.call.is_detected() && policy.is_unsupported(exact) {
        let comment = record.comment_internal.as_deref().unwrap_or_default();
        RevisionOutcome {
            changed: true,
            call: Call::NotDetected,
            comment_internal: Some(format!("{comment}{}", policy.comment_suffix)),
        }
    } else {
        RevisionOutcome {
            changed: false,
            call: record.call.clone(),
            comment_internal: record.comment_internal.clone(),
        }
    }
}

/// A tumor record with comparator test results
#[derive(Clone, Debug, PartialEq)]
pub struct TestedObservation {
    pub record: MutationCallRecord,
    pub result: ConfirmationResult,
}

/// Record of one call changed by the revision policy
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RevisionAuditEntry {
    pub key: VariantKey,

    /// Tumor record before revision
    pub original: MutationCallRecord,

    pub result: ConfirmationResult,
}

/// Updated records with their revision flags, plus the audit list of changed calls
pub struct RevisionSummary {
    pub records: Vec<MutationCallRecord>,
    pub changed: Vec<bool>,
    pub audit: Vec<RevisionAuditEntry>,
}

/// Apply the revision policy to every tested observation, in input order
///
/// Input records are not modified, the returned records are updated copies.
///
pub fn apply_revision_policy(
    tested: &[TestedObservation],
    policy: &RevisionPolicy,
) -> RevisionSummary {
    let mut records = Vec::with_capacity(tested.len());
    let mut changed = Vec::with_capacity(tested.len());
    let mut audit = Vec::new();
    for obs in tested {
        let outcome = revise_call(&obs.record, &obs.result.exact, policy);
        let mut record = obs.record.clone();
        if outcome.changed {
            audit.push(RevisionAuditEntry {
                key: obs.record.key(),
                original: obs.record.clone(),
                result: obs.result.clone(),
            });
            record.call = outcome.call;
            record.comment_internal = outcome.comment_internal;
        }
        records.push(record);
        changed.push(outcome.changed);
    }
    RevisionSummary {
        records,
        changed,
        audit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_record::CallRecord;
    use crate::confirmation_test::{ConfirmationTestSettings, run_confirmation_tests};
    use crate::molecule_counts::derive_counts;

    fn exact(p_value: f64, odds_ratio: f64) -> ExactTestResult {
        ExactTestResult {
            p_value,
            odds_ratio,
        }
    }

    fn md_record() -> CallRecord {
        CallRecord::new_test_record("S1", "KRAS", "c.35G>A", "p.G12D", Call::MutationDetected)
    }

    #[test]
    fn test_revise_call_thresholds() {
        let policy = RevisionPolicy::default();
        let record = md_record();

        assert!(!revise_call(&record, &exact(0.001, 5.0), &policy).changed);
        assert!(!revise_call(&record, &exact(0.01, 2.0), &policy).changed);
        assert!(revise_call(&record, &exact(0.02, 5.0), &policy).changed);
        assert!(revise_call(&record, &exact(0.001, 1.5), &policy).changed);
        assert!(!revise_call(&record, &exact(0.001, f64::INFINITY), &policy).changed);
        assert!(revise_call(&record, &exact(1.0, f64::NAN), &policy).changed);
    }

    #[test]
    fn test_undefined_odds_ratio_alone_keeps_call() {
        let policy = RevisionPolicy::default();
        let record = md_record();

        // NaN compares false against the odds ratio threshold, so only the p-value can revise
        assert!(!policy.is_unsupported(&exact(0.001, f64::NAN)));
        assert!(!revise_call(&record, &exact(0.001, f64::NAN), &policy).changed);
        assert!(policy.is_unsupported(&exact(1.0, f64::NAN)));
    }

    #[test]
    fn test_revise_call_comment() {
        let policy = RevisionPolicy::default();
        let mut record = md_record();
        let outcome = revise_call(&record, &exact(0.5, 1.0), &policy);
        assert_eq!(outcome.call, Call::NotDetected);
        assert_eq!(
            outcome.comment_internal.as_deref(),
            Some(" BC experiment did not support this mutant being detected")
        );

        record.comment_internal = Some("low GE".to_string());
        let outcome = revise_call(&record, &exact(0.5, 1.0), &policy);
        assert_eq!(
            outcome.comment_internal.as_deref(),
            Some("low GE BC experiment did not support this mutant being detected")
        );
    }

    #[test]
    fn test_revise_call_idempotent() {
        let policy = RevisionPolicy::default();
        let record = md_record();
        let test = exact(0.5, 1.0);
        let first = revise_call(&record, &test, &policy);

        let mut revised = record.clone();
        revised.call = first.call.clone();
        revised.comment_internal = first.comment_internal.clone();

        let second = revise_call(&revised, &test, &policy);
        assert!(!second.changed);
        assert_eq!(second.call, first.call);
        assert_eq!(second.comment_internal, first.comment_internal);
    }

    #[test]
    fn test_revision_never_promotes() {
        let policy = RevisionPolicy::default();
        for call in [Call::NotDetected, Call::Other("LowGE".to_string())] {
            let mut record = md_record();
            record.call = call.clone();
            for test in [exact(0.5, 1.0), exact(1e-6, 100.0)] {
                let outcome = revise_call(&record, &test, &policy);
                assert!(!outcome.changed);
                assert_eq!(outcome.call, call);
            }
        }
    }

    #[test]
    fn test_apply_revision_policy_unsupported_mutant() {
        // Equal mutant fractions in tumor and comparator: (1,9) vs (1,9)
        let tumor = md_record().with_counts(10.0, 1.0, 10.0);
        let comparator = md_record().with_counts(10.0, 1.0, 10.0);
        let counts = derive_counts(&tumor, &comparator).unwrap();
        let result =
            run_confirmation_tests(&tumor.key(), &counts, &ConfirmationTestSettings::default())
                .unwrap();
        assert!(result.exact.p_value > 0.01);

        let tested = vec![TestedObservation {
            record: tumor.clone(),
            result,
        }];
        let summary = apply_revision_policy(&tested, &RevisionPolicy::default());
        assert_eq!(summary.changed, vec![true]);
        assert_eq!(summary.records[0].call, Call::NotDetected);
        assert!(
            summary.records[0]
                .comment_internal
                .as_deref()
                .unwrap()
                .ends_with(DEFAULT_REVISION_COMMENT)
        );
        assert_eq!(summary.audit.len(), 1);
        assert_eq!(summary.audit[0].original, tumor);

        // Input is left untouched
        assert_eq!(tested[0].record.call, Call::MutationDetected);
    }

    #[test]
    fn test_apply_revision_policy_supported_mutant() {
        // Tumor (10,0) vs comparator (0,10)
        let tumor = md_record().with_counts(10.0, 10.0, 10.0);
        let comparator = md_record().with_counts(10.0, 0.0, 10.0);
        let counts = derive_counts(&tumor, &comparator).unwrap();
        let result =
            run_confirmation_tests(&tumor.key(), &counts, &ConfirmationTestSettings::default())
                .unwrap();
        assert!(result.exact.p_value < 0.01);
        assert!(result.exact.odds_ratio > 1.0);

        let tested = vec![TestedObservation {
            record: tumor.clone(),
            result,
        }];
        let summary = apply_revision_policy(&tested, &RevisionPolicy::default());
        assert_eq!(summary.changed, vec![false]);
        assert_eq!(summary.records[0], tumor);
        assert!(summary.audit.is_empty());
    }
}
