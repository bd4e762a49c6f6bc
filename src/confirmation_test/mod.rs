//! Statistical confirmation of tumor mutant calls against the comparator assay
//!
//! Each joined observation is reduced to a 2x2 molecule table:
//!
//! ```text
//!             mutant      reference
//! tumor       a           b
//! comparator  c           d
//! ```
//!
//! The one-sided exact test is the test of record used by the revision policy. The pooled
//! proportions z-test and the chi-squared test are auxiliary, and only computed on request.
//!

mod chi_squared;
mod exact;
mod proportions;

pub use chi_squared::{ChiSquaredTestResult, chi_squared_test};
pub use exact::{ExactTestResult, fisher_exact_greater};
pub use proportions::{ProportionsTestResult, proportions_ztest_larger};

use serde::Serialize;

use crate::call_record::VariantKey;
use crate::errors::{Result, ReviewError};
use crate::molecule_counts::DerivedCounts;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ContingencyTable {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl ContingencyTable {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn from_counts(counts: &DerivedCounts) -> Self {
        Self::new(
            counts.mutant_molecules_tumor,
            counts.reference_molecules_tumor,
            counts.mutant_molecules_comparator,
            counts.reference_molecules_comparator,
        )
    }

    /// Add the same continuity correction to every cell
    pub fn with_pseudocount(&self, pseudocount: f64) -> Self {
        Self::new(
            self.a + pseudocount,
            self.b + pseudocount,
            self.c + pseudocount,
            self.d + pseudocount,
        )
    }

    /// Cells truncated toward zero to whole molecule counts
    pub fn whole_counts(&self) -> [u64; 4] {
        [self.a, self.b, self.c, self.d].map(|x| x.trunc() as u64)
    }

    pub fn tumor_total(&self) -> f64 {
        self.a + self.b
    }

    pub fn comparator_total(&self) -> f64 {
        self.c + self.d
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfirmationTestSettings {
    /// Continuity correction added to each cell before the exact test
    pub exact_test_pseudocount: f64,

    /// Compute the z-test and chi-squared test in addition to the exact test
    pub auxiliary_tests: bool,

    pub proportions_pseudocount: f64,
    pub chi_squared_pseudocount: f64,
    pub yates_correction: bool,
}

impl Default for ConfirmationTestSettings {
    fn default() -> Self {
        Self {
            exact_test_pseudocount: 0.1,
            auxiliary_tests: false,
            proportions_pseudocount: 0.0,
            chi_squared_pseudocount: 0.0,
            yates_correction: false,
        }
    }
}

/// All test output for one joined observation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfirmationResult {
    pub counts: DerivedCounts,
    pub exact: ExactTestResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proportions: Option<ProportionsTestResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chi_squared: Option<ChiSquaredTestResult>,
}

fn check_p_value(key: &VariantKey, test_name: &str, p_value: f64) -> Result<()> {
    if p_value.is_finite() {
        Ok(())
    } else {
        Err(ReviewError::arithmetic(
            key,
            format!("{test_name} p-value is not finite ({p_value})"),
        ))
    }
}

/// Run the exact test, and the auxiliary tests if enabled, on one observation's molecule counts
///
/// # Arguments
/// * `key` - Variant key of the observation, used to label any arithmetic error
///
pub fn run_confirmation_tests(
    key: &VariantKey,
    counts: &DerivedCounts,
    settings: &ConfirmationTestSettings,
) -> Result<ConfirmationResult> {
    let table = ContingencyTable::from_counts(counts);

    let exact = fisher_exact_greater(&table.with_pseudocount(settings.exact_test_pseudocount));
    check_p_value(key, "exact test", exact.p_value)?;

    let (proportions, chi_squared) = if settings.auxiliary_tests {
        let proportions = proportions_ztest_larger(
            &table.with_pseudocount(settings.proportions_pseudocount),
        )
        .map_err(|detail| ReviewError::arithmetic(key, detail))?;
        check_p_value(key, "proportions z-test", proportions.p_value)?;

        let chi_squared = chi_squared_test(
            &table.with_pseudocount(settings.chi_squared_pseudocount),
            settings.yates_correction,
        )
        .map_err(|detail| ReviewError::arithmetic(key, detail))?;
        check_p_value(key, "chi-squared test", chi_squared.p_value)?;

        (Some(proportions), Some(chi_squared))
    } else {
        (None, None)
    };

    Ok(ConfirmationResult {
        counts: *counts,
        exact,
        proportions,
        chi_squared,
    })
}
