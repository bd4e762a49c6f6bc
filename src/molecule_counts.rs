//! Mutant and reference molecule estimates from raw instrument counts
//!
//! Supermutant counts are scaled into genome-equivalent space by the fraction of UIDs per
//! amplicon they represent:
//!
//! ```text
//! mutant    = supermutants * GE / uids_per_amplicon
//! reference = (uids_per_amplicon - supermutants) * GE / uids_per_amplicon
//! ```
//!

use serde::Serialize;

use crate::call_record::{CallRecord, ComparatorCallRecord, MutationCallRecord};
use crate::errors::{Result, ReviewError};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MoleculeCounts {
    pub mutant: f64,
    pub reference: f64,
}

/// Molecule estimates for both assays of one joined observation
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DerivedCounts {
    pub mutant_molecules_tumor: f64,
    pub reference_molecules_tumor: f64,
    pub mutant_molecules_comparator: f64,
    pub reference_molecules_comparator: f64,
}

fn required_count(value: Option<f64>, field: &str, record: &CallRecord, side: &str) -> Result<f64> {
    value.ok_or_else(|| {
        ReviewError::schema(
            field,
            format!("missing on {side} record for variant '{}'", record.key()),
        )
    })
}

/// Estimate mutant and reference molecules for one call record
///
/// # Arguments
/// * `side` - Assay label ("tumor" or "comparator") used in error messages
///
pub fn estimate_molecule_counts(record: &CallRecord, side: &str) -> Result<MoleculeCounts> {
    let uids = required_count(record.uids_per_amplicon, "uids_per_amplicon", record, side)?;
    let supermutants = required_count(record.supermutants, "supermutants", record, side)?;
    let ge = required_count(record.genome_equivalents, "genome_equivalents", record, side)?;

    let fail = |detail: String| ReviewError::arithmetic(record.key(), format!("{side} {detail}"));

    if !(uids > 0.0) {
        return Err(fail(format!(
            "UIDs per amplicon must be positive, found {uids}"
        )));
    }
    if supermutants < 0.0 || ge < 0.0 {
        return Err(fail(format!(
            "negative raw count (supermutants: {supermutants}, GE: {ge})"
        )));
    }
    if supermutants > uids {
        return Err(fail(format!(
            "supermutant count {supermutants} exceeds UIDs per amplicon {uids}"
        )));
    }

    let mutant = supermutants * ge / uids;
    let reference = (uids - supermutants) * ge / uids;
    if !(mutant.is_finite() && reference.is_finite()) {
        return Err(fail("molecule estimate is not finite".to_string()));
    }

    Ok(MoleculeCounts { mutant, reference })
}

/// Estimate molecule counts for a tumor call and its matching comparator call
pub fn derive_counts(
    tumor: &MutationCallRecord,
    comparator: &ComparatorCallRecord,
) -> Result<DerivedCounts> {
    let t = estimate_molecule_counts(tumor, "tumor")?;
    let c = estimate_molecule_counts(comparator, "comparator")?;
    Ok(DerivedCounts {
        mutant_molecules_tumor: t.mutant,
        reference_molecules_tumor: t.reference,
        mutant_molecules_comparator: c.mutant,
        reference_molecules_comparator: c.reference,
    })
}
