use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use super::ContingencyTable;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProportionsTestResult {
    pub z_statistic: f64,
    pub p_value: f64,
}

/// Two-proportion z-test with pooled variance, alternative: tumor mutant proportion is larger
///
/// Successes are the mutant cells and totals are the row sums of `table`.
///
/// Returns an error description if either row total is zero or the pooled variance is zero.
///
pub fn proportions_ztest_larger(table: &ContingencyTable) -> Result<ProportionsTestResult, String> {
    let n1 = table.tumor_total();
    let n2 = table.comparator_total();
    if !(n1 > 0.0 && n2 > 0.0) {
        return Err(format!(
            "proportions z-test requires positive molecule totals, found tumor: {n1} comparator: {n2}"
        ));
    }

    let p1 = table.a / n1;
    let p2 = table.c / n2;
    let pooled = (table.a + table.c) / (n1 + n2);
    let variance = pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2);
    if !(variance > 0.0) {
        return Err("proportions z-test pooled variance is zero".to_string());
    }

    let z_statistic = (p1 - p2) / variance.sqrt();
    let normal = Normal::new(0.0, 1.0).map_err(|e| e.to_string())?;
    let p_value = normal.sf(z_statistic);

    Ok(ProportionsTestResult {
        z_statistic,
        p_value,
    })
}
