use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::ContingencyTable;

/// Pearson chi-squared test of independence for a 2x2 table
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChiSquaredTestResult {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: u32,

    /// Expected cell values under independence, in the same row-major layout as the table
    pub expected: [[f64; 2]; 2],
}

/// Chi-squared test of independence between assay and mutant status
///
/// # Arguments
/// * `yates_correction` - Reduce each absolute deviation by 0.5 (never below zero)
///
/// Returns an error description if any expected cell is zero.
///
pub fn chi_squared_test(
    table: &ContingencyTable,
    yates_correction: bool,
) -> Result<ChiSquaredTestResult, String> {
    let observed = [[table.a, table.b], [table.c, table.d]];
    let row_totals = [table.a + table.b, table.c + table.d];
    let col_totals = [table.a + table.c, table.b + table.d];
    let total = row_totals[0] + row_totals[1];

    let mut expected = [[0.0; 2]; 2];
    for (i, row_total) in row_totals.iter().enumerate() {
        for (j, col_total) in col_totals.iter().enumerate() {
            expected[i][j] = row_total * col_total / total;
        }
    }

    if expected.iter().flatten().any(|&x| !(x > 0.0)) {
        return Err(format!(
            "chi-squared test has a zero expected cell, expected table: {expected:?}"
        ));
    }

    let mut statistic = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let mut deviation = (observed[i][j] - expected[i][j]).abs();
            if yates_correction {
                deviation = (deviation - 0.5).max(0.0);
            }
            statistic += deviation * deviation / expected[i][j];
        }
    }

    let degrees_of_freedom = 1;
    let dist = ChiSquared::new(degrees_of_freedom as f64).map_err(|e| e.to_string())?;
    let p_value = dist.sf(statistic);

    Ok(ChiSquaredTestResult {
        statistic,
        p_value,
        degrees_of_freedom,
        expected,
    })
}
