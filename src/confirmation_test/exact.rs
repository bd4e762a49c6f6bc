use serde::Serialize;
use statrs::function::factorial::ln_binomial;

use super::ContingencyTable;

/// One-sided exact test result for tumor enrichment
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ExactTestResult {
    pub p_value: f64,

    /// Sample odds ratio `a*d / (b*c)` of the whole-molecule table
    ///
    /// This is infinite when `b` or `c` is zero, and NaN when the table has an empty margin.
    pub odds_ratio: f64,
}

/// Probability of `k` tumor-row molecules in the mutant column under the hypergeometric null
///
/// # Arguments
/// * `total` - Total molecules in the table
/// * `col1` - Mutant column total
/// * `row1` - Tumor row total
///
fn hypergeometric_ln_pmf(k: u64, total: u64, col1: u64, row1: u64) -> f64 {
    ln_binomial(col1, k) + ln_binomial(total - col1, row1 - k) - ln_binomial(total, row1)
}

/// Fisher's exact test for the 2x2 table with the alternative hypothesis: odds ratio > 1
///
/// The hypergeometric null is defined over whole molecules, so table cells are truncated to
/// integers before testing. Any continuity correction must already be applied to `table`.
///
/// The p-value is the upper tail P(X >= a), where X is the tumor mutant cell count given all
/// table margins.
///
/// A table with an empty row or column margin is uninformative, and returns a p-value of 1 with
/// an undefined (NaN) odds ratio.
///
pub fn fisher_exact_greater(table: &ContingencyTable) -> ExactTestResult {
    let [a, b, c, d] = table.whole_counts();

    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let col2 = b + d;
    if row1 == 0 || row2 == 0 || col1 == 0 || col2 == 0 {
        return ExactTestResult {
            p_value: 1.0,
            odds_ratio: f64::NAN,
        };
    }

    let odds_ratio = if b > 0 && c > 0 {
        (a as f64 * d as f64) / (b as f64 * c as f64)
    } else {
        f64::INFINITY
    };

    let total = row1 + row2;
    let max_k = std::cmp::min(row1, col1);
    let p_value = (a..=max_k)
        .map(|k| hypergeometric_ln_pmf(k, total, col1, row1).exp())
        .sum::<f64>()
        .min(1.0);

    ExactTestResult {
        p_value,
        odds_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fisher_exact_greater() {
        let table = ContingencyTable::new(8.0, 2.0, 1.0, 5.0);
        let result = fisher_exact_greater(&table);

        // P(X >= 8) = (C(9,8)C(7,2) + C(9,9)C(7,1)) / C(16,10)
        approx::assert_relative_eq!(result.p_value, 196.0 / 8008.0, max_relative = 1e-10);
        approx::assert_relative_eq!(result.odds_ratio, 20.0, max_relative = 1e-12);
    }

    #[test]
    fn test_fisher_exact_complete_separation() {
        let table = ContingencyTable::new(10.0, 0.0, 0.0, 10.0).with_pseudocount(0.1);
        let result = fisher_exact_greater(&table);
        approx::assert_relative_eq!(result.p_value, 1.0 / 184756.0, max_relative = 1e-10);
        assert_eq!(result.odds_ratio, f64::INFINITY);
    }

    #[test]
    fn test_fisher_exact_no_enrichment() {
        let table = ContingencyTable::new(1.0, 9.0, 1.0, 9.0).with_pseudocount(0.1);
        let result = fisher_exact_greater(&table);

        // 1 - P(X = 0) = 1 - C(18,10) / C(20,10)
        approx::assert_relative_eq!(result.p_value, 145.0 / 190.0, max_relative = 1e-10);
        approx::assert_relative_eq!(result.odds_ratio, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_fisher_exact_depleted_tumor() {
        // Tumor has a lower mutant fraction than the comparator, so the p-value is large
        let table = ContingencyTable::new(0.0, 20.0, 10.0, 10.0);
        let result = fisher_exact_greater(&table);
        approx::assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-9);
        assert_eq!(result.odds_ratio, 0.0);
    }

    #[test]
    fn test_fisher_exact_empty_margin() {
        // The tumor row truncates to zero molecules
        let table = ContingencyTable::new(0.4, 0.5, 3.0, 30.0).with_pseudocount(0.1);
        let result = fisher_exact_greater(&table);
        assert_eq!(result.p_value, 1.0);
        assert!(result.odds_ratio.is_nan());
    }
}
