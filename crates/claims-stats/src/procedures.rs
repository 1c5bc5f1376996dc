//! Test statistics and p-values.
//!
//! Each procedure returns [`Outcome::Undefined`] with a reason instead of a
//! p-value when the data cannot support the test.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use claims_common::stats::{mean, sample_variance};

use crate::error::{Result, StatsError};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Computed {
        statistic: f64,
        p_value: f64,
        df: Option<f64>,
        denominator_df: Option<f64>,
    },
    Undefined(String),
}

impl Outcome {
    fn computed(statistic: f64, p_value: f64, df: Option<f64>) -> Self {
        Self::Computed {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
            df,
            denominator_df: None,
        }
    }

    fn undefined(reason: impl Into<String>) -> Self {
        Self::Undefined(reason.into())
    }
}

fn distribution_error(err: impl std::fmt::Display) -> StatsError {
    StatsError::Distribution(err.to_string())
}

/// Pearson chi-squared test of independence.
///
/// `table[i][j]` counts rows of group `i` with outcome category `j`. 2x2
/// tables use the Yates continuity correction.
pub fn chi_squared(table: &[Vec<f64>]) -> Result<Outcome> {
    let rows = table.len();
    let cols = table.first().map_or(0, Vec::len);
    if rows < 2 {
        return Ok(Outcome::undefined("fewer than two groups"));
    }
    if cols < 2 {
        return Ok(Outcome::undefined(
            "outcome has fewer than two observed categories",
        ));
    }

    let row_sums: Vec<f64> = table.iter().map(|r| r.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..cols)
        .map(|j| table.iter().map(|r| r.get(j).copied().unwrap_or(0.0)).sum())
        .collect();
    let total: f64 = row_sums.iter().sum();
    if row_sums.iter().chain(&col_sums).any(|&s| s <= 0.0) {
        return Ok(Outcome::undefined(
            "contingency table has an empty row or column (zero expected counts)",
        ));
    }

    let yates = rows == 2 && cols == 2;
    let mut statistic = 0.0;
    for (i, row) in table.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_sums[i] * col_sums[j] / total;
            let mut diff = (observed - expected).abs();
            if yates {
                diff = (diff - 0.5).max(0.0);
            }
            statistic += diff * diff / expected;
        }
    }

    let df = ((rows - 1) * (cols - 1)) as f64;
    let dist = ChiSquared::new(df).map_err(distribution_error)?;
    Ok(Outcome::computed(statistic, dist.sf(statistic), Some(df)))
}

struct TwoSample {
    diff: f64,
    se: f64,
    va_n: f64,
    vb_n: f64,
    na: f64,
    nb: f64,
}

fn two_sample(a: &[f64], b: &[f64]) -> std::result::Result<TwoSample, String> {
    if a.len() < 2 || b.len() < 2 {
        return Err("each group needs at least two observations".to_string());
    }
    let (Some(va), Some(vb)) = (sample_variance(a), sample_variance(b)) else {
        return Err("each group needs at least two observations".to_string());
    };
    if va <= 0.0 || vb <= 0.0 {
        return Err("zero variance in at least one group".to_string());
    }
    let (Some(ma), Some(mb)) = (mean(a), mean(b)) else {
        return Err("empty group".to_string());
    };
    let na = a.len() as f64;
    let nb = b.len() as f64;
    let va_n = va / na;
    let vb_n = vb / nb;
    Ok(TwoSample {
        diff: ma - mb,
        se: (va_n + vb_n).sqrt(),
        va_n,
        vb_n,
        na,
        nb,
    })
}

/// Welch's unequal-variance t-test, two-sided.
pub fn welch_t(a: &[f64], b: &[f64]) -> Result<Outcome> {
    let s = match two_sample(a, b) {
        Ok(s) => s,
        Err(reason) => return Ok(Outcome::undefined(reason)),
    };
    let t = s.diff / s.se;
    let df = (s.va_n + s.vb_n).powi(2)
        / (s.va_n.powi(2) / (s.na - 1.0) + s.vb_n.powi(2) / (s.nb - 1.0));
    let dist = StudentsT::new(0.0, 1.0, df).map_err(distribution_error)?;
    Ok(Outcome::computed(t, 2.0 * dist.sf(t.abs()), Some(df)))
}

/// Two-sample z-test on means with sample variances, two-sided.
pub fn z_test(a: &[f64], b: &[f64]) -> Result<Outcome> {
    let s = match two_sample(a, b) {
        Ok(s) => s,
        Err(reason) => return Ok(Outcome::undefined(reason)),
    };
    let z = s.diff / s.se;
    let dist = Normal::new(0.0, 1.0).map_err(distribution_error)?;
    Ok(Outcome::computed(z, 2.0 * dist.sf(z.abs()), None))
}

/// One-way ANOVA F test across groups.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<Outcome> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    if k < 2 {
        return Ok(Outcome::undefined("fewer than two non-empty groups"));
    }
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return Ok(Outcome::undefined("no residual degrees of freedom"));
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in &groups {
        let m = group.iter().sum::<f64>() / group.len() as f64;
        ss_between += group.len() as f64 * (m - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }
    if ss_within <= 0.0 {
        return Ok(Outcome::undefined("zero variance within groups"));
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).map_err(distribution_error)?;
    Ok(Outcome::Computed {
        statistic: f,
        p_value: dist.sf(f).clamp(0.0, 1.0),
        df: Some(df_between),
        denominator_df: Some(df_within),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computed(outcome: Outcome) -> (f64, f64, Option<f64>) {
        match outcome {
            Outcome::Computed {
                statistic,
                p_value,
                df,
                ..
            } => (statistic, p_value, df),
            Outcome::Undefined(reason) => panic!("undefined: {reason}"),
        }
    }

    #[test]
    fn chi_squared_2x2_with_yates() {
        let table = vec![vec![10.0, 20.0], vec![20.0, 20.0]];
        let (stat, p, df) = computed(chi_squared(&table).unwrap());
        assert!((stat - 1.323_437_5).abs() < 1e-9, "stat = {stat}");
        assert!((p - 0.249_976).abs() < 1e-5, "p = {p}");
        assert_eq!(df, Some(1.0));
    }

    #[test]
    fn chi_squared_larger_table_without_correction() {
        let table = vec![vec![10.0, 10.0, 10.0], vec![10.0, 10.0, 10.0]];
        let (stat, p, df) = computed(chi_squared(&table).unwrap());
        assert_eq!(stat, 0.0);
        assert!((p - 1.0).abs() < 1e-12);
        assert_eq!(df, Some(2.0));
    }

    #[test]
    fn chi_squared_single_category_is_undefined() {
        let table = vec![vec![10.0], vec![20.0]];
        assert!(matches!(chi_squared(&table).unwrap(), Outcome::Undefined(_)));
        let table = vec![vec![10.0, 0.0], vec![20.0, 0.0]];
        assert!(matches!(chi_squared(&table).unwrap(), Outcome::Undefined(_)));
    }

    #[test]
    fn welch_known_values() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let (t, p, df) = computed(welch_t(&a, &b).unwrap());
        assert!((t - (-2.401_922)).abs() < 1e-5, "t = {t}");
        assert!((p - 0.039_803).abs() < 1e-4, "p = {p}");
        assert!((df.unwrap() - 8.989_362).abs() < 1e-5);
    }

    #[test]
    fn continuous_edge_cases_are_undefined() {
        assert!(matches!(
            welch_t(&[1.0], &[1.0, 2.0]).unwrap(),
            Outcome::Undefined(_)
        ));
        assert!(matches!(
            welch_t(&[5.0, 5.0, 5.0], &[1.0, 2.0]).unwrap(),
            Outcome::Undefined(_)
        ));
        assert!(matches!(
            z_test(&[5.0, 5.0], &[5.0, 5.0]).unwrap(),
            Outcome::Undefined(_)
        ));
    }

    #[test]
    fn z_test_symmetric() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 2.0, 3.0];
        let (z, p, df) = computed(z_test(&a, &b).unwrap());
        assert_eq!(z, 0.0);
        assert!((p - 1.0).abs() < 1e-12);
        assert_eq!(df, None);
    }

    #[test]
    fn anova_known_values() {
        let groups = vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ];
        match one_way_anova(&groups).unwrap() {
            Outcome::Computed {
                statistic,
                p_value,
                df,
                denominator_df,
            } => {
                assert!((statistic - 27.0).abs() < 1e-9);
                assert!((p_value - 0.001).abs() < 1e-4, "p = {p_value}");
                assert_eq!(df, Some(2.0));
                assert_eq!(denominator_df, Some(6.0));
            }
            Outcome::Undefined(reason) => panic!("undefined: {reason}"),
        }
    }

    #[test]
    fn anova_edge_cases() {
        assert!(matches!(
            one_way_anova(&[vec![1.0, 2.0]]).unwrap(),
            Outcome::Undefined(_)
        ));
        assert!(matches!(
            one_way_anova(&[vec![1.0], vec![2.0]]).unwrap(),
            Outcome::Undefined(_)
        ));
        assert!(matches!(
            one_way_anova(&[vec![1.0, 1.0], vec![2.0, 2.0]]).unwrap(),
            Outcome::Undefined(_)
        ));
    }
}
