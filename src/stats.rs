//! Small numeric helpers behind the charts: percentages, the density
//! histogram and the Gaussian kernel density estimate under the KDE overlay.

use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use crate::error::{VizError, VizResult};

/// `part / total * 100`, refusing a zero (or non-finite) denominator.
pub fn percentage(part: f64, total: f64, what: &str) -> VizResult<f64> {
    if total == 0.0 || !total.is_finite() {
        return Err(VizError::ZeroDenominator(what.to_string()));
    }
    Ok(part / total * 100.0)
}

/// Round to one decimal, halves to even (`6.25 -> 6.2`).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round_ties_even() / 10.0
}

/// Chart title, with a missing-value annotation when `missing > 0`:
/// `"age (12.5% missing values)"`.
pub fn title_with_missing(col: &str, missing: u64, total: f64) -> VizResult<String> {
    if missing == 0 {
        return Ok(col.to_string());
    }
    let pct = round1(percentage(missing as f64, total, "missing-value percentage")?);
    Ok(format!("{col} ({pct:.1}% missing values)"))
}

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// `(min, max)` of a non-empty slice.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    }))
}

/// Drop missing (NaN) values. Infinities are kept for the caller to reject.
pub fn drop_missing(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Normalized histogram: the bar areas sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityHistogram {
    pub densities: Vec<f64>,
    pub edges: Vec<f64>,
}

/// Equal-width bins over `[min, max]`, last bin closed.
///
/// A constant sample gets the range `[v - 0.5, v + 0.5]`.
pub fn density_histogram(values: &[f64], bins: usize) -> VizResult<DensityHistogram> {
    if bins == 0 {
        return Err(VizError::out_of_range("bins", "must be at least 1"));
    }
    let (mut lo, mut hi) =
        min_max(values).ok_or_else(|| VizError::EmptyInput("no values to bin".into()))?;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let edges = linspace(lo, hi, bins + 1);
    let span = hi - lo;
    let mut counts = vec![0u64; bins];
    for &v in values {
        let idx = (((v - lo) / span) * bins as f64).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    let n = values.len() as f64;
    let densities = counts
        .iter()
        .zip(edges.windows(2))
        .map(|(&c, w)| c as f64 / (n * (w[1] - w[0])))
        .collect();
    Ok(DensityHistogram { densities, edges })
}

/// How the kernel width is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bandwidth {
    /// Kernel sigma = factor * sample standard deviation.
    Factor(f64),
    /// Factor `n^(-1/5)`.
    Scott,
    /// Factor `(3n/4)^(-1/5)`.
    Silverman,
}

impl From<f64> for Bandwidth {
    fn from(factor: f64) -> Self {
        Bandwidth::Factor(factor)
    }
}

impl Bandwidth {
    fn factor(self, n: usize) -> VizResult<f64> {
        let n = n as f64;
        let f = match self {
            Bandwidth::Factor(f) => f,
            Bandwidth::Scott => n.powf(-0.2),
            Bandwidth::Silverman => (n * 3.0 / 4.0).powf(-0.2),
        };
        if !(f.is_finite() && f > 0.0) {
            return Err(VizError::out_of_range(
                "bandwidth",
                format!("{f} is not a positive factor"),
            ));
        }
        Ok(f)
    }
}

/// One-dimensional Gaussian kernel density estimate.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    data: Vec<f64>,
    sigma: f64,
    kernel: Normal,
}

impl GaussianKde {
    pub fn new(data: &[f64], bandwidth: Bandwidth) -> VizResult<Self> {
        if data.is_empty() {
            return Err(VizError::EmptyInput("no values for the density estimate".into()));
        }
        let factor = bandwidth.factor(data.len())?;
        if data.len() < 2 {
            return Err(VizError::Degenerate(
                "a density estimate needs at least two values".into(),
            ));
        }
        let std_dev = data.iter().std_dev();
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(VizError::Degenerate(
                "sample has zero variance; the kernel would be singular".into(),
            ));
        }
        let kernel =
            Normal::new(0.0, 1.0).map_err(|e| VizError::Degenerate(e.to_string()))?;
        Ok(Self {
            data: data.to_vec(),
            sigma: factor * std_dev,
            kernel,
        })
    }

    /// Width (standard deviation) of each kernel.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let sum: f64 = self
            .data
            .iter()
            .map(|&xi| self.kernel.pdf((x - xi) / self.sigma))
            .sum();
        sum / (self.data.len() as f64 * self.sigma)
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn percentage_of_zero_total_is_error() {
        assert!(matches!(
            percentage(1.0, 0.0, "bar"),
            Err(VizError::ZeroDenominator(_))
        ));
    }

    #[test]
    fn title_annotates_missing_share() {
        assert_eq!(title_with_missing("age", 0, 10.0).unwrap(), "age");
        assert_eq!(
            title_with_missing("age", 1, 3.0).unwrap(),
            "age (33.3% missing values)"
        );
        assert_eq!(
            title_with_missing("age", 1, 8.0).unwrap(),
            "age (12.5% missing values)"
        );
    }

    #[test]
    fn one_decimal_rounds_half_to_even() {
        assert_eq!(round1(6.25), 6.2);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(
            title_with_missing("age", 1, 16.0).unwrap(),
            "age (6.2% missing values)"
        );
    }

    #[test]
    fn linspace_hits_both_ends() {
        let xs = linspace(0.0, 1.0, 5);
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn density_histogram_integrates_to_one() {
        let values = [1.0, 2.0, 2.0, 3.0, 4.0, 4.0, 4.0, 5.0];
        let h = density_histogram(&values, 10).unwrap();
        assert_eq!(h.edges.len(), 11);
        let area: f64 = h
            .densities
            .iter()
            .zip(h.edges.windows(2))
            .map(|(d, w)| d * (w[1] - w[0]))
            .sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn max_value_lands_in_last_bin() {
        let h = density_histogram(&[0.0, 10.0], 2).unwrap();
        assert_relative_eq!(h.densities[0], h.densities[1]);
    }

    #[test]
    fn constant_sample_widens_range() {
        let h = density_histogram(&[7.0, 7.0], 10).unwrap();
        assert_relative_eq!(h.edges[0], 6.5);
        assert_relative_eq!(h.edges[10], 7.5);
    }

    #[test]
    fn kde_matches_hand_computed_density() {
        // two points at +-1: std = sqrt(2), sigma = 0.5 * sqrt(2)
        let kde = GaussianKde::new(&[-1.0, 1.0], Bandwidth::Factor(0.5)).unwrap();
        let sigma = 0.5 * 2f64.sqrt();
        assert_relative_eq!(kde.sigma(), sigma, epsilon = 1e-12);
        let phi = |u: f64| (-0.5 * u * u).exp() / (2.0 * std::f64::consts::PI).sqrt();
        let expected = (phi(1.0 / sigma) + phi(1.0 / sigma)) / (2.0 * sigma);
        assert_relative_eq!(kde.evaluate(0.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn kde_rejects_constant_sample() {
        assert!(matches!(
            GaussianKde::new(&[2.0, 2.0, 2.0], Bandwidth::Scott),
            Err(VizError::Degenerate(_))
        ));
    }

    #[test]
    fn kde_rejects_non_positive_bandwidth() {
        assert!(matches!(
            GaussianKde::new(&[1.0, 2.0], Bandwidth::Factor(0.0)),
            Err(VizError::ParameterOutOfRange { name: "bandwidth", .. })
        ));
    }
}
