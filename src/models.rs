//! Input summaries: the precomputed aggregates each chart is drawn from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{VizError, VizResult};

/// Category -> count, in input order. `None` marks a missing entry.
pub type CategoryCounts = IndexMap<String, Option<u64>>;

/// Histogram bins: `counts[i]` falls into `[edges[i], edges[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub edges: Vec<f64>,
}

impl Histogram {
    /// Build a histogram, rejecting empty bins, a wrong number of edges,
    /// non-finite edges and edges that do not strictly increase.
    pub fn new(counts: Vec<u64>, edges: Vec<f64>) -> VizResult<Self> {
        let h = Self { counts, edges };
        h.validate()?;
        Ok(h)
    }

    pub fn validate(&self) -> VizResult<()> {
        if self.counts.is_empty() {
            return Err(VizError::EmptyInput("histogram has no bins".into()));
        }
        let expected = self.counts.len() + 1;
        if self.edges.len() != expected {
            return Err(VizError::EdgeCountMismatch {
                bins: self.counts.len(),
                expected,
                actual: self.edges.len(),
            });
        }
        if self.edges.iter().any(|e| !e.is_finite()) {
            return Err(VizError::NonFinite("histogram bin edges".into()));
        }
        for (i, w) in self.edges.windows(2).enumerate() {
            if w[0] >= w[1] {
                return Err(VizError::NonMonotonicEdges {
                    index: i + 1,
                    prev: w[0],
                    next: w[1],
                });
            }
        }
        Ok(())
    }

    pub fn lefts(&self) -> &[f64] {
        &self.edges[..self.edges.len() - 1]
    }

    pub fn rights(&self) -> &[f64] {
        &self.edges[1..]
    }
}

/// Paired theoretical (normal) and sample quantiles for a QQ plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantilePairs {
    pub theory: Vec<f64>,
    pub sample: Vec<f64>,
}

impl QuantilePairs {
    pub fn new(theory: Vec<f64>, sample: Vec<f64>) -> VizResult<Self> {
        let q = Self { theory, sample };
        q.validate()?;
        Ok(q)
    }

    pub fn validate(&self) -> VizResult<()> {
        if self.theory.is_empty() || self.sample.is_empty() {
            return Err(VizError::EmptyInput("no quantiles to plot".into()));
        }
        if self.theory.len() != self.sample.len() {
            return Err(VizError::LengthMismatch {
                left: "theory",
                left_len: self.theory.len(),
                right: "sample",
                right_len: self.sample.len(),
            });
        }
        if self
            .theory
            .iter()
            .chain(self.sample.iter())
            .any(|v| !v.is_finite())
        {
            return Err(VizError::NonFinite("quantiles".into()));
        }
        Ok(())
    }

    /// Smallest and largest value across both quantile arrays.
    pub fn extent(&self) -> (f64, f64) {
        self.theory
            .iter()
            .chain(self.sample.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

/// Five-number-like summary of one box:
/// lower whisker, first quartile, median, third quartile, upper whisker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub lw: f64,
    pub tf: f64,
    pub fy: f64,
    pub sf: f64,
    pub uw: f64,
    pub outliers: Vec<f64>,
}

const BOX_KEYS: [&str; 5] = ["lw", "tf", "fy", "sf", "uw"];

impl BoxSummary {
    /// Read a summary from a JSON object, naming the first absent key.
    pub fn from_json_value(category: &str, value: &Value) -> VizResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            VizError::InvalidSummary(format!("summary for `{category}` is not an object"))
        })?;

        let mut nums = [0.0f64; 5];
        for (slot, key) in nums.iter_mut().zip(BOX_KEYS) {
            let v = obj.get(key).ok_or_else(|| VizError::MissingField {
                category: category.to_string(),
                field: key,
            })?;
            *slot = v.as_f64().ok_or_else(|| {
                VizError::InvalidSummary(format!("`{key}` of `{category}` is not a number"))
            })?;
        }

        let outliers = match obj.get("outliers") {
            None => {
                return Err(VizError::MissingField {
                    category: category.to_string(),
                    field: "outliers",
                });
            }
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| {
                        VizError::InvalidSummary(format!(
                            "outlier `{v}` of `{category}` is not a number"
                        ))
                    })
                })
                .collect::<VizResult<Vec<f64>>>()?,
            Some(other) => {
                return Err(VizError::InvalidSummary(format!(
                    "outliers of `{category}` must be an array, got {other}"
                )));
            }
        };

        let [lw, tf, fy, sf, uw] = nums;
        Ok(Self {
            lw,
            tf,
            fy,
            sf,
            uw,
            outliers,
        })
    }

    /// Reject non-finite values and a third quartile below the first.
    pub fn validate(&self, category: &str) -> VizResult<()> {
        let all = [self.lw, self.tf, self.fy, self.sf, self.uw];
        if all.iter().chain(self.outliers.iter()).any(|v| !v.is_finite()) {
            return Err(VizError::NonFinite(format!("box summary of `{category}`")));
        }
        if self.sf < self.tf {
            return Err(VizError::NegativeBoxHeight {
                category: category.to_string(),
                tf: self.tf,
                sf: self.sf,
            });
        }
        Ok(())
    }

    pub fn height(&self) -> f64 {
        self.sf - self.tf
    }

    pub fn center(&self) -> f64 {
        (self.tf + self.sf) / 2.0
    }
}

/// Parse `{ "category": { "lw": .., "tf": .., "fy": .., "sf": .., "uw": .., "outliers": [..] } }`
/// keeping the category order of the document.
pub fn box_summaries_from_json(json: &str) -> VizResult<IndexMap<String, BoxSummary>> {
    let root: Value = serde_json::from_str(json)?;
    let obj = root
        .as_object()
        .ok_or_else(|| VizError::InvalidSummary("box summaries must be a JSON object".into()))?;
    let mut out = IndexMap::with_capacity(obj.len());
    for (category, value) in obj {
        out.insert(
            category.clone(),
            BoxSummary::from_json_value(category, value)?,
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_rejects_flat_edges() {
        let err = Histogram::new(vec![1, 2], vec![0.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, VizError::NonMonotonicEdges { index: 2, .. }));
    }

    #[test]
    fn histogram_rejects_edge_count() {
        let err = Histogram::new(vec![1, 2], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            VizError::EdgeCountMismatch {
                bins: 2,
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn box_json_reports_missing_key() {
        let err = box_summaries_from_json(
            r#"{ "a": { "lw": 0, "tf": 1, "sf": 3, "uw": 4, "outliers": [] } }"#,
        )
        .unwrap_err();
        match err {
            VizError::MissingField { category, field } => {
                assert_eq!(category, "a");
                assert_eq!(field, "fy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn box_json_keeps_document_order() {
        let parsed = box_summaries_from_json(
            r#"{
                "zeta":  { "lw": 0, "tf": 1, "fy": 2, "sf": 3, "uw": 4, "outliers": [9.5] },
                "alpha": { "lw": 1, "tf": 2, "fy": 3, "sf": 4, "uw": 5, "outliers": [] }
            }"#,
        )
        .unwrap();
        let keys: Vec<&str> = parsed.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(parsed["zeta"].outliers, vec![9.5]);
    }
}
