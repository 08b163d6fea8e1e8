use thiserror::Error;

pub type VizResult<T> = Result<T, VizError>;

/// Everything that can make a chart operation refuse its input.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("expected {expected} bin edges for {bins} bins, got {actual}")]
    EdgeCountMismatch {
        bins: usize,
        expected: usize,
        actual: usize,
    },

    #[error("bin edges must be strictly increasing (edge {index}: {prev} >= {next})")]
    NonMonotonicEdges { index: usize, prev: f64, next: f64 },

    #[error("non-finite value in {0}")]
    NonFinite(String),

    #[error("length mismatch: {left} has {left_len} values, {right} has {right_len}")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    #[error("zero denominator while computing {0}")]
    ZeroDenominator(String),

    #[error("parameter `{name}` out of range: {reason}")]
    ParameterOutOfRange { name: &'static str, reason: String },

    #[error("missing field `{field}` in summary for `{category}`")]
    MissingField { category: String, field: &'static str },

    #[error("invalid summary: {0}")]
    InvalidSummary(String),

    #[error("box for `{category}` has upper quartile {sf} below lower quartile {tf}")]
    NegativeBoxHeight { category: String, tf: f64, sf: f64 },

    #[error("degenerate statistics: {0}")]
    Degenerate(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VizError {
    pub(crate) fn out_of_range(name: &'static str, reason: impl Into<String>) -> Self {
        Self::ParameterOutOfRange {
            name,
            reason: reason.into(),
        }
    }
}
