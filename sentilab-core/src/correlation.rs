//! Per-ticker Pearson correlation between daily return and sentiment.
//!
//! Tickers with fewer than two aligned rows, or with a constant column, get
//! an explicit flagged result instead of a NaN coefficient.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::align::AlignedTable;
use crate::domain::Ticker;

/// Minimum aligned observations for a defined coefficient.
pub const MIN_OBSERVATIONS: usize = 2;

/// A column whose standard deviation is below `1e-12` of its magnitude is
/// treated as constant: what remains is floating-point rounding noise.
const RELATIVE_VARIANCE_FLOOR: f64 = 1e-24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStatus {
    Computed,
    /// Fewer than [`MIN_OBSERVATIONS`] aligned rows.
    InsufficientData,
    /// Return or sentiment column is constant, so r is undefined.
    ZeroVariance,
}

impl CorrelationStatus {
    pub fn is_flagged(self) -> bool {
        self != CorrelationStatus::Computed
    }
}

/// Correlation outcome for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub ticker: Ticker,
    /// In [-1, 1]; `None` unless `status` is `Computed`.
    pub coefficient: Option<f64>,
    /// Two-sided, in [0, 1]; `None` unless `status` is `Computed`.
    pub p_value: Option<f64>,
    pub n_observations: usize,
    pub status: CorrelationStatus,
}

impl CorrelationResult {
    fn flagged(ticker: Ticker, n: usize, status: CorrelationStatus) -> Self {
        Self {
            ticker,
            coefficient: None,
            p_value: None,
            n_observations: n,
            status,
        }
    }
}

/// Pearson coefficient and two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pearson {
    pub r: f64,
    pub p_value: f64,
}

/// Pearson correlation over paired samples.
///
/// Returns `Err(status)` when the coefficient is undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Pearson, CorrelationStatus> {
    let n = x.len().min(y.len());
    if n < MIN_OBSERVATIONS {
        return Err(CorrelationStatus::InsufficientData);
    }
    let (x, y) = (&x[..n], &y[..n]);

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if is_negligible(sxx, mean_x, nf) || is_negligible(syy, mean_y, nf) {
        return Err(CorrelationStatus::ZeroVariance);
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    if !r.is_finite() {
        return Err(CorrelationStatus::ZeroVariance);
    }

    Ok(Pearson {
        r,
        p_value: two_sided_p_value(r, n),
    })
}

/// Two-sided p-value for H0: ρ = 0 using Student's t with n − 2 degrees of
/// freedom.
fn two_sided_p_value(r: f64, n: usize) -> f64 {
    // Two points always lie on a line.
    if n <= 2 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return 0.0;
    }
    let t = r * (df / denom).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Sum of squared deviations `ss` is indistinguishable from zero relative
/// to `n · mean²`.
fn is_negligible(ss: f64, mean: f64, n: f64) -> bool {
    ss <= RELATIVE_VARIANCE_FLOOR * n * mean * mean
}

/// Correlate every ticker in the aligned table independently.
pub fn correlate(aligned: &AlignedTable) -> BTreeMap<Ticker, CorrelationResult> {
    aligned
        .by_ticker()
        .into_iter()
        .map(|(ticker, rows)| {
            let returns: Vec<f64> = rows.iter().map(|o| o.daily_return).collect();
            let scores: Vec<f64> = rows.iter().map(|o| o.sentiment_score).collect();
            let n = rows.len();
            let result = match pearson(&returns, &scores) {
                Ok(p) => CorrelationResult {
                    ticker: ticker.clone(),
                    coefficient: Some(p.r),
                    p_value: Some(p.p_value),
                    n_observations: n,
                    status: CorrelationStatus::Computed,
                },
                Err(status) => CorrelationResult::flagged(ticker.clone(), n, status),
            };
            (ticker.clone(), result)
        })
        .collect()
}

/// Like [`correlate`], but also emits an `InsufficientData` result for
/// every expected ticker that has no aligned rows at all.
pub fn correlate_tickers<'a>(
    aligned: &AlignedTable,
    expected: impl IntoIterator<Item = &'a Ticker>,
) -> BTreeMap<Ticker, CorrelationResult> {
    let mut results = correlate(aligned);
    for ticker in expected {
        results.entry(ticker.clone()).or_insert_with(|| {
            CorrelationResult::flagged(ticker.clone(), 0, CorrelationStatus::InsufficientData)
        });
    }
    results
}
