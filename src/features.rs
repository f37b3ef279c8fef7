use std::f64::consts::PI;

use crate::tables::Coordinates;
use crate::types::PredictionRequest;

/// Input width the regression model was trained with.
pub const FEATURE_COUNT: usize = 13;

/// Column names, in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "temp_lag1",
    "temp_lag2",
    "temp_lag3",
    "rain_lag1",
    "rain_lag2",
    "rain_lag3",
    "humid_lag1",
    "humid_lag2",
    "humid_lag3",
    "month_sin",
    "month_cos",
    "latitude",
    "longitude",
];

/// Cyclical month encoding: `(sin(2πm/12), cos(2πm/12))`.
/// Out-of-range months are encoded as-is.
pub fn month_encoding(month: i32) -> (f64, f64) {
    let angle = 2.0 * PI * f64::from(month) / 12.0;
    (angle.sin(), angle.cos())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Current weather stands in for each of the three monthly lags; no
    /// weather history is available at request time.
    pub fn assemble(req: &PredictionRequest, coords: Coordinates) -> Self {
        let (month_sin, month_cos) = month_encoding(req.month);
        let (t, r, h) = (req.temperature, req.rainfall, req.humidity);
        Self([
            t,
            t,
            t,
            r,
            r,
            r,
            h,
            h,
            h,
            month_sin,
            month_cos,
            coords.latitude,
            coords.longitude,
        ])
    }

    pub fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// (nonzero, mean, std) for debug logging.
    pub fn summary(&self) -> (usize, f64, f64) {
        let n = FEATURE_COUNT as f64;
        let nz = self.0.iter().filter(|x| **x != 0.0).count();
        let mean = self.0.iter().sum::<f64>() / n;
        let var = self.0.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
        (nz, mean, var.sqrt())
    }

    /// `name=value` pairs for the first `n` columns.
    pub fn sample(&self, n: usize) -> String {
        FEATURE_NAMES
            .iter()
            .zip(self.0.iter())
            .take(n)
            .map(|(name, v)| format!("{name}={v:.3}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
