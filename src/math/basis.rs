//! Regression basis functions for trend + seasonality models.
//!
//! Seasonality is modelled with a truncated Fourier series over a fixed
//! period `P` (in days):
//!
//! - `sin(2πk·t/P)`, `cos(2πk·t/P)` for `k = 1..=order`
//!
//! where `t` is measured in days since a fixed origin.

use std::f64::consts::PI;

/// Length of a year in days, used as the yearly seasonality period.
pub const YEAR_DAYS: f64 = 365.25;

/// Write the `2 * order` Fourier terms for `t_days` into `out`.
///
/// # Panics
/// Panics if `out.len() < 2 * order`.
pub fn fill_fourier_terms(t_days: f64, period_days: f64, order: usize, out: &mut [f64]) {
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * t_days / period_days;
        out[2 * (k - 1)] = x.sin();
        out[2 * (k - 1) + 1] = x.cos();
    }
}
