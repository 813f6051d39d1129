//! Small statistics helpers.

use statrs::distribution::{ContinuousCDF, Normal};

/// Half-width multiplier for a central normal interval covering `width` of
/// the mass. Returns `None` unless `width` is in `(0, 1)`.
pub fn interval_z(width: f64) -> Option<f64> {
    if !(width > 0.0 && width < 1.0) {
        return None;
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    let z = normal.inverse_cdf(0.5 + width / 2.0);
    z.is_finite().then_some(z)
}
