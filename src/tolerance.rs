//! Derives an [`ExclusionInterval`] centered on an [`ExclusionPoint`] — the
//! way the feedback consumer turns a confirmed peptide-spectrum match into a
//! new exclusion interval, with mass expressed as a ppm window and the rest
//! as absolute or relative tolerances.

use crate::error::ExclusionError;
use crate::model::{ExclusionInterval, ExclusionPoint};

/// Per-dimension tolerance used to build an interval around a point.
///
/// `mass_tolerance` is in ppm; `rt_tolerance` is in absolute seconds;
/// `ook0_tolerance` and `intensity_tolerance` are relative fractions. Any
/// tolerance left `None` leaves that dimension unbounded on the built
/// interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToleranceConfig {
    pub exact_charge: bool,
    pub mass_tolerance: Option<f64>,
    pub rt_tolerance: Option<f64>,
    pub ook0_tolerance: Option<f64>,
    pub intensity_tolerance: Option<f64>,
}

impl ToleranceConfig {
    fn validate(&self) -> Result<(), ExclusionError> {
        for (name, tol) in [
            ("mass_tolerance", self.mass_tolerance),
            ("rt_tolerance", self.rt_tolerance),
            ("ook0_tolerance", self.ook0_tolerance),
            ("intensity_tolerance", self.intensity_tolerance),
        ] {
            if tol.is_some_and(|t| t < 0.0) {
                return Err(ExclusionError::InvalidTolerance(format!(
                    "{name} must be non-negative"
                )));
            }
        }
        Ok(())
    }
}

/// Build an [`ExclusionInterval`] centered on `point`, using `id` as the
/// interval's identifier. Fails with [`ExclusionError::InvalidTolerance`] if
/// any configured tolerance is negative; does not silently clamp.
pub fn build_interval(
    config: &ToleranceConfig,
    point: &ExclusionPoint,
    id: impl Into<String>,
) -> Result<ExclusionInterval, ExclusionError> {
    config.validate()?;

    let ppm_window = |m: f64, ppm: f64| m * ppm / 1_000_000.0;

    let (min_mass, max_mass) = match (point.mass, config.mass_tolerance) {
        (Some(m), Some(ppm)) => (Some(m - ppm_window(m, ppm)), Some(m + ppm_window(m, ppm))),
        _ => (None, None),
    };
    let (min_rt, max_rt) = match (point.rt, config.rt_tolerance) {
        (Some(rt), Some(tol)) => (Some(rt - tol), Some(rt + tol)),
        _ => (None, None),
    };
    let (min_ook0, max_ook0) = match (point.ook0, config.ook0_tolerance) {
        (Some(v), Some(tol)) => (Some(v - v * tol), Some(v + v * tol)),
        _ => (None, None),
    };
    let (min_intensity, max_intensity) = match (point.intensity, config.intensity_tolerance) {
        (Some(v), Some(tol)) => (Some(v - v * tol), Some(v + v * tol)),
        _ => (None, None),
    };

    Ok(ExclusionInterval {
        interval_id: Some(id.into()),
        charge: if config.exact_charge { point.charge } else { None },
        min_mass,
        max_mass,
        min_rt,
        max_rt,
        min_ook0,
        max_ook0,
        min_intensity,
        max_intensity,
    })
}
