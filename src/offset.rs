//! Process-wide additive correction applied to query points before lookup.
//! Used to compensate for instrument drift between the acquisition's
//! internal timebase and the store's timebase.

use std::sync::Mutex;

use crate::model::ExclusionPoint;

/// A `{mass, rt, ook0, intensity}` offset, each defaulting to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub mass: f64,
    pub rt: f64,
    pub ook0: f64,
    pub intensity: f64,
}

impl Offset {
    /// Apply this offset to a copy of `point`, leaving `point` itself
    /// untouched. Present fields, including `0.0`, are shifted; absent
    /// fields are left unchanged.
    pub fn apply(&self, point: &ExclusionPoint) -> ExclusionPoint {
        ExclusionPoint {
            charge: point.charge,
            mass: point.mass.map(|m| m + self.mass),
            rt: point.rt.map(|rt| rt + self.rt),
            ook0: point.ook0.map(|v| v + self.ook0),
            intensity: point.intensity.map(|v| v + self.intensity),
        }
    }
}

/// Holds the current process-wide [`Offset`] behind its own lock, separate
/// from the exclusion store's concurrency gate — the offset is read at the
/// start of every point-query batch and is never touched by `clear`.
#[derive(Debug, Default)]
pub struct OffsetRegister {
    current: Mutex<Offset>,
}

impl OffsetRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Offset {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set(&self, mass: f64, rt: f64, ook0: f64, intensity: f64) {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Offset {
            mass,
            rt,
            ook0,
            intensity,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offset_is_zero() {
        let reg = OffsetRegister::new();
        assert_eq!(reg.get(), Offset::default());
    }

    #[test]
    fn set_then_get_round_trips() {
        let reg = OffsetRegister::new();
        reg.set(0.5, 1.0, -0.1, 10.0);
        assert_eq!(
            reg.get(),
            Offset {
                mass: 0.5,
                rt: 1.0,
                ook0: -0.1,
                intensity: 10.0
            }
        );
    }

    #[test]
    fn apply_shifts_present_fields_only() {
        let offset = Offset {
            mass: 0.5,
            rt: 1.0,
            ook0: -0.1,
            intensity: 10.0,
        };
        let point = ExclusionPoint {
            charge: Some(2),
            mass: Some(1000.0),
            rt: None,
            ook0: Some(0.9),
            intensity: None,
        };
        let shifted = offset.apply(&point);
        assert_eq!(shifted.charge, Some(2));
        assert_eq!(shifted.mass, Some(1000.5));
        assert_eq!(shifted.rt, None);
        assert!((shifted.ook0.unwrap() - 0.8).abs() < 1e-9);
        assert_eq!(shifted.intensity, None);
    }

    #[test]
    fn apply_shifts_present_zero_field() {
        // A present 0.0 must still be shifted, not skipped as falsy.
        let offset = Offset {
            mass: 0.5,
            ..Default::default()
        };
        let point = ExclusionPoint {
            charge: None,
            mass: Some(0.0),
            rt: None,
            ook0: None,
            intensity: None,
        };
        let shifted = offset.apply(&point);
        assert_eq!(shifted.mass, Some(0.5));
    }

    #[test]
    fn apply_does_not_mutate_original() {
        let offset = Offset {
            mass: 1.0,
            ..Default::default()
        };
        let point = ExclusionPoint {
            charge: None,
            mass: Some(10.0),
            rt: None,
            ook0: None,
            intensity: None,
        };
        let _ = offset.apply(&point);
        assert_eq!(point.mass, Some(10.0));
    }
}
