use serde::Serialize;

use crate::errors::CoreError;
use crate::settings::Settings;

/// Educational insulin estimate. Recomputed from its inputs, never edited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    total: f64,
    meal_bolus: f64,
    correction_bolus: f64,
    carbs: f64,
    icr: i32,
    cf: i32,
}

impl Estimate {
    /// Rounded to one decimal; the figure that is shown and logged.
    pub fn total(&self) -> f64 {
        self.total
    }

    #[cfg(test)]
    pub fn unrounded_total(&self) -> f64 {
        self.meal_bolus + self.correction_bolus
    }

    pub fn meal_bolus(&self) -> f64 {
        self.meal_bolus
    }

    pub fn correction_bolus(&self) -> f64 {
        self.correction_bolus
    }

    pub fn carbs(&self) -> f64 {
        self.carbs
    }

    pub fn icr(&self) -> i32 {
        self.icr
    }

    pub fn cf(&self) -> i32 {
        self.cf
    }

    pub fn from_settings(carbs: f64, settings: &Settings) -> Result<Self, CoreError> {
        estimate(
            carbs,
            settings.current_bs(),
            settings.target_bs(),
            settings.icr(),
            settings.cf(),
        )
    }
}

pub fn estimate(
    carbs: f64,
    current_bs: Option<i32>,
    target_bs: i32,
    icr: i32,
    cf: i32,
) -> Result<Estimate, CoreError> {
    if icr <= 0 {
        return Err(CoreError::invalid(format!("icr must be positive, got {icr}")));
    }
    if cf <= 0 {
        return Err(CoreError::invalid(format!("cf must be positive, got {cf}")));
    }
    if !carbs.is_finite() || carbs < 0.0 {
        return Err(CoreError::invalid(format!(
            "carbs must be a non-negative number, got {carbs}"
        )));
    }

    let meal_bolus = carbs / f64::from(icr);
    let correction_bolus = match current_bs {
        Some(bs) if bs > target_bs => f64::from(bs - target_bs) / f64::from(cf),
        _ => 0.0,
    };

    Ok(Estimate {
        total: round1(meal_bolus + correction_bolus),
        meal_bolus,
        correction_bolus,
        carbs,
        icr,
        cf,
    })
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod estimate_tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn meal_and_correction_add_up() {
        let e = estimate(80.0, Some(180), 100, 10, 50).unwrap();
        assert!((e.meal_bolus() - 8.0).abs() < EPS);
        assert!((e.correction_bolus() - 1.6).abs() < EPS);
        assert!((e.total() - 9.6).abs() < EPS);
        assert_eq!(e.icr(), 10);
        assert_eq!(e.cf(), 50);
    }

    #[test]
    fn meal_bolus_is_exact_before_rounding() {
        for (carbs, icr) in [(0.0, 1), (45.0, 7), (33.3, 12), (1000.0, 30)] {
            let e = estimate(carbs, None, 100, icr, 50).unwrap();
            assert_eq!(e.meal_bolus(), carbs / f64::from(icr));
            assert_eq!(e.correction_bolus(), 0.0);
        }
    }

    #[test]
    fn no_correction_at_or_below_target() {
        for bs in [40, 99, 100] {
            let e = estimate(30.0, Some(bs), 100, 10, 50).unwrap();
            assert_eq!(e.correction_bolus(), 0.0);
            assert!((e.total() - 3.0).abs() < EPS);
        }
    }

    #[test]
    fn total_rounds_but_unrounded_is_kept() {
        let e = estimate(45.0, None, 100, 7, 50).unwrap();
        assert!((e.total() - 6.4).abs() < EPS);
        assert!((e.unrounded_total() - 45.0 / 7.0).abs() < EPS);
    }

    #[test]
    fn rejects_bad_inputs() {
        for r in [
            estimate(10.0, None, 100, 0, 50),
            estimate(10.0, None, 100, -3, 50),
            estimate(10.0, None, 100, 10, 0),
            estimate(-1.0, None, 100, 10, 50),
            estimate(f64::NAN, None, 100, 10, 50),
        ] {
            assert!(matches!(r, Err(CoreError::InvalidParameter(_))));
        }
    }

    #[test]
    fn from_settings_uses_snapshot_values() {
        let s = Settings::new(15, 40, 110, Some(190)).unwrap();
        let e = Estimate::from_settings(60.0, &s).unwrap();
        assert!((e.meal_bolus() - 4.0).abs() < EPS);
        assert!((e.correction_bolus() - 2.0).abs() < EPS);
        assert!((e.total() - 6.0).abs() < EPS);
    }
}
