use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::CoreError;

pub const ICR_RANGE: RangeInclusive<i32> = 1..=30;
pub const CF_RANGE: RangeInclusive<i32> = 10..=150;
pub const TARGET_BS_RANGE: RangeInclusive<i32> = 70..=130;
pub const CURRENT_BS_RANGE: RangeInclusive<i32> = 40..=400;

/// Personal dosing parameters. Only constructible through validation, so
/// `icr` and `cf` are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    icr: i32,
    cf: i32,
    target_bs: i32,
    current_bs: Option<i32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            icr: 10,
            cf: 50,
            target_bs: 100,
            current_bs: None,
        }
    }
}

impl Settings {
    pub fn new(
        icr: i32,
        cf: i32,
        target_bs: i32,
        current_bs: Option<i32>,
    ) -> Result<Self, CoreError> {
        let mut s = Settings::default();
        s.set(SettingField::Icr, Some(icr))?;
        s.set(SettingField::CorrectionFactor, Some(cf))?;
        s.set(SettingField::TargetGlucose, Some(target_bs))?;
        s.set(SettingField::CurrentGlucose, current_bs)?;
        Ok(s)
    }

    pub fn icr(&self) -> i32 {
        self.icr
    }

    pub fn cf(&self) -> i32 {
        self.cf
    }

    pub fn target_bs(&self) -> i32 {
        self.target_bs
    }

    pub fn current_bs(&self) -> Option<i32> {
        self.current_bs
    }

    /// Copy of these settings carrying a different glucose reading.
    pub fn with_current_bs(self, current_bs: Option<i32>) -> Result<Self, CoreError> {
        let mut copy = self;
        copy.set(SettingField::CurrentGlucose, current_bs)?;
        Ok(copy)
    }

    fn set(&mut self, field: SettingField, value: Option<i32>) -> Result<(), CoreError> {
        match (field, value) {
            (SettingField::CurrentGlucose, None) => self.current_bs = None,
            (SettingField::CurrentGlucose, Some(v)) => {
                check(field, v, CURRENT_BS_RANGE)?;
                self.current_bs = Some(v);
            }
            (_, None) => {
                return Err(CoreError::invalid(format!("{field} requires a value")));
            }
            (SettingField::Icr, Some(v)) => {
                check(field, v, ICR_RANGE)?;
                self.icr = v;
            }
            (SettingField::CorrectionFactor, Some(v)) => {
                check(field, v, CF_RANGE)?;
                self.cf = v;
            }
            (SettingField::TargetGlucose, Some(v)) => {
                check(field, v, TARGET_BS_RANGE)?;
                self.target_bs = v;
            }
        }
        Ok(())
    }
}

fn check(field: SettingField, value: i32, range: RangeInclusive<i32>) -> Result<(), CoreError> {
    if range.contains(&value) {
        Ok(())
    } else {
        warn!(%field, value, "setting out of range");
        Err(CoreError::invalid(format!(
            "{field} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    Icr,
    CorrectionFactor,
    TargetGlucose,
    CurrentGlucose,
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingField::Icr => "icr",
            SettingField::CorrectionFactor => "cf",
            SettingField::TargetGlucose => "target_bs",
            SettingField::CurrentGlucose => "current_bs",
        };
        f.write_str(name)
    }
}

impl FromStr for SettingField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "icr" | "insulin_to_carb_ratio" => Ok(SettingField::Icr),
            "cf" | "correction_factor" => Ok(SettingField::CorrectionFactor),
            "target_bs" | "target_glucose" => Ok(SettingField::TargetGlucose),
            "current_bs" | "current_glucose" => Ok(SettingField::CurrentGlucose),
            other => Err(CoreError::invalid(format!("unknown setting {other:?}"))),
        }
    }
}

/// The session's live settings. Readers get value copies via `snapshot`.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    current: Settings,
}

impl SessionSettings {
    pub fn new(initial: Settings) -> Self {
        Self { current: initial }
    }

    /// Validates before committing; a rejected value leaves settings untouched.
    pub fn update(&mut self, field: SettingField, value: Option<i32>) -> Result<(), CoreError> {
        let mut next = self.current;
        next.set(field, value)?;
        self.current = next;
        debug!(%field, ?value, "setting updated");
        Ok(())
    }

    pub fn snapshot(&self) -> Settings {
        self.current
    }
}
