//! Fuel-flow unit conversion and duration formatting.

use core::fmt;

/// Liters in one US gallon.
pub const LITERS_PER_GALLON: f64 = 3.785411784;

/// Volume unit of the fuel-flow channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FuelUnit {
    /// Gallons per hour.
    Gph,
    /// Liters per hour.
    Lph,
}

impl FuelUnit {
    /// Map the unit code stored in the file header.
    ///
    /// Unknown codes mean the recorder did not embed a volume unit.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(FuelUnit::Gph),
            1 => Some(FuelUnit::Lph),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            FuelUnit::Gph => 0,
            FuelUnit::Lph => 1,
        }
    }

    /// Liters represented by one unit of volume.
    #[inline]
    fn liters(self) -> f64 {
        match self {
            FuelUnit::Gph => LITERS_PER_GALLON,
            FuelUnit::Lph => 1.0,
        }
    }

    /// Name of the volume, e.g. `"gallons"`.
    pub fn volume_name(self) -> &'static str {
        match self {
            FuelUnit::Gph => "gallons",
            FuelUnit::Lph => "liters",
        }
    }
}

impl fmt::Display for FuelUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelUnit::Gph => f.write_str("GPH"),
            FuelUnit::Lph => f.write_str("LPH"),
        }
    }
}

/// Convert a raw fuel value between units.
///
/// `calibration` turns the raw recorder count into `from` units; the result
/// is then scaled linearly into `to` units.
pub fn convert_fuel_flow(raw: f64, calibration: f64, from: FuelUnit, to: FuelUnit) -> f64 {
    let value = raw * calibration;
    if from == to {
        value
    } else {
        value * from.liters() / to.liters()
    }
}

/// Pick the output unit: explicit override, then the unit embedded in the
/// file, then none (report raw values).
pub fn resolve_fuel_unit(
    override_unit: Option<FuelUnit>,
    embedded: Option<FuelUnit>,
) -> Option<FuelUnit> {
    override_unit.or(embedded)
}

/// Format a number of seconds as `H:MM:SS`.
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    format!("{sign}{}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}
