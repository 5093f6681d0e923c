//! Decoded flight data and the event types produced by the analyzer.

use crate::{
    Channel, Corruption, FlightHeader,
    units::{FuelUnit, convert_fuel_flow, resolve_fuel_unit},
};
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::BTreeMap;

/// One channel value at one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Accumulated integer as stored by the recorder.
    pub raw: i32,
    /// `raw` divided by the channel scale.
    pub value: f64,
    /// False when the sensor flagged the value as not available.
    pub valid: bool,
}

/// An immutable snapshot of all active channels at one sample tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightSampleRecord {
    /// Zero-based tick number within the flight.
    pub index: usize,
    /// `start + index * interval`, when the flight start is known.
    #[cfg_attr(feature = "serde", serde(with = "crate::export::timestamp"))]
    pub timestamp: Option<NaiveDateTime>,
    pub readings: BTreeMap<Channel, Reading>,
}

impl FlightSampleRecord {
    /// Scaled value of a channel, or `None` if inactive or not available.
    #[inline]
    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.readings
            .get(&channel)
            .filter(|r| r.valid)
            .map(|r| r.value)
    }

    /// Raw value of a channel, or `None` if inactive or not available.
    #[inline]
    pub fn raw(&self, channel: Channel) -> Option<i32> {
        self.readings.get(&channel).filter(|r| r.valid).map(|r| r.raw)
    }

    /// Returns true if the channel is active but flagged as not available.
    #[inline]
    pub fn is_na(&self, channel: Channel) -> bool {
        self.readings.get(&channel).is_some_and(|r| !r.valid)
    }
}

/// Outcome flags of a decode.
///
/// `complete` means the declared size was consumed exactly; `invalid` means
/// decoding stopped early on truncated or malformed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeStatus {
    pub complete: bool,
    pub invalid: bool,
}

/// A decoded flight: header plus the ordered sample sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightData {
    pub header: FlightHeader,
    pub body: Vec<FlightSampleRecord>,
    pub status: DecodeStatus,
    /// Why decoding stopped early, if it did.
    pub fault: Option<Corruption>,
    /// Number of physical records read (repeats expand to several samples).
    pub encoded_records: usize,
}

impl FlightData {
    #[inline]
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Nominal seconds between samples.
    #[inline]
    pub fn interval_secs(&self) -> u16 {
        self.header.interval_secs
    }

    /// Time between the first and the last sample.
    ///
    /// `None` if the flight has no samples or no derivable timestamps.
    pub fn duration(&self) -> Option<TimeDelta> {
        let first = self.body.first()?.timestamp?;
        let last = self.body.last()?.timestamp?;
        Some(last - first)
    }

    /// Time from the flight start to the sample at `index`.
    pub fn elapsed(&self, index: usize) -> Option<TimeDelta> {
        let start = self.header.start?;
        Some(self.body.get(index)?.timestamp? - start)
    }

    /// Convert a raw fuel channel count for display.
    ///
    /// Returns the value and the unit it is expressed in; the unit is `None`
    /// when the file does not embed one, in which case no conversion happens.
    pub fn fuel_value(&self, raw: i32, unit_override: Option<FuelUnit>) -> (f64, Option<FuelUnit>) {
        let calibrated = raw as f64 * self.header.fuel_calibration;
        match (self.header.fuel_unit, resolve_fuel_unit(unit_override, self.header.fuel_unit)) {
            (Some(from), Some(to)) => (
                convert_fuel_flow(raw as f64, self.header.fuel_calibration, from, to),
                Some(to),
            ),
            (embedded, _) => (calibrated, embedded),
        }
    }

    /// Fuel used over the flight: the last valid fuel-used reading.
    pub fn fuel_used(&self, unit_override: Option<FuelUnit>) -> Option<(f64, Option<FuelUnit>)> {
        let raw = self
            .body
            .iter()
            .rev()
            .find_map(|s| s.raw(Channel::FuelUsed))?;
        Some(self.fuel_value(raw, unit_override))
    }
}

/// A merged run of consecutive samples exceeding a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarnInterval {
    pub start_index: usize,
    pub duration_secs: u64,
    /// Threshold for alarm scans, peak value for fuel-flow tiers.
    pub value: f64,
}

/// A single-sample exceedance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointEvent {
    pub index: usize,
    pub value: f64,
}

/// Inclusive span of samples where a channel was not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NaInterval {
    pub start: usize,
    pub end: usize,
}

impl NaInterval {
    /// Flatten intervals into `[start, end, start, end, ...]`.
    pub fn flatten(intervals: &[NaInterval]) -> Vec<usize> {
        intervals.iter().flat_map(|i| [i.start, i.end]).collect()
    }
}
