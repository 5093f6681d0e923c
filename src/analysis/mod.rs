//! Threshold, point-event and sensor-availability scans over a decoded flight.
//!
//! Every scan is a single pass over [`FlightData::body`], deterministic and
//! free of side effects apart from diagnostics. A scan with nothing to report
//! returns an empty collection.
//!
//! Exceedance is strict: a sample exactly at its limit does not exceed.
//! Readings flagged not available, or channels the flight did not record,
//! never exceed.

mod na;
mod runs;

pub use na::na_intervals;

use crate::{
    Channel,
    config::{AnalyzerConfig, EffectiveLimits, FuelFlowTiers},
    types::{FlightData, FlightSampleRecord, NaInterval, PointEvent, WarnInterval},
    units::{FuelUnit, convert_fuel_flow},
};
use runs::RunMerger;
use std::collections::BTreeMap;

/// Scans over one decoded flight.
///
/// Limits come from the flight's own header unless overridden in the
/// [`AnalyzerConfig`].
#[derive(Debug, Clone)]
pub struct TimeSeriesAnalyzer<'a> {
    flight: &'a FlightData,
    limits: EffectiveLimits,
    fuel_unit: Option<FuelUnit>,
    tiers: FuelFlowTiers,
}

impl<'a> TimeSeriesAnalyzer<'a> {
    pub fn new(flight: &'a FlightData, config: &AnalyzerConfig) -> Self {
        Self {
            flight,
            limits: config.limits.apply(&flight.header.alarms),
            fuel_unit: config.fuel_unit,
            tiers: config.fuel_flow_tiers.clone(),
        }
    }

    #[inline]
    pub fn flight(&self) -> &'a FlightData {
        self.flight
    }

    /// Limits in effect after overrides.
    #[inline]
    pub fn limits(&self) -> &EffectiveLimits {
        &self.limits
    }

    /// Merge every sample for which `exceeds` holds into intervals valued at
    /// `limit`.
    fn threshold_scan(
        &self,
        scan: &'static str,
        limit: i32,
        exceeds: impl Fn(&FlightSampleRecord) -> bool,
    ) -> Vec<WarnInterval> {
        let mut merger = RunMerger::new(scan, self.flight.interval_secs());
        for sample in &self.flight.body {
            let class = usize::from(exceeds(sample));
            merger.push(sample.index, sample.timestamp.is_some(), class, limit as f64);
        }
        merger.finish()
    }

    fn chts_above(sample: &FlightSampleRecord, limit: i32) -> usize {
        Channel::CHT
            .iter()
            .filter_map(|&c| sample.value(c))
            .filter(|&v| v > limit as f64)
            .count()
    }

    /// Intervals where any cylinder head temperature is above the CHT limit.
    pub fn cht_warn_intervals(&self) -> Vec<WarnInterval> {
        let limit = self.limits.cht;
        self.threshold_scan("cht", limit, |s| Self::chts_above(s, limit) > 0)
    }

    /// Intervals where oil temperature is below the low limit.
    pub fn oil_low_intervals(&self) -> Vec<WarnInterval> {
        let limit = self.limits.oil_low;
        self.threshold_scan("oil_low", limit, |s| {
            s.value(Channel::Oil).is_some_and(|v| v < limit as f64)
        })
    }

    /// Intervals where oil temperature is above the high limit.
    pub fn oil_high_intervals(&self) -> Vec<WarnInterval> {
        let limit = self.limits.oil_high;
        self.threshold_scan("oil_high", limit, |s| {
            s.value(Channel::Oil).is_some_and(|v| v > limit as f64)
        })
    }

    /// Fastest cylinder cooling between two samples, °F per minute.
    ///
    /// `None` when no cylinder has a valid reading in both samples.
    pub fn cooling_rate(&self, prev: &FlightSampleRecord, cur: &FlightSampleRecord) -> Option<f64> {
        let interval = f64::from(self.flight.interval_secs().max(1));
        Channel::CHT
            .iter()
            .filter_map(|&c| Some((prev.value(c)? - cur.value(c)?) * 60.0 / interval))
            .reduce(f64::max)
    }

    /// Intervals where a cylinder cools faster than the cooling limit.
    ///
    /// The first sample has no predecessor and never exceeds.
    pub fn cooling_intervals(&self) -> Vec<WarnInterval> {
        let limit = self.limits.cooling;
        let mut merger = RunMerger::new("cooling", self.flight.interval_secs());
        let mut prev: Option<&FlightSampleRecord> = None;
        for sample in &self.flight.body {
            let exceeds = prev
                .and_then(|p| self.cooling_rate(p, sample))
                .is_some_and(|rate| rate > limit as f64);
            merger.push(
                sample.index,
                sample.timestamp.is_some(),
                usize::from(exceeds),
                limit as f64,
            );
            prev = Some(sample);
        }
        merger.finish()
    }

    /// Difference between the hottest and the coldest valid EGT.
    ///
    /// `None` with fewer than two valid readings.
    pub fn egt_spread(sample: &FlightSampleRecord) -> Option<f64> {
        let mut valid = Channel::EGT.iter().filter_map(|&c| sample.value(c));
        let first = valid.next()?;
        let (min, max, n) = valid.fold((first, first, 1), |(lo, hi, n), v| {
            (lo.min(v), hi.max(v), n + 1)
        });
        (n >= 2).then_some(max - min)
    }

    /// Intervals where the EGT spread is above its limit.
    pub fn egt_spread_intervals(&self) -> Vec<WarnInterval> {
        let limit = self.limits.egt_spread;
        self.threshold_scan("egt_spread", limit, |s| {
            Self::egt_spread(s).is_some_and(|d| d > limit as f64)
        })
    }

    /// Fuel flow of a sample in the tier unit, for tier classification.
    ///
    /// Without an embedded unit the calibrated value is taken as-is.
    fn fuel_flow_in_tier_unit(&self, raw: i32) -> f64 {
        let header = &self.flight.header;
        match header.fuel_unit {
            Some(from) => {
                convert_fuel_flow(raw as f64, header.fuel_calibration, from, self.tiers.unit)
            }
            None => raw as f64 * header.fuel_calibration,
        }
    }

    /// Runs of samples in the same non-zero fuel-flow tier.
    ///
    /// A tier change starts a new interval. The interval value is the peak
    /// fuel flow of the run in the resolved output unit.
    pub fn fuel_flow_intervals(&self) -> Vec<WarnInterval> {
        let mut merger = RunMerger::new("fuel_flow", self.flight.interval_secs());
        for sample in &self.flight.body {
            let (class, value) = match sample.raw(Channel::FuelFlow) {
                Some(raw) => (
                    self.tiers.tier(self.fuel_flow_in_tier_unit(raw)),
                    self.flight.fuel_value(raw, self.fuel_unit).0,
                ),
                None => (0, 0.0),
            };
            merger.push(sample.index, sample.timestamp.is_some(), class, value);
        }
        merger.finish()
    }

    fn point_scan(&self, event: impl Fn(&FlightSampleRecord) -> Option<f64>) -> Vec<PointEvent> {
        self.flight
            .body
            .iter()
            .filter_map(|s| event(s).map(|value| PointEvent { index: s.index, value }))
            .collect()
    }

    /// Every sample with oil temperature above the high limit.
    pub fn oil_high_events(&self) -> Vec<PointEvent> {
        let limit = self.limits.oil_high as f64;
        self.point_scan(|s| s.value(Channel::Oil).filter(|&v| v > limit))
    }

    /// Every sample with oil temperature below the low limit.
    pub fn oil_low_events(&self) -> Vec<PointEvent> {
        let limit = self.limits.oil_low as f64;
        self.point_scan(|s| s.value(Channel::Oil).filter(|&v| v < limit))
    }

    /// Every sample with at least one CHT above the limit; the value is the
    /// number of cylinders above it.
    pub fn cht_warn_counts(&self) -> Vec<PointEvent> {
        let limit = self.limits.cht;
        self.point_scan(|s| match Self::chts_above(s, limit) {
            0 => None,
            n => Some(n as f64),
        })
    }

    /// Spans where each channel was not available.
    pub fn na_intervals(&self) -> BTreeMap<Channel, Vec<NaInterval>> {
        na_intervals(self.flight)
    }
}
