//! Plain-text views of decoded data.
//!
//! Each view is a small [`Display`](fmt::Display) adapter; the public
//! `describe`/`summarize` methods render it into a `String`.

use crate::{
    DecodeSession, FlightHeader,
    analysis::TimeSeriesAnalyzer,
    blocks::FileHeader,
    types::{FlightData, NaInterval, WarnInterval},
    units::{FuelUnit, format_duration},
};
use core::fmt;

struct FileHeaderView<'a> {
    header: &'a FileHeader,
    include_flights: bool,
}

impl fmt::Display for FileHeaderView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.header;
        write!(f, "{}: model {}", h.registration, h.config.model)?;
        if let Some(fw) = h.config.firmware {
            write!(f, ", firmware {fw}")?;
        }
        if let Some(t) = h.download {
            write!(f, ", downloaded {}", t.format("%Y-%m-%d %H:%M"))?;
        }
        writeln!(f)?;

        let a = &h.alarms;
        writeln!(
            f,
            "alarms: volts {:.1}/{:.1}, DIF {}, CHT {}, CLD {}, TIT {}, oil {}..{}",
            a.volts_low, a.volts_high, a.egt_spread, a.cht, a.cooling, a.tit, a.oil_low, a.oil_high
        )?;
        match h.fuel.unit {
            Some(unit) => write!(f, "fuel: {unit}")?,
            None => write!(f, "fuel: unit code {}", h.fuel.unit_code)?,
        }
        writeln!(
            f,
            ", capacity {}, warning {}, K-factors {}/{}",
            h.fuel.capacity, h.fuel.warning, h.fuel.k_factor_1, h.fuel.k_factor_2
        )?;
        write!(f, "{} flights", h.flights.len())?;

        if self.include_flights {
            for info in &h.flights {
                writeln!(f)?;
                if info.size_bytes == 0 {
                    write!(f, "  flight id {}: no data available", info.id)?;
                } else {
                    write!(
                        f,
                        "  flight id {}: {} bytes at offset {}",
                        info.id, info.size_bytes, info.byte_offset
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl FileHeader {
    /// Render the header; optionally list every flight index entry.
    pub fn describe(&self, include_flights: bool) -> String {
        FileHeaderView {
            header: self,
            include_flights,
        }
        .to_string()
    }
}

impl fmt::Display for FlightHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flight id {}", self.id)?;
        match self.start {
            Some(start) => write!(f, ", {}", start.format("%Y-%m-%d %H:%M:%S"))?,
            None => write!(f, ", start unknown")?,
        }
        write!(f, ", interval {} s", self.interval_secs)
    }
}

struct Summary<'a> {
    flight: &'a FlightData,
    unit: Option<FuelUnit>,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flight = self.flight;
        write!(f, "{}", flight.header)?;
        match flight.duration() {
            Some(d) => write!(f, ", duration: {}", format_duration(d.num_seconds()))?,
            None => write!(f, ", duration: unknown")?,
        }
        if let Some((used, unit)) = flight.fuel_used(self.unit) {
            write!(
                f,
                ", fuel used: {used:6.1} {}",
                unit.map_or("", FuelUnit::volume_name)
            )?;
        }
        write!(f, ", {} data records", flight.body.len())?;
        if flight.status.invalid {
            write!(f, " (incomplete)")?;
        }
        Ok(())
    }
}

struct Details<'a> {
    flight: &'a FlightData,
    unit: Option<FuelUnit>,
}

impl fmt::Display for Details<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flight = self.flight;
        writeln!(
            f,
            "{}",
            Summary {
                flight,
                unit: self.unit
            }
        )?;
        match &flight.fault {
            Some(fault) => writeln!(f, "status: invalid, {fault}")?,
            None if flight.status.complete => writeln!(f, "status: complete")?,
            None => writeln!(f, "status: not decoded")?,
        }
        write!(f, "channels:")?;
        for channel in &flight.header.active_channels {
            write!(f, " {channel}")?;
        }
        writeln!(f)?;
        let a = &flight.header.alarms;
        write!(
            f,
            "limits: CHT {}, oil {}..{}, CLD {}, DIF {}",
            a.cht, a.oil_low, a.oil_high, a.cooling, a.egt_spread
        )?;
        let peak = flight
            .body
            .iter()
            .filter_map(|s| s.raw(crate::Channel::FuelFlow))
            .max();
        if let Some(peak) = peak {
            let (value, unit) = flight.fuel_value(peak, self.unit);
            write!(f, "\npeak fuel flow: {value:.1}")?;
            if let Some(unit) = unit {
                write!(f, " {unit}")?;
            }
        }
        Ok(())
    }
}

impl FlightData {
    /// One line: header, duration, fuel used and sample count.
    pub fn summarize(&self, unit: Option<FuelUnit>) -> String {
        Summary { flight: self, unit }.to_string()
    }

    /// Summary plus decode status, recorded channels and alarm limits.
    pub fn describe(&self, unit: Option<FuelUnit>) -> String {
        Details { flight: self, unit }.to_string()
    }

    fn after(&self, index: usize) -> String {
        self.elapsed(index)
            .map_or_else(|| String::from("-:--:--"), |d| format_duration(d.num_seconds()))
    }

    fn clock(&self, index: usize) -> String {
        self.body
            .get(index)
            .and_then(|s| s.timestamp)
            .map_or_else(|| String::from("invalid"), |t| t.format("%H:%M").to_string())
    }
}

struct Report<'r, 'a> {
    analyzer: &'r TimeSeriesAnalyzer<'a>,
    include_fuel_flow: bool,
}

impl Report<'_, '_> {
    fn intervals(
        &self,
        f: &mut fmt::Formatter<'_>,
        intervals: &[WarnInterval],
        label: impl Fn(&WarnInterval) -> String,
    ) -> fmt::Result {
        let flight = self.analyzer.flight();
        for w in intervals {
            writeln!(
                f,
                "{} after {} for {} seconds",
                label(w),
                flight.after(w.start_index),
                w.duration_secs
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.analyzer;
        let flight = a.flight();

        if self.include_fuel_flow {
            self.intervals(f, &a.fuel_flow_intervals(), |w| format!("Fuel flow {:.1}", w.value))?;
        }
        self.intervals(f, &a.cht_warn_intervals(), |w| {
            format!("CHT warning above {}°F", w.value)
        })?;
        self.intervals(f, &a.oil_low_intervals(), |w| {
            format!("Oil temperature below {}°F", w.value)
        })?;
        self.intervals(f, &a.oil_high_intervals(), |w| {
            format!("Oil temperature exceeded {}°F", w.value)
        })?;
        self.intervals(f, &a.cooling_intervals(), |w| {
            format!("Cooling rate above {}°F/min", w.value)
        })?;
        self.intervals(f, &a.egt_spread_intervals(), |w| {
            format!("EGT spread above {}°F", w.value)
        })?;
        for e in a.oil_high_events() {
            writeln!(
                f,
                "Oil temperature exceeded {}°F after {}",
                e.value,
                flight.after(e.index)
            )?;
        }
        for (channel, spans) in a.na_intervals() {
            for NaInterval { start, end } in spans {
                writeln!(
                    f,
                    "Sensor {channel} not available: from {} to {}",
                    flight.clock(start),
                    flight.clock(end)
                )?;
            }
        }
        Ok(())
    }
}

impl TimeSeriesAnalyzer<'_> {
    /// Render every warning interval, oil-high event and N/A span, one per
    /// line, with the elapsed time since the flight start.
    pub fn describe(&self, include_fuel_flow: bool) -> String {
        Report {
            analyzer: self,
            include_fuel_flow,
        }
        .to_string()
    }
}

impl DecodeSession {
    /// The file header followed by one summary line per reported flight.
    ///
    /// This is the listing to fall back to when a requested flight id does
    /// not exist.
    pub fn describe(&self, unit: Option<FuelUnit>) -> String {
        let unit = unit.or(self.header().fuel.unit);
        let mut out = self.header().describe(false);
        for flight in self.flights() {
            out.push('\n');
            out.push_str(&flight.summarize(unit));
        }
        out
    }
}
