//! EDM file writer.
//!
//! [`EdmWriter`] builds complete files in the [`FormatSchema::V1`] layout from
//! plain per-sample channel values. It exists to produce fixtures for tests
//! and benchmarks, so it favours a small API over configurability.
//!
//! # Layout produced
//!
//! ```text
//! $U / $A / $F / $T / $C lines     checksummed ASCII preamble
//! $D,<id>,<words>                  one per flight
//! $L,<count>                       terminator
//! flight*                          header, delta records, pad byte if odd
//! ```
//!
//! # Example
//!
//! ```
//! use edm_rs::{Channel, DecodeSession, writer::{EdmWriter, FlightSpec}};
//!
//! # fn main() -> edm_rs::Result<()> {
//! let mut flight = FlightSpec::new(1, &[Channel::Cht1, Channel::Oil]);
//! flight.push_values(&[(Channel::Cht1, 350), (Channel::Oil, 180)]);
//! flight.push_values(&[(Channel::Cht1, 352)]);
//!
//! let mut writer = EdmWriter::new("N12345");
//! writer.add_flight(flight);
//! let bytes = writer.finish()?;
//!
//! let mut session = DecodeSession::new(bytes)?;
//! let decoded = session.flight(1)?;
//! assert_eq!(decoded.body.len(), 2);
//! assert_eq!(decoded.body[1].raw(Channel::Oil), Some(180));
//! # Ok(())
//! # }
//! ```

mod record;

use crate::{
    Channel, Error, FuelUnit, Result,
    blocks::{AlarmLimits, FuelConfig},
    schema::{ChecksumKind, FormatSchema},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use record::encode_flight;

/// One flight to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSpec {
    pub id: u16,
    /// Feature flags stored in the flight header.
    pub flags: u32,
    /// Stored sample interval; zero lets the decoder use its default.
    pub interval_secs: u16,
    pub start: Option<NaiveDateTime>,
    /// Full slot state per sample plus the slots flagged not available.
    samples: Vec<(Vec<i32>, Vec<usize>)>,
    /// Write the index entry with size zero and no bytes.
    empty: bool,
}

impl FlightSpec {
    /// A flight recording `channels`, 6 s interval, starting 2022-01-01 12:00.
    pub fn new(id: u16, channels: &[Channel]) -> Self {
        Self {
            id,
            flags: FormatSchema::V1.flags_for(channels),
            interval_secs: 6,
            start: NaiveDate::from_ymd_opt(2022, 1, 1).and_then(|d| d.and_hms_opt(12, 0, 0)),
            samples: Vec::new(),
            empty: false,
        }
    }

    /// An index entry with no recorded data.
    pub fn empty(id: u16) -> Self {
        Self {
            empty: true,
            ..Self::new(id, &[])
        }
    }

    pub fn start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Store an all-zero date so the decoder cannot derive timestamps.
    pub fn without_start(mut self) -> Self {
        self.start = None;
        self
    }

    pub fn interval(mut self, secs: u16) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Number of samples pushed so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a sample. Channels not listed keep their previous raw value.
    pub fn push_values(&mut self, values: &[(Channel, i32)]) {
        self.push_sample(values, &[]);
    }

    /// Append a sample with some channels flagged not available.
    pub fn push_sample(&mut self, values: &[(Channel, i32)], not_available: &[Channel]) {
        let schema = FormatSchema::V1;
        let mut state = match self.samples.last() {
            Some((state, _)) => state.clone(),
            None => vec![schema.initial_value; schema.slot_count()],
        };
        for &(channel, raw) in values {
            if let Some(def) = schema.def(channel) {
                state[def.slot as usize] = raw;
            }
        }
        let mut na: Vec<usize> = not_available
            .iter()
            .filter_map(|&c| schema.def(c).map(|d| d.slot as usize))
            .collect();
        na.sort_unstable();
        na.dedup();
        self.samples.push((state, na));
    }
}

/// Builds a complete EDM file.
#[derive(Debug, Clone)]
pub struct EdmWriter {
    registration: String,
    alarms: AlarmLimits,
    fuel: FuelConfig,
    model: u16,
    firmware: u16,
    download: Option<NaiveDateTime>,
    flights: Vec<FlightSpec>,
}

impl EdmWriter {
    pub fn new(registration: &str) -> Self {
        Self {
            registration: registration.to_string(),
            alarms: AlarmLimits::default(),
            fuel: FuelConfig {
                unit: Some(FuelUnit::Gph),
                unit_code: FuelUnit::Gph.code(),
                capacity: 50,
                warning: 10,
                k_factor_1: 2950,
                k_factor_2: 2950,
            },
            model: 830,
            firmware: 108,
            download: None,
            flights: Vec::new(),
        }
    }

    pub fn alarms(&mut self, alarms: AlarmLimits) -> &mut Self {
        self.alarms = alarms;
        self
    }

    /// Fuel unit written to the `$F` line.
    pub fn fuel_unit(&mut self, unit: FuelUnit) -> &mut Self {
        self.fuel_unit_code(unit.code())
    }

    /// Raw fuel unit code written to the `$F` line; unknown codes are allowed.
    pub fn fuel_unit_code(&mut self, code: u16) -> &mut Self {
        self.fuel.unit = FuelUnit::from_code(code);
        self.fuel.unit_code = code;
        self
    }

    pub fn download(&mut self, at: NaiveDateTime) -> &mut Self {
        self.download = Some(at);
        self
    }

    pub fn add_flight(&mut self, flight: FlightSpec) -> &mut Self {
        self.flights.push(flight);
        self
    }

    /// Encode the file.
    ///
    /// # Returns
    /// The file bytes or [`Error::Encode`](crate::Error::Encode) when a
    /// sample holds a delta too large for the record format.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let schema = FormatSchema::V1;
        let mut bodies = Vec::with_capacity(self.flights.len());
        for flight in &self.flights {
            let bytes = if flight.empty {
                Vec::new()
            } else {
                encode_flight(flight, &schema)?
            };
            if bytes.len() / schema.size_unit > usize::from(u16::MAX) {
                return Err(Error::Encode(format!(
                    "flight {} is {} bytes, too large for the flight index",
                    flight.id,
                    bytes.len()
                )));
            }
            bodies.push(bytes);
        }

        let mut out = Vec::new();
        let mut push_line = |body: String| {
            let cs = ChecksumKind::Xor.compute(body.as_bytes());
            out.extend_from_slice(format!("${body}*{cs:02X}\r\n").as_bytes());
        };

        push_line(format!("U,{}", self.registration));
        let a = &self.alarms;
        push_line(format!(
            "A,{},{},{},{},{},{},{},{}",
            (a.volts_high * 10.0).round() as i32,
            (a.volts_low * 10.0).round() as i32,
            a.egt_spread,
            a.cht,
            a.cooling,
            a.tit,
            a.oil_high,
            a.oil_low
        ));
        let f = &self.fuel;
        push_line(format!(
            "F,{},{},{},{},{}",
            f.unit_code, f.capacity, f.warning, f.k_factor_1, f.k_factor_2
        ));
        if let Some(t) = self.download {
            push_line(format!(
                "T,{},{},{},{},{},0",
                t.month(),
                t.day(),
                t.year() % 100,
                t.hour(),
                t.minute()
            ));
        }
        let all_flags = self.flights.iter().fold(0u32, |acc, f| acc | f.flags);
        push_line(format!(
            "C,{},{},{},{}",
            self.model,
            all_flags & 0xFFFF,
            all_flags >> 16,
            self.firmware
        ));
        for (flight, body) in self.flights.iter().zip(&bodies) {
            push_line(format!("D,{},{}", flight.id, body.len() / schema.size_unit));
        }
        push_line(format!("L,{}", self.flights.len()));

        for body in bodies {
            out.extend_from_slice(&body);
        }
        Ok(out)
    }
}
