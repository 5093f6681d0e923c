#![forbid(unsafe_code)]

//! # edm-rs
//!
//! A Rust library for decoding engine-monitor (EDM) flight-recorder dumps and
//! analyzing the recorded time series.
//!
//! An EDM file is an ASCII preamble carrying the aircraft configuration and a
//! flight index, followed by one binary block per flight. Each flight block is
//! a fixed header and a stream of delta-coded records, one tick every few
//! seconds, holding exhaust gas and cylinder head temperatures, oil
//! temperature, fuel flow and a handful of other channels.
//!
//! ## Features
//!
//! - **Decoding**: Parse the file header and any flight into immutable
//!   per-tick samples with N/A flags
//! - **Corruption handling**: Damaged flights keep their decodable prefix and
//!   are reported through status flags instead of errors
//! - **Analysis**: Warning intervals (CHT, oil, cooling rate, EGT spread,
//!   fuel-flow tiers), point events and sensor-unavailable spans
//! - **Views**: Plain-text descriptions and a JSON view of the whole file
//! - **Writing**: Build fixture files in the same layout
//!
//! ## Quick Start
//!
//! ```no_run
//! use edm_rs::{AnalyzerConfig, DecodeSession, Error, Result};
//!
//! fn main() -> Result<()> {
//!     let bytes = std::fs::read("flight.jpi").expect("readable file");
//!     let mut session = DecodeSession::new(bytes)?;
//!     session.decode_all();
//!
//!     match session.analyzer(227, &AnalyzerConfig::default()) {
//!         Ok(analyzer) => {
//!             println!("{}", analyzer.flight().describe(None));
//!             println!("{}", analyzer.describe(false));
//!         }
//!         Err(Error::FlightNotFound(id)) => {
//!             println!("flight id {id} not found");
//!             println!("{}", session.describe(None));
//!         }
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | File header, flight header and data record decoders |
//! | [`parsing`] | Delta reconstruction, flight lookup and [`DecodeSession`] |
//! | [`analysis`] | [`TimeSeriesAnalyzer`] scans |
//! | [`schema`] | The versioned binary layout, [`FormatSchema`] |
//! | [`units`] | Fuel unit conversion and duration formatting |
//! | [`config`] | [`AnalyzerConfig`] |
//! | [`export`] | Structured view for serialization |
//! | [`writer`] | Fixture writer |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! Only an unusable file header and caller errors (unknown or empty flight
//! id) are returned as [`Error`]. A flight whose body is truncated or
//! malformed is still returned, with [`DecodeStatus::invalid`] set and the
//! cause in [`FlightData::fault`].
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.

pub mod analysis;
pub mod blocks;
pub mod config;
pub mod error;
pub mod export;
pub mod parsing;
pub mod schema;
pub mod units;
pub mod writer;

mod channel;
mod describe;
mod types;

// Re-export commonly used types at the crate root
pub use analysis::TimeSeriesAnalyzer;
pub use blocks::{AlarmLimits, FileHeader, FlightHeader, FlightInfo};
pub use channel::Channel;
pub use config::{AnalyzerConfig, FuelFlowTiers, LimitOverrides};
pub use error::{Corruption, Error, Result};
pub use export::DecodedFile;
pub use parsing::{DecodeSession, FlightRecordDecoder, parse_flight};
pub use schema::FormatSchema;
pub use types::{
    DecodeStatus, FlightData, FlightSampleRecord, NaInterval, PointEvent, Reading, WarnInterval,
};
pub use units::{FuelUnit, LITERS_PER_GALLON, convert_fuel_flow, format_duration, resolve_fuel_unit};
