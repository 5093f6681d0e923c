//! Error types for EDM decoding.
//!
//! This module defines the [`Error`] enum returned by fallible operations and
//! the [`Corruption`] enum describing why a single flight could not be decoded
//! completely.
//!
//! Only two conditions are meant to reach the caller as hard failures:
//! [`Error::InvalidHeader`], which makes the whole file unusable, and
//! [`Error::FlightNotFound`], which is a caller input error. Body corruption
//! is reported through [`DecodeStatus`](crate::DecodeStatus) flags instead.
//!
//! # Example
//!
//! ```no_run
//! use edm_rs::{DecodeSession, Error, Result};
//!
//! fn print_flight(bytes: Vec<u8>, id: u16) -> Result<()> {
//!     let mut session = DecodeSession::new(bytes)?;
//!     match session.flight(id) {
//!         Ok(flight) => println!("{}", flight.describe(None)),
//!         Err(Error::FlightNotFound(id)) => {
//!             println!("flight id {id} not found");
//!             println!("{}", session.header().describe(true));
//!         }
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Errors that can occur while decoding an EDM file.
#[derive(Error, Debug)]
pub enum Error {
    /// The file preamble is missing, malformed or fails its checksum.
    ///
    /// This is fatal for the whole file.
    #[error("invalid header at line {line}: {reason}")]
    InvalidHeader {
        /// 1-based header line where the problem was detected.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The requested flight id is not listed in the flight index.
    #[error("flight id {0} not found")]
    FlightNotFound(u16),

    /// The flight is listed but has no recorded body.
    #[error("flight id {0}: no data available")]
    NoFlightData(u16),

    /// The flight header could not be read, so no samples exist for it.
    #[error("flight id {flight_id} is corrupt at byte {offset}: {source}")]
    TruncatedOrCorruptBody {
        /// Flight whose data is corrupt.
        flight_id: u16,
        /// Absolute byte offset in the file where decoding stopped.
        offset: usize,
        /// Underlying fault.
        #[source]
        source: Corruption,
    },

    /// The fixture writer was given a value it cannot encode.
    #[error("cannot encode: {0}")]
    Encode(String),

    /// An analyzer configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Structured serialization failed.
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_header(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            line,
            reason: reason.into(),
        }
    }

    /// Returns true if the caller can recover by picking another flight.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FlightNotFound(_) | Self::NoFlightData(_))
    }
}

/// Why a flight stopped decoding before its declared size was consumed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Corruption {
    /// Fewer bytes remained than the next structure needs.
    #[error("truncated: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// The two copies of a record's decode flags disagree.
    #[error("decode flags mismatch: {first:#06x} != {second:#06x}")]
    DecodeFlagsMismatch { first: u16, second: u16 },

    /// A record sets decode flag bits the schema does not define.
    #[error("unknown decode flag bits {0:#06x}")]
    UnknownDecodeFlags(u16),

    /// A record carries a delta for a channel slot the schema does not define.
    #[error("delta for undefined channel slot {0}")]
    UndefinedChannel(usize),

    /// A stored checksum does not match the computed one.
    #[error("checksum mismatch: stored {stored:#04x}, computed {computed:#04x}")]
    ChecksumMismatch { stored: u8, computed: u8 },

    /// The flight header carries a different id than its index entry.
    #[error("flight header id {actual} does not match index id {expected}")]
    FlightIdMismatch { expected: u16, actual: u16 },
}

/// A specialized Result type for EDM operations.
pub type Result<T> = core::result::Result<T, Error>;
