//! Flight decoding on top of the block decoders.
//!
//! * [`decoder`] rebuilds per-tick snapshots from delta records.
//! * [`flight`] locates one flight in the file and decodes it.
//! * [`session`] owns a file, its status flags and the per-flight cache.

pub mod decoder;
pub mod flight;
pub mod session;

pub use flight::{FlightRecordDecoder, parse_flight};
pub use session::DecodeSession;
