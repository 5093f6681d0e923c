// src/blocks/mod.rs

// ============================================================================
// Submodules
// ============================================================================
//
// Each module decodes one fixed structure of an EDM file. None of them keep
// state between calls; delta reconstruction lives in `parsing::decoder`.

mod common;
mod data_record;
mod file_header;
mod flight_header;

// Byte helpers
pub use common::{join_words, read_u8, read_u16, validate_buffer_size, validate_checksum};

// File preamble and flight index
pub use file_header::{AlarmLimits, FileHeader, FlightInfo, FuelConfig, RecorderConfig};

// Per-flight structures
pub use data_record::{DataRecord, RECORD_PREFIX_LEN};
pub use flight_header::{FlightHeader, pack_date, pack_time, unpack_date, unpack_time};
