use super::decoder::decode_body;
use crate::{
    Corruption, Error, FlightHeader, Result,
    blocks::FileHeader,
    schema::FormatSchema,
    types::{DecodeStatus, FlightData},
};
use tracing::{debug, warn};

/// Decodes single flights out of a complete file buffer.
///
/// The decoder borrows the buffer and the already parsed [`FileHeader`]; it
/// keeps no state between calls. Caching and abort semantics live in
/// [`DecodeSession`](crate::DecodeSession).
#[derive(Debug, Clone, Copy)]
pub struct FlightRecordDecoder<'a> {
    bytes: &'a [u8],
    header: &'a FileHeader,
    schema: &'a FormatSchema,
}

impl<'a> FlightRecordDecoder<'a> {
    pub fn new(bytes: &'a [u8], header: &'a FileHeader, schema: &'a FormatSchema) -> Self {
        Self {
            bytes,
            header,
            schema,
        }
    }

    /// Decode the flight with the given id.
    ///
    /// # Returns
    /// * `Ok(FlightData)` - possibly partial; check [`FlightData::status`].
    /// * `Err(Error::FlightNotFound)` - the id is not in the flight index.
    /// * `Err(Error::NoFlightData)` - the index entry has size zero.
    /// * `Err(Error::TruncatedOrCorruptBody)` - the flight header itself is
    ///   unreadable, so not a single sample can be produced.
    pub fn decode(&self, id: u16) -> Result<FlightData> {
        let info = self.header.flight_info(id).ok_or(Error::FlightNotFound(id))?;
        if info.size_bytes == 0 {
            return Err(Error::NoFlightData(id));
        }

        let start = info.byte_offset.min(self.bytes.len());
        let declared_end = info.byte_offset.saturating_add(info.size_bytes);
        let end = declared_end.min(self.bytes.len());
        let flight_bytes = &self.bytes[start..end];
        let header_len = self.schema.flight_header_len;

        let flight_header =
            FlightHeader::from_bytes(flight_bytes, id, self.header, self.schema).map_err(
                |source| Error::TruncatedOrCorruptBody {
                    flight_id: id,
                    offset: start,
                    source,
                },
            )?;

        let body = flight_bytes.get(header_len..).unwrap_or_default();
        let mut decoded = decode_body(body, &flight_header, self.schema);

        // The buffer ended before the declared size; the records that were
        // there may have parsed cleanly but the flight is still cut short.
        if end < declared_end && decoded.fault.is_none() {
            warn!(
                flight = id,
                declared = info.size_bytes,
                available = end - start,
                "file ends inside flight"
            );
            decoded.fault = Some(Corruption::Truncated {
                needed: info.size_bytes,
                available: end - start,
            });
            decoded.status = DecodeStatus {
                complete: false,
                invalid: true,
            };
        }

        debug!(
            flight = id,
            samples = decoded.samples.len(),
            records = decoded.encoded_records,
            complete = decoded.status.complete,
            "decoded flight"
        );

        Ok(FlightData {
            header: flight_header,
            body: decoded.samples,
            status: decoded.status,
            fault: decoded.fault,
            encoded_records: decoded.encoded_records,
        })
    }
}

/// Decode one flight of `bytes` using an already parsed file header.
///
/// Convenience wrapper around [`FlightRecordDecoder::decode`].
pub fn parse_flight(
    bytes: &[u8],
    header: &FileHeader,
    id: u16,
    schema: &FormatSchema,
) -> Result<FlightData> {
    FlightRecordDecoder::new(bytes, header, schema).decode(id)
}
