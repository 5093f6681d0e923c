use super::flight::FlightRecordDecoder;
use crate::{
    Corruption, Error, Result,
    analysis::TimeSeriesAnalyzer,
    blocks::FileHeader,
    config::AnalyzerConfig,
    export::DecodedFile,
    schema::FormatSchema,
    types::{DecodeStatus, FlightData},
};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One decode of one EDM file.
///
/// The session owns the file buffer, the parsed [`FileHeader`], the two
/// session-wide status flags and a cache of decoded flights. Each flight is
/// decoded at most once; faults are cached as well so a corrupt flight is not
/// re-read on every request.
///
/// # Example
///
/// ```no_run
/// use edm_rs::{AnalyzerConfig, DecodeSession};
///
/// # fn run(bytes: Vec<u8>) -> edm_rs::Result<()> {
/// let mut session = DecodeSession::new(bytes)?;
/// let status = session.decode_all();
/// if status.invalid {
///     eprintln!("file is damaged, reporting the flights before the damage");
/// }
/// for flight in session.flights() {
///     println!("{}", flight.summarize(None));
/// }
/// let analyzer = session.analyzer(7, &AnalyzerConfig::default())?;
/// for w in analyzer.cht_warn_intervals() {
///     println!("CHT > {} for {} s from sample {}", w.value, w.duration_secs, w.start_index);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DecodeSession {
    bytes: Vec<u8>,
    schema: FormatSchema,
    header: FileHeader,
    status: DecodeStatus,
    flights: BTreeMap<u16, FlightData>,
    faults: BTreeMap<u16, Corruption>,
}

impl DecodeSession {
    /// Parse the file header of `bytes` using [`FormatSchema::V1`].
    ///
    /// # Returns
    /// The session, or [`Error::InvalidHeader`] if the preamble is unusable.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        Self::with_schema(bytes, FormatSchema::V1)
    }

    /// Parse the file header of `bytes` using an explicit schema.
    pub fn with_schema(bytes: Vec<u8>, schema: FormatSchema) -> Result<Self> {
        let header = FileHeader::parse(&bytes, &schema)?;
        Ok(Self {
            bytes,
            schema,
            header,
            status: DecodeStatus::default(),
            flights: BTreeMap::new(),
            faults: BTreeMap::new(),
        })
    }

    #[inline]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    #[inline]
    pub fn schema(&self) -> &FormatSchema {
        &self.schema
    }

    /// Session-wide status flags.
    #[inline]
    pub fn status(&self) -> DecodeStatus {
        self.status
    }

    /// Decode every listed flight in index order.
    ///
    /// Flights with no recorded body are skipped. Decoding stops at the
    /// first flight that reports corruption; that flight and everything
    /// after it is left out of [`flights`](Self::flights). `complete` is set
    /// once every non-empty flight decoded cleanly.
    pub fn decode_all(&mut self) -> DecodeStatus {
        let ids: Vec<(u16, usize)> = self
            .header
            .flights
            .iter()
            .map(|f| (f.id, f.size_bytes))
            .collect();

        for (id, size) in ids {
            if size == 0 {
                info!(flight = id, "no data available");
                continue;
            }
            // Only corruption can fail here: the id comes from the index and
            // the size is non-zero.
            let clean = match self.flight(id) {
                Ok(flight) => !flight.status.invalid,
                Err(_) => false,
            };
            if !clean {
                info!(flight = id, "stopping at first invalid flight");
                return self.status;
            }
        }

        self.status.complete = !self.status.invalid;
        self.status
    }

    /// Decode (on first request) and return a flight.
    ///
    /// # Returns
    /// * `Ok(&FlightData)` - possibly partial; check its `status`.
    /// * `Err(Error::FlightNotFound)` / `Err(Error::NoFlightData)` - caller
    ///   errors, the session stays usable.
    /// * `Err(Error::TruncatedOrCorruptBody)` - the flight header is
    ///   unreadable. The session is marked invalid.
    pub fn flight(&mut self, id: u16) -> Result<&FlightData> {
        if let Some(source) = self.faults.get(&id) {
            return Err(Error::TruncatedOrCorruptBody {
                flight_id: id,
                offset: self.header.flight_info(id).map_or(0, |f| f.byte_offset),
                source: source.clone(),
            });
        }

        if !self.flights.contains_key(&id) {
            let decoder = FlightRecordDecoder::new(&self.bytes, &self.header, &self.schema);
            match decoder.decode(id) {
                Ok(flight) => {
                    if flight.status.invalid {
                        self.status.invalid = true;
                        self.status.complete = false;
                    }
                    self.flights.insert(id, flight);
                }
                Err(Error::TruncatedOrCorruptBody {
                    flight_id,
                    offset,
                    source,
                }) => {
                    warn!(flight = flight_id, offset, %source, "flight header unreadable");
                    self.status.invalid = true;
                    self.status.complete = false;
                    self.faults.insert(flight_id, source.clone());
                    return Err(Error::TruncatedOrCorruptBody {
                        flight_id,
                        offset,
                        source,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.flights.get(&id).ok_or(Error::FlightNotFound(id))
    }

    /// The reported flights: decoded flights in index order, truncated
    /// before the first flight that is invalid or not yet decoded
    /// cleanly. Empty flights are skipped.
    pub fn flights(&self) -> Vec<&FlightData> {
        let mut out = Vec::new();
        for info in &self.header.flights {
            if info.size_bytes == 0 {
                continue;
            }
            match self.flights.get(&info.id) {
                Some(flight) if !flight.status.invalid => out.push(flight),
                _ => break,
            }
        }
        out
    }

    /// Analyzer over one flight, decoding it first if needed.
    ///
    /// The configuration is checked with [`AnalyzerConfig::validate`]
    /// before the flight is touched.
    pub fn analyzer<'s>(
        &'s mut self,
        id: u16,
        config: &AnalyzerConfig,
    ) -> Result<TimeSeriesAnalyzer<'s>> {
        config.validate()?;
        let flight = self.flight(id)?;
        Ok(TimeSeriesAnalyzer::new(flight, config))
    }

    /// Structured view of the header and the reported flights.
    pub fn decoded_file(&self) -> DecodedFile<'_> {
        DecodedFile {
            header: &self.header,
            flights: self.flights(),
        }
    }

    /// Pretty-printed JSON of [`decoded_file`](Self::decoded_file).
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String> {
        self.decoded_file().to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Channel,
        writer::{EdmWriter, FlightSpec},
    };

    fn oil_flight(id: u16, n: usize) -> FlightSpec {
        let mut f = FlightSpec::new(id, &[Channel::Oil]);
        for i in 0..n {
            f.push_values(&[(Channel::Oil, 150 + i as i32)]);
        }
        f
    }

    fn build(flights: Vec<FlightSpec>) -> Vec<u8> {
        let mut w = EdmWriter::new("N42");
        for f in flights {
            w.add_flight(f);
        }
        w.finish().unwrap()
    }

    #[test]
    fn decode_all_skips_empty_and_completes() {
        let bytes = build(vec![FlightSpec::empty(1), oil_flight(2, 4), oil_flight(3, 2)]);
        let mut session = DecodeSession::new(bytes).unwrap();
        let status = session.decode_all();
        assert_eq!(
            status,
            DecodeStatus {
                complete: true,
                invalid: false
            }
        );
        let ids: Vec<_> = session.flights().iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn flight_is_cached() {
        let bytes = build(vec![oil_flight(2, 4)]);
        let mut session = DecodeSession::new(bytes).unwrap();
        let first = session.flight(2).unwrap().clone();
        // wipe the buffer: a second decode would now fail
        session.bytes.truncate(session.header.header_len);
        assert_eq!(session.flight(2).unwrap(), &first);
    }

    #[test]
    fn not_found_keeps_session_usable() {
        let bytes = build(vec![oil_flight(2, 4)]);
        let mut session = DecodeSession::new(bytes).unwrap();
        let err = session.flight(99).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(session.status(), DecodeStatus::default());
        assert_eq!(session.header().flights.len(), 1);
        assert!(session.flight(2).is_ok());
    }

    #[test]
    fn stops_at_first_invalid_flight() {
        let mut bytes = build(vec![oil_flight(1, 3), oil_flight(2, 3), oil_flight(3, 3)]);
        let header = FileHeader::parse(&bytes, &FormatSchema::V1).unwrap();
        // break the first record checksum of flight 2
        let at = header.flights[1].byte_offset + FormatSchema::V1.flight_header_len;
        bytes[at + 7] ^= 0x55;
        let mut session = DecodeSession::new(bytes).unwrap();
        let status = session.decode_all();
        assert!(status.invalid);
        assert!(!status.complete);
        let ids: Vec<_> = session.flights().iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec![1]);
        // flight 3 was never attempted
        assert!(!session.flights.contains_key(&3));
    }

    #[test]
    fn analyzer_rejects_descending_tiers() {
        let bytes = build(vec![oil_flight(2, 4)]);
        let mut session = DecodeSession::new(bytes).unwrap();
        let mut config = AnalyzerConfig::default();
        config.fuel_flow_tiers.thresholds = vec![15.0, 10.0, 5.0];
        assert!(matches!(
            session.analyzer(2, &config),
            Err(Error::InvalidConfig(_))
        ));
        // nothing was decoded for the rejected request
        assert!(session.flights.is_empty());
        assert!(session.analyzer(2, &AnalyzerConfig::default()).is_ok());
    }

    #[test]
    fn header_fault_is_cached() {
        let mut bytes = build(vec![oil_flight(1, 3)]);
        let header = FileHeader::parse(&bytes, &FormatSchema::V1).unwrap();
        bytes[header.flights[0].byte_offset + 3] ^= 0x01;
        let mut session = DecodeSession::new(bytes).unwrap();
        assert!(matches!(
            session.flight(1),
            Err(Error::TruncatedOrCorruptBody { flight_id: 1, .. })
        ));
        assert!(session.status().invalid);
        assert!(matches!(
            session.flight(1),
            Err(Error::TruncatedOrCorruptBody { .. })
        ));
        assert!(session.flights().is_empty());
    }
}
