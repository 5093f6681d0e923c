mod common;

use common::{cruise_flight, init_test_logging, scenario_file};
use edm_rs::{
    Corruption, DecodeSession, Error, FileHeader, FormatSchema,
    blocks::{DataRecord, FlightHeader},
    parse_flight,
    writer::EdmWriter,
};

fn three_flights() -> Vec<u8> {
    let mut writer = EdmWriter::new("N3");
    for id in 1..=3 {
        writer.add_flight(cruise_flight(id, 30, |_| None));
    }
    writer.finish().expect("fixture encodes")
}

#[test]
fn missing_magic_is_fatal() {
    let mut bytes = scenario_file();
    bytes[1] = b'X';
    let err = DecodeSession::new(bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidHeader { line: 1, .. }));
    assert!(!err.is_recoverable());
}

#[test]
fn header_checksum_mismatch_is_fatal() {
    let mut bytes = scenario_file();
    // first digit of the registration line
    let pos = bytes.iter().position(|&b| b == b'7').expect("digit in registration");
    bytes[pos] = b'8';
    let err = DecodeSession::new(bytes).unwrap_err();
    match err {
        Error::InvalidHeader { reason, .. } => assert!(reason.contains("checksum")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn truncated_file_keeps_partial_flight() {
    init_test_logging();
    let bytes = scenario_file();
    let cut = bytes.len() - 40;
    let mut session = DecodeSession::new(bytes[..cut].to_vec()).expect("header intact");
    let status = session.decode_all();
    assert!(status.invalid);
    assert!(!status.complete);

    let flight = session.flight(7).expect("flight header intact");
    assert!(flight.status.invalid);
    assert!(!flight.status.complete);
    assert!(!flight.body.is_empty());
    assert!(flight.body.len() < 100);
    assert!(matches!(flight.fault, Some(Corruption::Truncated { .. })));
    // samples that were decoded are still consecutive
    for (i, s) in flight.body.iter().enumerate() {
        assert_eq!(s.index, i);
    }
    // the partial flight is not part of the reported set
    assert!(session.flights().is_empty());
}

#[test]
fn malformed_record_stops_remaining_flights() {
    let mut bytes = three_flights();
    let header = FileHeader::parse(&bytes, &FormatSchema::V1).unwrap();
    let second = header.flights[1];
    // second copy of the first record's decode flags
    bytes[second.byte_offset + FormatSchema::V1.flight_header_len + 3] ^= 0x02;

    let mut session = DecodeSession::new(bytes).unwrap();
    let status = session.decode_all();
    assert!(status.invalid);

    let ids: Vec<u16> = session.flights().iter().map(|f| f.id()).collect();
    assert_eq!(ids, vec![1]);

    let flight = session.flight(2).unwrap();
    assert!(flight.body.is_empty());
    assert!(matches!(
        flight.fault,
        Some(Corruption::DecodeFlagsMismatch { .. })
    ));

    // later flights can still be requested explicitly
    let third = session.flight(3).unwrap();
    assert!(third.status.complete);
}

#[test]
fn flight_header_mismatch_is_reported_per_flight() {
    let mut bytes = three_flights();
    let header = FileHeader::parse(&bytes, &FormatSchema::V1).unwrap();
    let at = header.flights[2].byte_offset;
    // rewrite the stored id of flight 3 to 9, keeping the XOR checksum valid
    bytes[at + 1] ^= 3 ^ 9;
    bytes[at + 14] ^= 3 ^ 9;

    let err = parse_flight(&bytes, &header, 3, &FormatSchema::V1).unwrap_err();
    match err {
        Error::TruncatedOrCorruptBody { flight_id, source, .. } => {
            assert_eq!(flight_id, 3);
            assert_eq!(
                source,
                Corruption::FlightIdMismatch {
                    expected: 3,
                    actual: 9
                }
            );
        }
        other => panic!("unexpected error {other:?}"),
    }

    let mut session = DecodeSession::new(bytes).unwrap();
    let status = session.decode_all();
    assert!(status.invalid);
    assert_eq!(session.flights().len(), 2);
}

#[test]
fn record_lengths_account_for_declared_size() {
    let bytes = three_flights();
    let schema = FormatSchema::V1;
    let header = FileHeader::parse(&bytes, &schema).unwrap();
    for info in &header.flights {
        let flight = &bytes[info.byte_offset..info.byte_offset + info.size_bytes];
        FlightHeader::from_bytes(flight, info.id, &header, &schema).unwrap();

        let mut pos = schema.flight_header_len;
        let mut records = 0;
        while flight.len() - pos > 1 {
            let record = DataRecord::from_bytes(&flight[pos..], &schema).unwrap();
            pos += record.len;
            records += 1;
        }
        // at most one pad byte left over
        assert!(flight.len() - pos <= 1);

        let decoded = parse_flight(&bytes, &header, info.id, &schema).unwrap();
        assert_eq!(decoded.encoded_records, records);
        assert!(decoded.status.complete);
    }
}
