mod common;

use chrono::NaiveDate;
use common::{cruise_flight, limits_cht_400};
use edm_rs::{
    Channel, FileHeader, FormatSchema, FuelUnit, Result,
    blocks::FlightHeader,
    writer::{EdmWriter, FlightSpec},
};

#[test]
fn file_header_fields() -> Result<()> {
    let download = NaiveDate::from_ymd_opt(2023, 5, 17)
        .unwrap()
        .and_hms_opt(14, 5, 0)
        .unwrap();
    let mut writer = EdmWriter::new("N73EDM");
    writer
        .alarms(limits_cht_400())
        .download(download)
        .add_flight(cruise_flight(11, 20, |_| None))
        .add_flight(FlightSpec::empty(12))
        .add_flight(cruise_flight(13, 5, |_| None));
    let bytes = writer.finish()?;

    let header = FileHeader::parse(&bytes, &FormatSchema::V1)?;
    assert_eq!(header.registration, "N73EDM");
    assert_eq!(header.alarms.cht, 400);
    assert_eq!(header.alarms.oil_high, 230);
    assert!((header.alarms.volts_high - 15.5).abs() < 1e-9);
    assert_eq!(header.fuel.unit, Some(FuelUnit::Gph));
    assert_eq!(header.fuel.capacity, 50);
    assert_eq!(header.config.model, 830);
    assert_eq!(header.config.firmware, Some(108));
    assert_eq!(header.download, Some(download));

    let ids: Vec<u16> = header.flights.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![11, 12, 13]);
    assert_eq!(header.flights[1].size_bytes, 0);
    assert_eq!(header.flights[0].byte_offset, header.header_len);
    // flights are laid out back to back, sizes in whole words
    for pair in header.flights.windows(2) {
        assert_eq!(pair[1].byte_offset, pair[0].byte_offset + pair[0].size_bytes);
    }
    for f in &header.flights {
        assert_eq!(f.size_bytes % 2, 0);
    }
    let last = header.flights[2];
    assert_eq!(last.byte_offset + last.size_bytes, bytes.len());
    Ok(())
}

#[test]
fn flight_header_fields() -> Result<()> {
    let start = NaiveDate::from_ymd_opt(2021, 9, 3)
        .unwrap()
        .and_hms_opt(7, 42, 10)
        .unwrap();
    let mut f = FlightSpec::new(21, &[Channel::Cht1, Channel::FuelFlow])
        .start(start)
        .interval(2);
    f.push_values(&[(Channel::FuelFlow, 120)]);
    let mut writer = EdmWriter::new("N21");
    writer.add_flight(f);
    let bytes = writer.finish()?;

    let schema = FormatSchema::V1;
    let file = FileHeader::parse(&bytes, &schema)?;
    let info = file.flights[0];
    let h = FlightHeader::from_bytes(&bytes[info.byte_offset..], 21, &file, &schema)
        .expect("valid flight header");
    assert_eq!(h.id, 21);
    assert_eq!(h.interval_secs, 2);
    assert_eq!(h.start, Some(start));
    assert!(h.is_active(Channel::Egt1));
    assert!(h.is_active(Channel::FuelUsed));
    assert!(!h.is_active(Channel::Oil));
    assert_eq!(h.fuel_unit, Some(FuelUnit::Gph));
    Ok(())
}

#[test]
fn listing_describes_each_flight() -> Result<()> {
    let mut writer = EdmWriter::new("N2");
    writer
        .add_flight(cruise_flight(1, 3, |_| None))
        .add_flight(FlightSpec::empty(2));
    let header = FileHeader::parse(&writer.finish()?, &FormatSchema::V1)?;
    let text = header.describe(true);
    assert!(text.starts_with("N2"));
    assert!(text.contains("flight id 1"));
    assert!(text.contains("flight id 2: no data available"));
    assert!(!header.describe(false).contains("flight id"));
    Ok(())
}

#[test]
fn fuel_unit_line_round_trips() -> Result<()> {
    let mut writer = EdmWriter::new("N3");
    writer.fuel_unit(FuelUnit::Lph).add_flight(cruise_flight(1, 2, |_| None));
    let header = FileHeader::parse(&writer.finish()?, &FormatSchema::V1)?;
    assert_eq!(header.fuel.unit, Some(FuelUnit::Lph));
    assert_eq!(header.fuel.unit_code, FuelUnit::Lph.code());
    Ok(())
}

#[test]
fn oversized_flight_is_not_encoded() {
    let mut f = FlightSpec::new(1, &[Channel::Oil]);
    // alternating values defeat repeat compression
    for i in 0..30_000 {
        f.push_values(&[(Channel::Oil, 180 + (i % 2) as i32)]);
    }
    let mut writer = EdmWriter::new("N4");
    writer.add_flight(f);
    assert!(matches!(writer.finish(), Err(edm_rs::Error::Encode(_))));
}
