// blocks/flight_header.rs
use crate::{
    Channel, Corruption,
    blocks::common::{join_words, read_u8, read_u16, validate_buffer_size, validate_checksum},
    blocks::file_header::{AlarmLimits, FileHeader},
    schema::FormatSchema,
    units::FuelUnit,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

/// Fixed per-flight header preceding the delta-coded body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightHeader {
    pub id: u16,
    /// Feature flags declaring which channels were recorded.
    pub flags: u32,
    /// Channels activated by `flags`.
    pub active_channels: BTreeSet<Channel>,
    /// Nominal seconds between two samples.
    pub interval_secs: u16,
    /// Flight start; `None` when the packed date/time is not a valid instant.
    #[cfg_attr(feature = "serde", serde(with = "crate::export::timestamp"))]
    pub start: Option<NaiveDateTime>,
    /// Alarm thresholds in effect for this flight.
    pub alarms: AlarmLimits,
    /// Multiplier from a raw fuel channel count to fuel units.
    pub fuel_calibration: f64,
    /// Fuel unit embedded in the file header.
    pub fuel_unit: Option<FuelUnit>,
}

/// Unpack the `day | month << 5 | year << 9` date word.
pub fn unpack_date(word: u16, base_year: i32) -> Option<NaiveDate> {
    let day = (word & 0x1F) as u32;
    let month = ((word >> 5) & 0x0F) as u32;
    let year = base_year + (word >> 9) as i32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Unpack the `secs/2 | minute << 5 | hour << 11` time word.
pub fn unpack_time(word: u16) -> (u32, u32, u32) {
    let secs = (word & 0x1F) as u32 * 2;
    let minute = ((word >> 5) & 0x3F) as u32;
    let hour = (word >> 11) as u32;
    (hour, minute, secs)
}

/// Inverse of [`unpack_date`]; years before `base_year` clamp to it.
pub fn pack_date(date: NaiveDate, base_year: i32) -> u16 {
    use chrono::Datelike;
    let year = (date.year() - base_year).clamp(0, 0x7F) as u16;
    date.day() as u16 | (date.month() as u16) << 5 | year << 9
}

/// Inverse of [`unpack_time`]; odd seconds round down.
pub fn pack_time(time: NaiveDateTime) -> u16 {
    use chrono::Timelike;
    (time.second() / 2) as u16 | (time.minute() as u16) << 5 | (time.hour() as u16) << 11
}

impl FlightHeader {
    /// Decode the fixed flight header at the start of `bytes`.
    ///
    /// # Arguments
    /// * `bytes` - Slice beginning at the flight's index offset.
    /// * `expected_id` - Id from the flight index; a different stored id is corruption.
    /// * `file_header` - Supplies alarm limits and fuel configuration.
    /// * `schema` - Layout definition.
    pub fn from_bytes(
        bytes: &[u8],
        expected_id: u16,
        file_header: &FileHeader,
        schema: &FormatSchema,
    ) -> Result<Self, Corruption> {
        let len = schema.flight_header_len;
        validate_buffer_size(bytes, len)?;
        validate_checksum(
            read_u8(bytes, len - 1),
            schema.flight_header_checksum.compute(&bytes[..len - 1]),
        )?;

        let id = read_u16(bytes, 0);
        if id != expected_id {
            return Err(Corruption::FlightIdMismatch {
                expected: expected_id,
                actual: id,
            });
        }

        let flags = join_words(read_u16(bytes, 2), read_u16(bytes, 4));
        let interval_secs = match read_u16(bytes, 8) {
            0 => schema.default_interval_secs,
            n => n,
        };
        let (hour, minute, second) = unpack_time(read_u16(bytes, 12));
        let start = unpack_date(read_u16(bytes, 10), schema.base_year)
            .and_then(|d| d.and_hms_opt(hour, minute, second));

        let fuel_calibration = schema
            .def(Channel::FuelFlow)
            .map_or(1.0, |d| 1.0 / d.scale);

        Ok(Self {
            id,
            flags,
            active_channels: schema.active_channels(flags),
            interval_secs,
            start,
            alarms: file_header.alarms,
            fuel_calibration,
            fuel_unit: file_header.fuel.unit,
        })
    }

    /// Returns true if the flight recorded `channel`.
    #[inline]
    pub fn is_active(&self, channel: Channel) -> bool {
        self.active_channels.contains(&channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ChecksumKind;

    fn file_header() -> FileHeader {
        FileHeader {
            registration: String::from("N1"),
            alarms: AlarmLimits::default(),
            fuel: Default::default(),
            config: Default::default(),
            download: None,
            protocol: None,
            flights: Vec::new(),
            header_len: 0,
        }
    }

    fn raw_header(id: u16, flags: u32, interval: u16, date: u16, time: u16) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&id.to_be_bytes());
        b.extend_from_slice(&(flags as u16).to_be_bytes());
        b.extend_from_slice(&((flags >> 16) as u16).to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&interval.to_be_bytes());
        b.extend_from_slice(&date.to_be_bytes());
        b.extend_from_slice(&time.to_be_bytes());
        b.push(ChecksumKind::Xor.compute(&b));
        b
    }

    #[test]
    fn date_and_time_words() {
        let date = NaiveDate::from_ymd_opt(2022, 3, 14).unwrap();
        let word = pack_date(date, 2000);
        assert_eq!(unpack_date(word, 2000), Some(date));
        let t = date.and_hms_opt(17, 45, 32).unwrap();
        assert_eq!(unpack_time(pack_time(t)), (17, 45, 32));
        assert_eq!(unpack_date(0, 2000), None);
    }

    #[test]
    fn decodes_header() {
        let schema = FormatSchema::V1;
        let date = NaiveDate::from_ymd_opt(2021, 7, 4).unwrap();
        let start = date.and_hms_opt(9, 30, 0).unwrap();
        let flags = schema.flags_for(&[Channel::Cht1, Channel::Oil, Channel::FuelFlow]);
        let bytes = raw_header(42, flags, 0, pack_date(date, 2000), pack_time(start));
        let h = FlightHeader::from_bytes(&bytes, 42, &file_header(), &schema).unwrap();
        assert_eq!(h.id, 42);
        assert_eq!(h.flags, flags);
        assert_eq!(h.interval_secs, 6);
        assert_eq!(h.start, Some(start));
        assert!(h.is_active(Channel::FuelUsed));
        assert!(!h.is_active(Channel::Cht2));
        assert!((h.fuel_calibration - 0.1).abs() < 1e-12);
    }

    #[test]
    fn invalid_date_leaves_start_empty() {
        let bytes = raw_header(1, 0, 6, 0, 0);
        let h = FlightHeader::from_bytes(&bytes, 1, &file_header(), &FormatSchema::V1).unwrap();
        assert_eq!(h.start, None);
    }

    #[test]
    fn id_mismatch_is_corruption() {
        let bytes = raw_header(3, 0, 6, 0, 0);
        let err = FlightHeader::from_bytes(&bytes, 4, &file_header(), &FormatSchema::V1)
            .unwrap_err();
        assert_eq!(
            err,
            Corruption::FlightIdMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn checksum_and_length_are_checked() {
        let mut bytes = raw_header(3, 0, 6, 0, 0);
        bytes[8] ^= 0x01;
        let err = FlightHeader::from_bytes(&bytes, 3, &file_header(), &FormatSchema::V1)
            .unwrap_err();
        assert!(matches!(err, Corruption::ChecksumMismatch { .. }));

        let err = FlightHeader::from_bytes(&bytes[..10], 3, &file_header(), &FormatSchema::V1)
            .unwrap_err();
        assert!(matches!(err, Corruption::Truncated { needed: 15, .. }));
    }
}
