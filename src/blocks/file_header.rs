// blocks/file_header.rs
use crate::{
    Error, Result,
    blocks::common::join_words,
    schema::{ChecksumKind, FormatSchema},
    units::FuelUnit,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Alarm thresholds configured on the instrument (`$A` line).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlarmLimits {
    /// Bus voltage high alarm, volts.
    pub volts_high: f64,
    /// Bus voltage low alarm, volts.
    pub volts_low: f64,
    /// Maximum EGT spread (DIF) across cylinders, °F.
    pub egt_spread: i32,
    /// CHT high alarm, °F.
    pub cht: i32,
    /// Cooling rate alarm (CLD), °F per minute.
    pub cooling: i32,
    /// TIT high alarm, °F.
    pub tit: i32,
    /// Oil temperature high alarm, °F.
    pub oil_high: i32,
    /// Oil temperature low alarm, °F.
    pub oil_low: i32,
}

impl Default for AlarmLimits {
    fn default() -> Self {
        Self {
            volts_high: 15.5,
            volts_low: 12.0,
            egt_spread: 500,
            cht: 450,
            cooling: 60,
            tit: 1650,
            oil_high: 230,
            oil_low: 90,
        }
    }
}

/// Fuel flow configuration (`$F` line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuelConfig {
    /// Volume unit embedded in the file, if the code is known.
    pub unit: Option<FuelUnit>,
    /// Raw unit code as stored.
    pub unit_code: u16,
    /// Full tank capacity.
    pub capacity: u16,
    /// Low fuel warning level.
    pub warning: u16,
    /// Transducer K-factors, hundredths.
    pub k_factor_1: u16,
    pub k_factor_2: u16,
}

/// Instrument model and feature configuration (`$C` line).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecorderConfig {
    pub model: u16,
    /// Feature flags, same bit layout as the flight headers.
    pub flags: u32,
    /// Configuration words between the flags and the firmware version.
    pub extra: Vec<u16>,
    pub firmware: Option<u16>,
}

/// One entry of the flight index table (`$D` line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightInfo {
    pub id: u16,
    /// Declared size of the flight including its header; zero means no body.
    pub size_bytes: usize,
    /// Absolute offset of the flight header in the file.
    pub byte_offset: usize,
}

/// The file-level header: global configuration plus the flight index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileHeader {
    /// Aircraft registration (`$U` line).
    pub registration: String,
    pub alarms: AlarmLimits,
    pub fuel: FuelConfig,
    pub config: RecorderConfig,
    /// When the data was downloaded from the instrument (`$T` line).
    #[cfg_attr(feature = "serde", serde(with = "crate::export::timestamp"))]
    pub download: Option<NaiveDateTime>,
    /// Protocol number (`$P` line), when present.
    pub protocol: Option<u16>,
    /// Flight index in file order.
    pub flights: Vec<FlightInfo>,
    /// Length of the ASCII preamble in bytes.
    pub header_len: usize,
}

/// A single checksummed `$` line.
struct HeaderLine<'a> {
    number: usize,
    tag: &'a str,
    fields: Vec<&'a str>,
}

impl HeaderLine<'_> {
    fn field<T: core::str::FromStr>(&self, idx: usize) -> Result<T> {
        let raw = self.fields.get(idx).ok_or_else(|| {
            Error::invalid_header(
                self.number,
                format!("${} is missing field {}", self.tag, idx + 1),
            )
        })?;
        raw.trim().parse::<T>().map_err(|_| {
            Error::invalid_header(
                self.number,
                format!("${} field {} is not a number: {:?}", self.tag, idx + 1, raw),
            )
        })
    }

    fn numbers<T: core::str::FromStr>(&self) -> Result<Vec<T>> {
        (0..self.fields.len()).map(|i| self.field(i)).collect()
    }
}

/// Split off the next `$...*HH` line starting at `pos`.
///
/// Returns the parsed line and the offset just past its line break.
fn next_line(bytes: &[u8], pos: usize, number: usize) -> Result<(HeaderLine<'_>, usize)> {
    if bytes.get(pos) != Some(&b'$') {
        return Err(Error::invalid_header(number, "expected '$' at start of line"));
    }
    let newline = bytes[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| pos + p)
        .ok_or_else(|| Error::invalid_header(number, "unterminated header line"))?;
    let mut end = newline;
    if end > pos && bytes[end - 1] == b'\r' {
        end -= 1;
    }
    let raw = &bytes[pos + 1..end];
    let star = raw
        .iter()
        .rposition(|&b| b == b'*')
        .ok_or_else(|| Error::invalid_header(number, "missing checksum marker"))?;
    let body = &raw[..star];
    let stored = core::str::from_utf8(&raw[star + 1..])
        .ok()
        .filter(|s| s.len() == 2)
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or_else(|| Error::invalid_header(number, "malformed checksum"))?;
    let computed = ChecksumKind::Xor.compute(body);
    if stored != computed {
        return Err(Error::invalid_header(
            number,
            format!("checksum mismatch: stored {stored:02X}, computed {computed:02X}"),
        ));
    }
    let text = core::str::from_utf8(body)
        .map_err(|_| Error::invalid_header(number, "header line is not ASCII"))?;
    let mut parts = text.split(',');
    let tag = parts.next().unwrap_or_default();
    Ok((
        HeaderLine {
            number,
            tag,
            fields: parts.collect(),
        },
        newline + 1,
    ))
}

fn parse_alarms(line: &HeaderLine<'_>) -> Result<AlarmLimits> {
    Ok(AlarmLimits {
        volts_high: line.field::<i32>(0)? as f64 / 10.0,
        volts_low: line.field::<i32>(1)? as f64 / 10.0,
        egt_spread: line.field(2)?,
        cht: line.field(3)?,
        cooling: line.field(4)?,
        tit: line.field(5)?,
        oil_high: line.field(6)?,
        oil_low: line.field(7)?,
    })
}

fn parse_fuel(line: &HeaderLine<'_>) -> Result<FuelConfig> {
    let unit_code: u16 = line.field(0)?;
    Ok(FuelConfig {
        unit: FuelUnit::from_code(unit_code),
        unit_code,
        capacity: line.field(1)?,
        warning: line.field(2)?,
        k_factor_1: line.field(3)?,
        k_factor_2: line.field(4)?,
    })
}

fn parse_config(line: &HeaderLine<'_>) -> Result<RecorderConfig> {
    let words: Vec<u16> = line.numbers()?;
    if words.len() < 3 {
        return Err(Error::invalid_header(
            line.number,
            "$C needs model and two flag words",
        ));
    }
    let (firmware, extra) = match words[3..].split_last() {
        Some((last, rest)) => (Some(*last), rest.to_vec()),
        None => (None, Vec::new()),
    };
    Ok(RecorderConfig {
        model: words[0],
        flags: join_words(words[1], words[2]),
        extra,
        firmware,
    })
}

fn parse_download(line: &HeaderLine<'_>) -> Result<Option<NaiveDateTime>> {
    let month: u32 = line.field(0)?;
    let day: u32 = line.field(1)?;
    let year: i32 = line.field(2)?;
    let hour: u32 = line.field(3)?;
    let minute: u32 = line.field(4)?;
    let year = if year < 100 { 2000 + year } else { year };
    Ok(NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(hour, minute, 0)))
}

impl FileHeader {
    /// Parse the ASCII preamble and flight index of an EDM file.
    ///
    /// # Arguments
    /// * `bytes` - The complete file contents.
    /// * `schema` - Layout definition; used for the flight size unit.
    ///
    /// # Returns
    /// The decoded [`FileHeader`] or [`Error::InvalidHeader`] if the magic
    /// line is missing, a checksum fails, a field is malformed, the `$L`
    /// terminator is missing or a flight id repeats.
    pub fn parse(bytes: &[u8], schema: &FormatSchema) -> Result<Self> {
        if !bytes.starts_with(b"$U") {
            return Err(Error::invalid_header(1, "missing $U magic line"));
        }

        let mut registration = None;
        let mut alarms = None;
        let mut fuel = None;
        let mut config = None;
        let mut download = None;
        let mut protocol = None;
        let mut entries: Vec<(u16, usize, usize)> = Vec::new();

        let mut pos = 0;
        let mut number = 0;
        let header_len = loop {
            number += 1;
            if pos >= bytes.len() {
                return Err(Error::invalid_header(number, "missing $L terminator"));
            }
            let (line, next) = next_line(bytes, pos, number)?;
            pos = next;
            match line.tag {
                "U" => {
                    let name = line.fields.join(",");
                    registration = Some(name.trim_end_matches(['_', ' ']).trim().to_string());
                }
                "A" => alarms = Some(parse_alarms(&line)?),
                "F" => fuel = Some(parse_fuel(&line)?),
                "T" => download = parse_download(&line)?,
                "C" => config = Some(parse_config(&line)?),
                "P" => protocol = Some(line.field(0)?),
                "D" => {
                    let id: u16 = line.field(0)?;
                    let words: u16 = line.field(1)?;
                    entries.push((id, usize::from(words) * schema.size_unit, number));
                }
                "L" => break pos,
                other => debug!(tag = other, line = number, "skipping unknown header line"),
            }
        };

        let mut seen = BTreeSet::new();
        let mut offset = header_len;
        let mut flights = Vec::with_capacity(entries.len());
        for (id, size_bytes, line) in entries {
            if !seen.insert(id) {
                return Err(Error::invalid_header(
                    line,
                    format!("flight id {id} listed twice"),
                ));
            }
            flights.push(FlightInfo {
                id,
                size_bytes,
                byte_offset: offset,
            });
            offset = offset
                .checked_add(size_bytes)
                .ok_or_else(|| Error::invalid_header(line, "flight size overflows"))?;
        }

        let alarms = alarms.unwrap_or_else(|| {
            warn!("no $A line, using default alarm limits");
            AlarmLimits::default()
        });
        let fuel = fuel.unwrap_or_else(|| {
            warn!("no $F line, fuel unit unknown");
            FuelConfig::default()
        });
        let config = config.unwrap_or_else(|| {
            warn!("no $C line, recorder model unknown");
            RecorderConfig::default()
        });

        debug!(flights = flights.len(), header_len, "parsed file header");

        Ok(Self {
            registration: registration.unwrap_or_default(),
            alarms,
            fuel,
            config,
            download,
            protocol,
            flights,
            header_len,
        })
    }

    /// Look up a flight in the index table.
    pub fn flight_info(&self, id: u16) -> Option<&FlightInfo> {
        self.flights.iter().find(|f| f.id == id)
    }
}
