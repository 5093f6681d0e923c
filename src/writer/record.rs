// Encoding of flight headers and delta records
use super::FlightSpec;
use crate::{
    Error, Result,
    blocks::{pack_date, pack_time},
    schema::FormatSchema,
};

/// Encode the fixed flight header.
fn encode_header(flight: &FlightSpec, schema: &FormatSchema) -> Vec<u8> {
    let (date, time) = match flight.start {
        Some(start) => (pack_date(start.date(), schema.base_year), pack_time(start)),
        None => (0, 0),
    };
    let mut b = Vec::with_capacity(schema.flight_header_len);
    for word in [
        flight.id,
        flight.flags as u16,
        (flight.flags >> 16) as u16,
        0,
        flight.interval_secs,
        date,
        time,
    ] {
        b.extend_from_slice(&word.to_be_bytes());
    }
    b.push(schema.flight_header_checksum.compute(&b));
    b
}

/// Encode one record: `repeat` copies of the previous snapshot, then `deltas`
/// applied with `na` slots flagged.
fn encode_record(
    out: &mut Vec<u8>,
    deltas: &[(usize, i32)],
    na: &[usize],
    repeat: u8,
    schema: &FormatSchema,
) -> Result<()> {
    let max = deltas.iter().map(|&(_, d)| d.unsigned_abs()).max().unwrap_or(0);
    if max > u32::from(u16::MAX) {
        return Err(Error::Encode(format!("delta {max} exceeds 16 bits")));
    }
    let wide = max > u32::from(u8::MAX);

    let groups = schema.group_count as usize;
    let mut field = vec![0u8; groups];
    let mut sign = vec![0u8; groups];
    let mut na_bits = vec![0u8; groups];
    for &(slot, delta) in deltas {
        field[slot / 8] |= 1 << (slot % 8);
        if delta < 0 {
            sign[slot / 8] |= 1 << (slot % 8);
        }
    }
    for &slot in na {
        na_bits[slot / 8] |= 1 << (slot % 8);
    }

    let selected: Vec<usize> = (0..groups)
        .filter(|&g| field[g] != 0 || na_bits[g] != 0)
        .collect();
    let mut decode = selected.iter().fold(0u16, |acc, &g| acc | 1 << g);
    if wide {
        decode |= schema.wide_flag;
    }
    if !na.is_empty() {
        decode |= schema.na_flag;
    }

    let start = out.len();
    out.extend_from_slice(&decode.to_be_bytes());
    out.extend_from_slice(&decode.to_be_bytes());
    out.push(repeat);
    out.extend(selected.iter().map(|&g| field[g]));
    out.extend(selected.iter().map(|&g| sign[g]));
    if !na.is_empty() {
        out.extend(selected.iter().map(|&g| na_bits[g]));
    }
    // deltas are sorted by slot, which is the order the decoder reads them
    for &(_, delta) in deltas {
        let magnitude = delta.unsigned_abs();
        if wide {
            out.extend_from_slice(&(magnitude as u16).to_be_bytes());
        } else {
            out.push(magnitude as u8);
        }
    }
    let checksum = schema.record_checksum.compute(&out[start..]);
    out.push(checksum);
    Ok(())
}

/// Encode a flight: header, records with repeat compression, word padding.
pub(super) fn encode_flight(flight: &FlightSpec, schema: &FormatSchema) -> Result<Vec<u8>> {
    let mut out = encode_header(flight, schema);

    let seed = vec![schema.initial_value; schema.slot_count()];
    let mut state = seed.clone();
    // The decoder repeats the previous snapshot, or the seed state before
    // the first record.
    let mut previous: (&[i32], &[usize]) = (&seed, &[]);
    let mut pending: u8 = 0;

    for (values, na) in &flight.samples {
        if (values.as_slice(), na.as_slice()) == previous {
            if pending == u8::MAX {
                encode_record(&mut out, &[], previous.1, pending - 1, schema)?;
                pending = 0;
            }
            pending += 1;
            continue;
        }

        let deltas: Vec<(usize, i32)> = values
            .iter()
            .zip(&state)
            .enumerate()
            .filter(|(_, (v, s))| v != s)
            .map(|(slot, (v, s))| (slot, v.wrapping_sub(*s)))
            .collect();
        encode_record(&mut out, &deltas, na, pending, schema)?;
        pending = 0;
        state.clone_from(values);
        previous = (values.as_slice(), na.as_slice());
    }

    // A record without deltas re-emits the previous snapshot once itself,
    // so it carries one repeat less and the same N/A flags.
    if pending > 0 {
        encode_record(&mut out, &[], previous.1, pending - 1, schema)?;
    }

    if out.len() % schema.size_unit != 0 {
        out.resize(out.len().next_multiple_of(schema.size_unit), 0);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Channel,
        blocks::{DataRecord, FileHeader},
        parsing::parse_flight,
        writer::EdmWriter,
    };

    fn records(bytes: &[u8], schema: &FormatSchema) -> Vec<DataRecord> {
        let mut pos = schema.flight_header_len;
        let mut out = Vec::new();
        while bytes.len() - pos > 1 {
            let rec = DataRecord::from_bytes(&bytes[pos..], schema).unwrap();
            pos += rec.len;
            out.push(rec);
        }
        out
    }

    #[test]
    fn long_steady_run_splits_repeat_counts() {
        let schema = FormatSchema::V1;
        let mut f = FlightSpec::new(1, &[Channel::Oil]);
        for _ in 0..600 {
            f.push_values(&[(Channel::Oil, 180)]);
        }
        let encoded = encode_flight(&f, &schema).unwrap();
        let recs = records(&encoded, &schema);
        let repeats: Vec<u8> = recs.iter().map(|r| r.repeat_count).collect();
        assert_eq!(repeats, vec![0, 254, 254, 88]);

        let mut writer = EdmWriter::new("N1");
        writer.add_flight(f);
        let bytes = writer.finish().unwrap();
        let header = FileHeader::parse(&bytes, &schema).unwrap();
        let flight = parse_flight(&bytes, &header, 1, &schema).unwrap();
        assert_eq!(flight.body.len(), 600);
        assert!(flight.body.iter().all(|s| s.raw(Channel::Oil) == Some(180)));
    }

    #[test]
    fn repeated_na_state_is_preserved() {
        let schema = FormatSchema::V1;
        let mut f = FlightSpec::new(1, &[Channel::Oil]);
        for _ in 0..4 {
            f.push_sample(&[(Channel::Oil, 180)], &[Channel::Oil]);
        }
        let mut writer = EdmWriter::new("N1");
        writer.add_flight(f);
        let bytes = writer.finish().unwrap();
        let header = FileHeader::parse(&bytes, &schema).unwrap();
        let flight = parse_flight(&bytes, &header, 1, &schema).unwrap();
        assert_eq!(flight.body.len(), 4);
        assert!(flight.body.iter().all(|s| s.is_na(Channel::Oil)));
    }

    #[test]
    fn large_steps_use_wide_deltas() {
        let schema = FormatSchema::V1;
        let mut f = FlightSpec::new(1, &[Channel::Egt1]);
        f.push_values(&[(Channel::Egt1, 1400)]);
        f.push_values(&[(Channel::Egt1, 1390)]);
        let encoded = encode_flight(&f, &schema).unwrap();
        let recs = records(&encoded, &schema);
        assert_ne!(recs[0].decode_flags & schema.wide_flag, 0);
        assert_eq!(recs[0].deltas, vec![(0, 1400 - schema.initial_value)]);
        assert_eq!(recs[1].decode_flags & schema.wide_flag, 0);
        assert_eq!(recs[1].deltas, vec![(0, -10)]);
    }

    #[test]
    fn oversized_delta_is_rejected() {
        let mut f = FlightSpec::new(1, &[Channel::Rpm]);
        f.push_values(&[(Channel::Rpm, 70_000)]);
        let err = encode_flight(&f, &FormatSchema::V1).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn header_without_start_stores_zero_date() {
        let f = FlightSpec::new(9, &[]).without_start().interval(4);
        let b = encode_header(&f, &FormatSchema::V1);
        assert_eq!(b.len(), 15);
        assert_eq!(&b[0..2], &9u16.to_be_bytes());
        assert_eq!(&b[8..10], &4u16.to_be_bytes());
        assert_eq!(&b[10..14], &[0, 0, 0, 0]);
    }
}
