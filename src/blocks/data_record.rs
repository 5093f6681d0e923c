// blocks/data_record.rs
use crate::{
    Corruption,
    blocks::common::{read_u8, read_u16, validate_buffer_size, validate_checksum},
    schema::FormatSchema,
};

/// Fixed prefix of every record: two copies of the decode flags and the
/// repeat count.
pub const RECORD_PREFIX_LEN: usize = 5;

/// One delta-coded data record as stored in a flight body.
///
/// A record only describes what changed since the previous tick; applying
/// it to the running channel state is the job of
/// [`decode_body`](crate::parsing::decoder::decode_body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    pub decode_flags: u16,
    /// Number of times the previous snapshot repeats before this record.
    pub repeat_count: u8,
    /// Signed change per channel slot, ascending slot order.
    pub deltas: Vec<(usize, i32)>,
    /// Slots whose sensor reported no value for this tick.
    pub na_slots: Vec<usize>,
    /// Encoded length including the checksum byte.
    pub len: usize,
}

impl DataRecord {
    /// Parse the record at the start of `bytes`.
    ///
    /// # Returns
    /// The decoded record, or the [`Corruption`] that prevents decoding it:
    /// truncation, disagreeing or unknown decode flags, a delta for a slot
    /// the schema does not define, or a checksum mismatch.
    pub fn from_bytes(bytes: &[u8], schema: &FormatSchema) -> Result<Self, Corruption> {
        validate_buffer_size(bytes, RECORD_PREFIX_LEN)?;

        let first = read_u16(bytes, 0);
        let second = read_u16(bytes, 2);
        if first != second {
            return Err(Corruption::DecodeFlagsMismatch { first, second });
        }
        let unknown = first & !schema.known_decode_flags();
        if unknown != 0 {
            return Err(Corruption::UnknownDecodeFlags(unknown));
        }
        let repeat_count = read_u8(bytes, 4);

        let groups: Vec<usize> = (0..schema.group_count as usize)
            .filter(|g| first & (1 << g) != 0)
            .collect();
        let has_na = first & schema.na_flag != 0;
        let wide = first & schema.wide_flag != 0;

        let n = groups.len();
        let flags_len = n * if has_na { 3 } else { 2 };
        validate_buffer_size(bytes, RECORD_PREFIX_LEN + flags_len)?;

        let field_at = RECORD_PREFIX_LEN;
        let sign_at = field_at + n;
        let na_at = sign_at + n;

        let changed: usize = (0..n)
            .map(|k| read_u8(bytes, field_at + k).count_ones() as usize)
            .sum();
        let width = if wide { 2 } else { 1 };
        let len = RECORD_PREFIX_LEN + flags_len + changed * width + 1;
        validate_buffer_size(bytes, len)?;

        let mut deltas = Vec::with_capacity(changed);
        let mut na_slots = Vec::new();
        let mut pos = RECORD_PREFIX_LEN + flags_len;
        for (k, &group) in groups.iter().enumerate() {
            let field = read_u8(bytes, field_at + k);
            let sign = read_u8(bytes, sign_at + k);
            let na = if has_na { read_u8(bytes, na_at + k) } else { 0 };
            for bit in 0..8 {
                let mask = 1u8 << bit;
                let slot = group * 8 + bit;
                if (field | na) & mask != 0 && schema.channel_at(slot).is_none() {
                    return Err(Corruption::UndefinedChannel(slot));
                }
                if field & mask != 0 {
                    let magnitude = if wide {
                        read_u16(bytes, pos) as i32
                    } else {
                        read_u8(bytes, pos) as i32
                    };
                    pos += width;
                    let delta = if sign & mask != 0 { -magnitude } else { magnitude };
                    deltas.push((slot, delta));
                }
                if na & mask != 0 {
                    na_slots.push(slot);
                }
            }
        }

        validate_checksum(
            read_u8(bytes, len - 1),
            schema.record_checksum.compute(&bytes[..len - 1]),
        )?;

        Ok(Self {
            decode_flags: first,
            repeat_count,
            deltas,
            na_slots,
            len,
        })
    }
}
