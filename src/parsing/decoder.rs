//! Delta-record reconstruction.
//!
//! A flight body only stores changes. [`decode_body`] keeps the running value
//! of every channel slot, applies each [`DataRecord`] in turn and emits one
//! immutable [`FlightSampleRecord`] per tick.

use crate::{
    Corruption, FlightHeader,
    blocks::DataRecord,
    schema::FormatSchema,
    types::{DecodeStatus, FlightSampleRecord, Reading},
};
use chrono::TimeDelta;
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Everything recovered from one flight body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDecode {
    pub samples: Vec<FlightSampleRecord>,
    pub status: DecodeStatus,
    pub fault: Option<Corruption>,
    /// Offset within the body where decoding stopped.
    pub stopped_at: usize,
    pub encoded_records: usize,
}

/// Running per-slot channel state.
struct ChannelState<'a> {
    header: &'a FlightHeader,
    values: Vec<i32>,
    /// Active channels with their slot and scale, resolved once.
    active: Vec<(crate::Channel, usize, f64)>,
}

impl<'a> ChannelState<'a> {
    fn new(schema: &'a FormatSchema, header: &'a FlightHeader) -> Self {
        let active = header
            .active_channels
            .iter()
            .filter_map(|&c| schema.def(c).map(|d| (c, d.slot as usize, d.scale)))
            .collect();
        Self {
            header,
            values: vec![schema.initial_value; schema.slot_count()],
            active,
        }
    }

    fn apply(&mut self, record: &DataRecord) {
        for &(slot, delta) in &record.deltas {
            self.values[slot] = self.values[slot].wrapping_add(delta);
        }
    }

    fn snapshot(&self, index: usize, na_slots: &[usize]) -> FlightSampleRecord {
        let readings = self
            .active
            .iter()
            .map(|&(channel, slot, scale)| {
                let raw = self.values[slot];
                let reading = Reading {
                    raw,
                    value: raw as f64 / scale,
                    valid: !na_slots.contains(&slot),
                };
                (channel, reading)
            })
            .collect::<BTreeMap<_, _>>();
        FlightSampleRecord {
            index,
            timestamp: self.timestamp(index),
            readings,
        }
    }

    fn timestamp(&self, index: usize) -> Option<chrono::NaiveDateTime> {
        let offset = i64::try_from(index)
            .ok()?
            .checked_mul(self.header.interval_secs as i64)?;
        self.header
            .start?
            .checked_add_signed(TimeDelta::try_seconds(offset)?)
    }

    fn repeat(&self, previous: Option<&FlightSampleRecord>, index: usize) -> FlightSampleRecord {
        match previous {
            Some(prev) => FlightSampleRecord {
                index,
                timestamp: self.timestamp(index),
                readings: prev.readings.clone(),
            },
            None => self.snapshot(index, &[]),
        }
    }
}

/// Decode a flight body into its sample sequence.
///
/// # Arguments
/// * `body` - Exactly the declared body bytes (flight size minus header).
/// * `header` - The already decoded flight header; supplies active channels,
///   interval and start time.
/// * `schema` - Layout definition.
///
/// # Returns
/// A [`BodyDecode`]. Decoding never fails: a truncated or malformed record
/// ends decoding with `status.invalid` set and the fault recorded, keeping
/// the samples decoded so far. `status.complete` is set only when `body` was
/// consumed exactly, allowing for one alignment pad byte.
pub fn decode_body(body: &[u8], header: &FlightHeader, schema: &FormatSchema) -> BodyDecode {
    let mut state = ChannelState::new(schema, header);
    let mut samples: Vec<FlightSampleRecord> = Vec::new();
    let mut pos = 0;
    let mut encoded_records = 0;
    let pad = schema.size_unit.saturating_sub(1);

    if header.start.is_none() {
        warn!(flight = header.id, "flight start unknown, samples have no timestamps");
    }

    let fault = loop {
        let remaining = body.len() - pos;
        if remaining == 0 || remaining <= pad && body[pos..].iter().all(|&b| b == 0) {
            break None;
        }
        let record = match DataRecord::from_bytes(&body[pos..], schema) {
            Ok(record) => record,
            Err(fault) => break Some(fault),
        };
        trace!(
            flight = header.id,
            offset = pos,
            repeat = record.repeat_count,
            changed = record.deltas.len(),
            "data record"
        );

        for _ in 0..record.repeat_count {
            let copy = state.repeat(samples.last(), samples.len());
            samples.push(copy);
        }
        state.apply(&record);
        samples.push(state.snapshot(samples.len(), &record.na_slots));

        pos += record.len;
        encoded_records += 1;
    };

    let status = DecodeStatus {
        complete: fault.is_none(),
        invalid: fault.is_some(),
    };
    if let Some(fault) = &fault {
        warn!(
            flight = header.id,
            offset = pos,
            samples = samples.len(),
            %fault,
            "flight body corrupt, keeping partial data"
        );
    }

    BodyDecode {
        samples,
        status,
        fault,
        stopped_at: pos,
        encoded_records,
    }
}
