use crate::{
    Channel,
    types::{FlightData, NaInterval},
};
use std::collections::BTreeMap;

/// Spans where each active channel was flagged not available.
///
/// Each maximal run of invalid samples becomes one inclusive
/// [`NaInterval`]. Channels that never went missing have no entry.
pub fn na_intervals(flight: &FlightData) -> BTreeMap<Channel, Vec<NaInterval>> {
    let mut out: BTreeMap<Channel, Vec<NaInterval>> = BTreeMap::new();
    let mut open: BTreeMap<Channel, usize> = BTreeMap::new();

    for sample in &flight.body {
        for &channel in &flight.header.active_channels {
            let missing = sample.is_na(channel);
            match (missing, open.get(&channel).copied()) {
                (true, None) => {
                    open.insert(channel, sample.index);
                }
                (false, Some(start)) => {
                    open.remove(&channel);
                    out.entry(channel).or_default().push(NaInterval {
                        start,
                        end: sample.index - 1,
                    });
                }
                _ => {}
            }
        }
    }

    if let Some(last) = flight.body.last() {
        for (channel, start) in open {
            out.entry(channel).or_default().push(NaInterval {
                start,
                end: last.index,
            });
        }
    }
    out
}
