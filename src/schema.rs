//! Versioned description of the binary EDM layout.
//!
//! The vendor does not publish the format. Everything the decoders assume
//! about byte widths, bit positions and checksums lives in a
//! [`FormatSchema`] value so that it can be tested on its own and swapped
//! for another recorder generation without touching the decoding logic.
//!
//! # Version 1 layout
//!
//! ```text
//! file      := header-line+ flight*
//! header    := "$" tag "," fields "*" HH "\r\n"       HH = XOR of bytes between '$' and '*'
//! flight    := flight-header record* pad?             size declared by the "$D" line, in words
//! flight-header (15 bytes, big endian):
//!     id u16 | flags_lo u16 | flags_hi u16 | reserved u16 | interval u16
//!     | date u16 | time u16 | checksum u8 (XOR of the 14 bytes before it)
//! record    := decode u16 | decode u16 | repeat u8
//!              | field u8 * groups | sign u8 * groups | [na u8 * groups]
//!              | delta (u8 or u16) * set field bits | checksum u8 (wrapping sum)
//! ```
//!
//! Decode flag bits 0..3 select the channel groups present in a record, bit 14
//! widens every delta to 16 bits and bit 15 announces the N/A flag bytes.

use crate::Channel;
use std::collections::BTreeSet;

/// Checksum algorithm used over a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// XOR of all bytes.
    Xor,
    /// Wrapping 8-bit sum of all bytes.
    Sum,
}

impl ChecksumKind {
    /// Compute the checksum of `bytes`.
    pub fn compute(self, bytes: &[u8]) -> u8 {
        match self {
            ChecksumKind::Xor => bytes.iter().fold(0u8, |acc, &b| acc ^ b),
            ChecksumKind::Sum => bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)),
        }
    }
}

/// Placement and scaling of one channel inside a data record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelDef {
    /// Bit slot: `group * 8 + bit`.
    pub slot: u8,
    pub channel: Channel,
    /// Header feature flag that activates the channel; `None` means always.
    pub feature_bit: Option<u8>,
    /// Divisor turning the raw integer into the physical value.
    pub scale: f64,
}

const fn def(slot: u8, channel: Channel, feature_bit: Option<u8>, scale: f64) -> ChannelDef {
    ChannelDef {
        slot,
        channel,
        feature_bit,
        scale,
    }
}

/// Feature flag bits of the flight header (version 1).
pub mod feature {
    /// Cylinder `n` (0-based) carries EGT and CHT.
    pub const fn cylinder(n: u8) -> u8 {
        n
    }
    pub const OIL: u8 = 6;
    pub const TIT1: u8 = 7;
    pub const TIT2: u8 = 8;
    pub const OAT: u8 = 9;
    pub const IAT: u8 = 10;
    pub const CDT: u8 = 11;
    pub const VOLTS: u8 = 12;
    pub const FUEL_FLOW: u8 = 13;
    pub const RPM: u8 = 14;
    pub const MAP: u8 = 15;
    pub const CLD: u8 = 16;
    pub const HP: u8 = 17;
    pub const CARB: u8 = 18;
    pub const OIL_PRESSURE: u8 = 19;
}

const V1_CHANNELS: [ChannelDef; 28] = [
    // group 0
    def(0, Channel::Egt1, Some(feature::cylinder(0)), 1.0),
    def(1, Channel::Egt2, Some(feature::cylinder(1)), 1.0),
    def(2, Channel::Egt3, Some(feature::cylinder(2)), 1.0),
    def(3, Channel::Egt4, Some(feature::cylinder(3)), 1.0),
    def(4, Channel::Egt5, Some(feature::cylinder(4)), 1.0),
    def(5, Channel::Egt6, Some(feature::cylinder(5)), 1.0),
    def(6, Channel::Tit1, Some(feature::TIT1), 1.0),
    def(7, Channel::Tit2, Some(feature::TIT2), 1.0),
    // group 1
    def(8, Channel::Cht1, Some(feature::cylinder(0)), 1.0),
    def(9, Channel::Cht2, Some(feature::cylinder(1)), 1.0),
    def(10, Channel::Cht3, Some(feature::cylinder(2)), 1.0),
    def(11, Channel::Cht4, Some(feature::cylinder(3)), 1.0),
    def(12, Channel::Cht5, Some(feature::cylinder(4)), 1.0),
    def(13, Channel::Cht6, Some(feature::cylinder(5)), 1.0),
    def(14, Channel::Cld, Some(feature::CLD), 1.0),
    def(15, Channel::Oil, Some(feature::OIL), 1.0),
    // group 2
    def(16, Channel::Mark, None, 1.0),
    def(17, Channel::OilPressure, Some(feature::OIL_PRESSURE), 1.0),
    def(18, Channel::Cdt, Some(feature::CDT), 1.0),
    def(19, Channel::Iat, Some(feature::IAT), 1.0),
    def(20, Channel::Volts, Some(feature::VOLTS), 10.0),
    def(21, Channel::Oat, Some(feature::OAT), 1.0),
    def(22, Channel::FuelUsed, Some(feature::FUEL_FLOW), 10.0),
    def(23, Channel::FuelFlow, Some(feature::FUEL_FLOW), 10.0),
    // group 3, bits 4..7 unused
    def(24, Channel::Rpm, Some(feature::RPM), 1.0),
    def(25, Channel::Map, Some(feature::MAP), 10.0),
    def(26, Channel::Hp, Some(feature::HP), 1.0),
    def(27, Channel::Carb, Some(feature::CARB), 1.0),
];

/// A complete, versioned definition of the binary layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSchema {
    pub version: u16,
    /// Length of the fixed flight header in bytes.
    pub flight_header_len: usize,
    pub flight_header_checksum: ChecksumKind,
    pub record_checksum: ChecksumKind,
    /// Number of 8-channel groups a record can select.
    pub group_count: u8,
    /// Decode flag bit widening deltas to 16 bits.
    pub wide_flag: u16,
    /// Decode flag bit announcing N/A flag bytes.
    pub na_flag: u16,
    /// Value every channel holds before the first record.
    pub initial_value: i32,
    /// Sample interval used when a flight header stores zero.
    pub default_interval_secs: u16,
    /// Year stored as zero in the packed flight date.
    pub base_year: i32,
    /// Unit of the flight sizes in the index table, in bytes.
    pub size_unit: usize,
    pub channels: &'static [ChannelDef],
}

impl FormatSchema {
    pub const V1: FormatSchema = FormatSchema {
        version: 1,
        flight_header_len: 15,
        flight_header_checksum: ChecksumKind::Xor,
        record_checksum: ChecksumKind::Sum,
        group_count: 4,
        wide_flag: 1 << 14,
        na_flag: 1 << 15,
        initial_value: 0xF0,
        default_interval_secs: 6,
        base_year: 2000,
        size_unit: 2,
        channels: &V1_CHANNELS,
    };

    /// Mask of the decode flag bits that select groups.
    #[inline]
    pub fn group_mask(&self) -> u16 {
        (1u16 << self.group_count) - 1
    }

    /// Every decode flag bit this schema understands.
    #[inline]
    pub fn known_decode_flags(&self) -> u16 {
        self.group_mask() | self.wide_flag | self.na_flag
    }

    /// Number of channel slots addressable by a record.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.group_count as usize * 8
    }

    /// Channel definition at a slot, if any.
    pub fn channel_at(&self, slot: usize) -> Option<&ChannelDef> {
        self.channels.iter().find(|d| d.slot as usize == slot)
    }

    /// Definition of a channel, if this schema records it.
    pub fn def(&self, channel: Channel) -> Option<&ChannelDef> {
        self.channels.iter().find(|d| d.channel == channel)
    }

    /// Channels activated by a flight header's feature flags.
    pub fn active_channels(&self, flags: u32) -> BTreeSet<Channel> {
        self.channels
            .iter()
            .filter(|d| match d.feature_bit {
                Some(bit) => flags & (1u32 << bit) != 0,
                None => true,
            })
            .map(|d| d.channel)
            .collect()
    }

    /// Feature flags that activate exactly the given channels (plus the
    /// channels sharing their feature bits).
    pub fn flags_for(&self, channels: &[Channel]) -> u32 {
        channels
            .iter()
            .filter_map(|&c| self.def(c).and_then(|d| d.feature_bit))
            .fold(0u32, |acc, bit| acc | (1u32 << bit))
    }
}

impl Default for FormatSchema {
    fn default() -> Self {
        FormatSchema::V1
    }
}
