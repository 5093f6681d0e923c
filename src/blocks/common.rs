// blocks/common.rs
//! Byte parsing helpers shared by the block decoders.
//!
//! The binary parts of an EDM file are big-endian. All readers here assume
//! the caller already validated the buffer length with
//! [`validate_buffer_size`].

use crate::Corruption;

// ============================================================================
// Byte Parsing Helpers
// ============================================================================

/// Read a big-endian u16 from a byte slice at the given offset.
///
/// # Panics
/// Panics if `offset + 2 > bytes.len()`.
#[inline]
pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

/// Read a u8 from a byte slice at the given offset.
#[inline]
pub fn read_u8(bytes: &[u8], offset: usize) -> u8 {
    bytes[offset]
}

/// Combine two 16-bit words into the 32-bit feature flags, low word first.
#[inline]
pub fn join_words(lo: u16, hi: u16) -> u32 {
    (hi as u32) << 16 | lo as u32
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a buffer has at least `expected` bytes.
///
/// Returns `Err(Corruption::Truncated)` if the buffer is too small.
#[inline]
pub fn validate_buffer_size(bytes: &[u8], expected: usize) -> Result<(), Corruption> {
    if bytes.len() < expected {
        return Err(Corruption::Truncated {
            needed: expected,
            available: bytes.len(),
        });
    }
    Ok(())
}

/// Validate a stored checksum byte against the computed one.
#[inline]
pub fn validate_checksum(stored: u8, computed: u8) -> Result<(), Corruption> {
    if stored != computed {
        return Err(Corruption::ChecksumMismatch { stored, computed });
    }
    Ok(())
}
