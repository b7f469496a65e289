//! Packed setpoint codec for the `TmpOvr1` property.
//!
//! The thermostat stores both setpoints in a single integer: heat in the
//! high byte, cool in the low byte. 72°F heat / 74°F cool is
//! `0x48`/`0x4A`, packed as `0x484A` = 18506.

use crate::{Error, Result};

/// Pack heat and cool setpoints into the wire value.
pub fn encode(heat: i64, cool: i64) -> Result<i64> {
    if !(0..=255).contains(&heat) || !(0..=255).contains(&cool) {
        return Err(Error::EncodingRange { heat, cool });
    }
    Ok((heat << 8) | cool)
}

/// Split a packed value into (heat, cool).
pub fn decode(packed: i64) -> (i64, i64) {
    ((packed >> 8) & 0xFF, packed & 0xFF)
}

/// Like [`decode`], but a zero low byte yields `cool = heat`.
///
/// Some firmware revisions report the override with an empty cool byte;
/// the state refresh path uses this variant to avoid a phantom 0°F cool
/// setpoint.
pub fn decode_with_fallback(packed: i64) -> (i64, i64) {
    let (heat, cool) = decode(packed);
    if cool == 0 { (heat, heat) } else { (heat, cool) }
}
