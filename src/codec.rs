//! Conversion between host values and the register encoding used by the servos.
//!
//! Multi-byte registers are little endian.
//! Signed registers use a sign-magnitude encoding instead of two's complement:
//! the magnitude occupies the bits below the sign bit and the sign bit is set for negative values.

use crate::error::ValueOutOfRange;

/// The sign bit used by all 2-byte signed registers of the STS series.
pub const SIGN_BIT_WORD: u8 = 15;

/// The sign bit used by 1-byte signed registers.
pub const SIGN_BIT_BYTE: u8 = 7;

/// Encode a signed value in sign-magnitude format with the sign bit at `sign_bit`.
///
/// Fails if the magnitude of `value` does not fit in the bits below the sign bit.
pub fn to_wire_signed(value: i32, sign_bit: u8) -> Result<u16, ValueOutOfRange> {
	debug_assert!(sign_bit <= 15);
	let max = (1u32 << sign_bit) - 1;
	let magnitude = value.unsigned_abs();
	ValueOutOfRange::check(value, max)?;
	if value < 0 {
		Ok(magnitude as u16 | 1 << sign_bit)
	} else {
		Ok(magnitude as u16)
	}
}

/// Decode a sign-magnitude value with the sign bit at `sign_bit`.
///
/// Bits above the sign bit are ignored.
/// A set sign bit with a zero magnitude decodes to `0`.
pub fn from_wire_signed(raw: u16, sign_bit: u8) -> i32 {
	debug_assert!(sign_bit <= 15);
	let magnitude = i32::from(raw & ((1u16 << sign_bit) - 1));
	if raw & (1 << sign_bit) != 0 {
		-magnitude
	} else {
		magnitude
	}
}

/// Split a 16 bit value into its low and high byte.
pub fn split_low_high(raw: u16) -> (u8, u8) {
	((raw & 0xFF) as u8, (raw >> 8) as u8)
}

/// Join a low and high byte into a 16 bit value.
pub fn join_low_high(low: u8, high: u8) -> u16 {
	u16::from(low) | u16::from(high) << 8
}

/// Read a u16 in little endian format from a buffer.
pub(crate) fn read_u16_le(buffer: &[u8]) -> u16 {
	join_low_high(buffer[0], buffer[1])
}
