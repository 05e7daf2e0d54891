//! Encoding of instruction packets and streaming-safe decoding of status packets.

use super::{ErrorFlags, InstructionPacket, StatusPacket, HEADER_PREFIX, HEADER_SIZE, MAX_PARAMETERS};
use crate::error::{InvalidChecksum, PacketTooLong};

/// Compute the checksum of a packet body.
///
/// The body is everything between the header prefix and the checksum:
/// the ID, the length, the instruction or error byte and the parameters.
pub fn checksum(body: &[u8]) -> u8 {
	!body.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Encode an instruction packet into the exact bytes to put on the wire.
pub fn encode(packet: &InstructionPacket) -> Result<Vec<u8>, PacketTooLong> {
	let mut buffer = Vec::with_capacity(HEADER_SIZE + packet.length());
	encode_into(packet, &mut buffer)?;
	Ok(buffer)
}

/// Encode an instruction packet, replacing the contents of `buffer`.
///
/// On error, the buffer is left empty.
pub fn encode_into(packet: &InstructionPacket, buffer: &mut Vec<u8>) -> Result<(), PacketTooLong> {
	buffer.clear();
	PacketTooLong::check(packet.parameters().len(), MAX_PARAMETERS)?;

	buffer.extend_from_slice(&HEADER_PREFIX);
	buffer.push(packet.servo_id());
	buffer.push(packet.length() as u8);
	buffer.push(packet.instruction().id());
	buffer.extend_from_slice(packet.parameters());
	let checksum = checksum(&buffer[HEADER_PREFIX.len()..]);
	buffer.push(checksum);
	Ok(())
}

/// A status packet decoded from the start of a buffer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
	/// The decoded packet.
	pub packet: StatusPacket,

	/// The number of garbage bytes skipped before the packet.
	pub garbage: usize,

	/// The length of the packet on the wire, including header and checksum.
	pub len: usize,
}

impl Frame {
	/// The total number of bytes of the buffer used up by this frame.
	pub fn consumed(&self) -> usize {
		self.garbage + self.len
	}
}

/// Failed to decode a status packet from a buffer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FrameError {
	/// The buffer does not hold a complete packet yet.
	///
	/// The first `garbage` bytes can never be part of a packet and may be discarded.
	/// The remaining bytes should be kept while waiting for more data.
	Incomplete { garbage: usize },

	/// The buffer holds no (partial) header at all, every byte is garbage.
	HeaderNotFound { garbage: usize },

	/// A complete packet was found, but the checksum does not match.
	///
	/// The packet is reported with `checksum_valid` set to false.
	BadChecksum {
		packet: StatusPacket,
		checksum: InvalidChecksum,
		garbage: usize,
		len: usize,
	},
}

impl FrameError {
	/// The number of bytes that can be discarded from the start of the buffer.
	pub fn consumed(&self) -> usize {
		match self {
			Self::Incomplete { garbage } => *garbage,
			Self::HeaderNotFound { garbage } => *garbage,
			Self::BadChecksum { garbage, len, .. } => garbage + len,
		}
	}
}

/// Decode the first status packet in `buffer`.
///
/// Leading garbage is skipped.
/// If the buffer holds only part of a packet, [`FrameError::Incomplete`] is returned
/// and the same call can be repeated once more bytes are appended to the buffer.
pub fn decode(buffer: &[u8]) -> Result<Frame, FrameError> {
	let mut start = 0;
	loop {
		start += find_header(&buffer[start..]);
		let data = &buffer[start..];
		if data.is_empty() {
			if start == 0 {
				return Err(FrameError::Incomplete { garbage: 0 });
			}
			return Err(FrameError::HeaderNotFound { garbage: start });
		}
		if data.len() < HEADER_SIZE {
			return Err(FrameError::Incomplete { garbage: start });
		}

		// A third 0xFF means the real header starts one byte later,
		// and a length below 2 leaves no room for the error byte and checksum.
		let servo_id = data[2];
		let length = usize::from(data[3]);
		if servo_id == 0xFF || length < 2 {
			start += 1;
			continue;
		}

		let len = HEADER_SIZE + length;
		if data.len() < len {
			return Err(FrameError::Incomplete { garbage: start });
		}

		let body = &data[HEADER_PREFIX.len()..len - 1];
		let message = data[len - 1];
		let computed = checksum(body);
		let packet = StatusPacket {
			servo_id,
			error: ErrorFlags::from_bits(data[4]),
			parameters: data[HEADER_SIZE + 1..len - 1].to_vec(),
			checksum_valid: message == computed,
		};

		if packet.checksum_valid {
			return Ok(Frame { packet, garbage: start, len });
		} else {
			return Err(FrameError::BadChecksum {
				checksum: InvalidChecksum {
					servo_id,
					message,
					computed,
				},
				packet,
				garbage: start,
				len,
			});
		}
	}
}

/// Find the potential starting position of a header.
///
/// This will return the first possible position of the header prefix.
/// Note that if the buffer ends with a partial header prefix,
/// the start position of the partial header prefix is returned.
pub(crate) fn find_header(buffer: &[u8]) -> usize {
	for i in 0..buffer.len() {
		let possible_prefix = HEADER_PREFIX.len().min(buffer.len() - i);
		if buffer[i..].starts_with(&HEADER_PREFIX[..possible_prefix]) {
			return i;
		}
	}

	buffer.len()
}
