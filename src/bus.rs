//! Buffered, streaming-safe I/O over a [`Transport`].

use std::time::{Duration, Instant};

use crate::packet::frame::{self, FrameError};
use crate::packet::{InstructionPacket, StatusPacket};
use crate::{ReadError, Transport, WriteError};

/// Size of the read buffer.
///
/// Larger than the biggest possible packet, so a partial packet never fills it up.
const READ_BUFFER_SIZE: usize = 512;

/// Low level interface to a Feetech serial bus.
pub(crate) struct Bus<T> {
	/// The underlying transport (normally a serial port).
	pub(crate) transport: T,

	/// The baud rate of the transport.
	pub(crate) baud_rate: u32,

	/// The buffer for reading incoming messages.
	read_buffer: Vec<u8>,

	/// The total number of valid bytes in the read buffer.
	read_len: usize,

	/// The buffer for outgoing messages.
	write_buffer: Vec<u8>,
}

impl<T: Transport> Bus<T> {
	/// Create a new bus for a transport that is already configured with the given baud rate.
	pub fn with_baud_rate(transport: T, baud_rate: u32) -> Self {
		Self {
			transport,
			baud_rate,
			read_buffer: vec![0; READ_BUFFER_SIZE],
			read_len: 0,
			write_buffer: Vec::with_capacity(64),
		}
	}

	/// Set the baud rate of the underlying transport.
	pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), T::Error> {
		self.transport.set_baud_rate(baud_rate)?;
		self.baud_rate = baud_rate;
		Ok(())
	}

	/// Write an instruction packet to the bus.
	///
	/// The packet is encoded before anything is sent,
	/// so an invalid packet never reaches the transport.
	pub fn write_instruction(&mut self, packet: &InstructionPacket) -> Result<(), WriteError<T::Error>> {
		frame::encode_into(packet, &mut self.write_buffer)?;

		// Throw away old data in the read buffer and the kernel read buffer.
		// We don't do this when reading a reply, because we might receive multiple replies for one instruction,
		// and read() can potentially read more than one reply per syscall.
		self.read_len = 0;
		self.transport.discard_input_buffer().map_err(WriteError::DiscardBuffer)?;

		trace!("sending instruction: {:02X?}", self.write_buffer);
		self.transport.write_all(&self.write_buffer).map_err(WriteError::Write)?;
		Ok(())
	}

	/// Read the next status packet from the bus, waiting at most until `deadline`.
	///
	/// Bytes that arrived but do not form a complete packet yet stay buffered for the next call.
	pub fn read_status_packet(&mut self, deadline: Instant) -> Result<StatusPacket, ReadError<T::Error>> {
		loop {
			match frame::decode(&self.read_buffer[..self.read_len]) {
				Ok(frame) => {
					trace!("read packet: {:02X?}", &self.read_buffer[frame.garbage..frame.consumed()]);
					self.skip_garbage(frame.garbage);
					self.consume_read_bytes(frame.len);
					return Ok(frame.packet);
				},
				Err(FrameError::BadChecksum { checksum, garbage, len, .. }) => {
					debug!("discarding packet with invalid checksum: {:02X?}", &self.read_buffer[garbage..garbage + len]);
					self.consume_read_bytes(garbage + len);
					return Err(checksum.into());
				},
				Err(e) => self.skip_garbage(e.consumed()),
			}

			let timeout = match deadline.checked_duration_since(Instant::now()) {
				Some(timeout) if !timeout.is_zero() => timeout,
				_ => {
					trace!(
						"timeout reading status packet, data in buffer: {:02X?}",
						&self.read_buffer[..self.read_len]
					);
					return Err(ReadError::Timeout);
				},
			};

			let new_data = self.transport.read(&mut self.read_buffer[self.read_len..], timeout)?;
			self.read_len += new_data;
		}
	}

	/// Remove leading garbage data from the read buffer.
	fn skip_garbage(&mut self, garbage_len: usize) {
		if garbage_len > 0 {
			debug!("skipping {} bytes of leading garbage.", garbage_len);
			trace!("skipped garbage: {:02X?}", &self.read_buffer[..garbage_len]);
			self.consume_read_bytes(garbage_len);
		}
	}

	fn consume_read_bytes(&mut self, len: usize) {
		debug_assert!(len <= self.read_len);
		self.read_buffer.copy_within(len..self.read_len, 0);
		self.read_len -= len;
	}
}

/// Calculate the required time to transfer a message of a given size.
///
/// The size must include any headers and footers of the message.
pub(crate) fn message_transfer_time(message_size: u32, baud_rate: u32) -> Duration {
	let baud_rate = u64::from(baud_rate);
	let bits = u64::from(message_size) * 10; // each byte is 1 start bit, 8 data bits and 1 stop bit.
	let secs = bits / baud_rate;
	let subsec_bits = bits % baud_rate;
	let nanos = (subsec_bits * 1_000_000_000).div_ceil(baud_rate);
	Duration::new(secs, nanos as u32)
}
