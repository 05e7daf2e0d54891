//! [`Transport`] trait to support reading/writing from different serial port implementations.

use crate::ReadError;
use std::time::Duration;

#[cfg(feature = "serial2")]
pub mod serial2;

/// Transports are used to communicate with the servos by reading and writing bytes.
///
/// The implementor must configure the serial line to use 8 bit characters, 1 stop bit, no parity and no flow control.
/// Closing the transport is done by dropping it.
pub trait Transport {
	/// The error type returned by the transport when reading, writing or setting the baud rate.
	type Error: std::fmt::Debug + std::fmt::Display;

	/// Get the current baud rate of the transport.
	fn baud_rate(&self) -> Result<u32, Self::Error>;

	/// Set the baud rate of the transport.
	fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), Self::Error>;

	/// Discard the input buffer of the transport. May be a no-op on some platforms.
	fn discard_input_buffer(&mut self) -> Result<(), Self::Error>;

	/// Read available bytes, blocking until at least one byte is available or the timeout elapses.
	///
	/// An elapsed timeout must be reported as [`ReadError::Timeout`].
	fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, ReadError<Self::Error>>;

	/// Write all bytes in the buffer to the transport.
	fn write_all(&mut self, buffer: &[u8]) -> Result<(), Self::Error>;
}
