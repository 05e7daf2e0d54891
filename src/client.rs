use std::time::{Duration, Instant};
#[cfg(feature = "serial2")]
use std::path::Path;

use crate::bus::{message_transfer_time, Bus};
use crate::packet::{Instruction, InstructionPacket, Response, StatusPacket, HEADER_SIZE};
use crate::{ReadError, TransferError, Transport, WriteError};

/// Timing configuration of a [`Client`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ClientConfig {
	/// Extra time to wait for a reply on top of the time needed to transfer it.
	///
	/// This covers the return delay of the servo and the latency of the serial adapter.
	pub latency: Duration,

	/// Time to wait for each reply of a sync read.
	///
	/// When `None`, the reply timeout is derived from the size of the reply and the baud rate.
	pub sync_read_timeout: Option<Duration>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			latency: Duration::from_millis(50),
			sync_read_timeout: None,
		}
	}
}

macro_rules! make_client_struct {
	($($DefaultTransport:ty)?) => {
		/// Client for the Feetech serial bus protocol.
		///
		/// Used to interact with servos on the bus.
		/// Every transaction takes `&mut self`, so only one instruction can be in flight at a time.
		/// Use [`crate::SharedClient`] to share a client between threads.
		///
		/// If the `"serial2"` feature is enabled, the `T` generic type argument defaults to [`serial2::SerialPort`].
		/// If it is not enabled, the transport type must always be specified.
		pub struct Client<T $(= $DefaultTransport)?>
		where
			T: Transport,
		{
			bus: Bus<T>,
			config: ClientConfig,
		}
	};
}

#[cfg(feature = "serial2")]
make_client_struct!(serial2::SerialPort);

#[cfg(not(feature = "serial2"))]
make_client_struct!();

impl<T> std::fmt::Debug for Client<T>
where
	T: Transport + std::fmt::Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("transport", &self.bus.transport)
			.field("baud_rate", &self.bus.baud_rate)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

#[cfg(feature = "serial2")]
impl Client<serial2::SerialPort> {
	/// Open a serial port with the given baud rate.
	pub fn open(path: impl AsRef<Path>, baud_rate: u32) -> std::io::Result<Self> {
		Self::open_with_config(path, baud_rate, ClientConfig::default())
	}

	/// Open a serial port with the given baud rate and timing configuration.
	pub fn open_with_config(path: impl AsRef<Path>, baud_rate: u32, config: ClientConfig) -> std::io::Result<Self> {
		let serial_port = serial2::SerialPort::open(path, baud_rate)?;
		Ok(Self::with_baud_rate(serial_port, baud_rate, config))
	}
}

impl<T> Client<T>
where
	T: Transport,
{
	/// Create a new client using an open transport.
	///
	/// The transport must already be configured in raw mode with the correct baud rate,
	/// character size (8), parity (disabled) and stop bits (1).
	pub fn new(transport: T) -> Result<Self, T::Error> {
		Self::with_config(transport, ClientConfig::default())
	}

	/// Create a new client using an open transport and a custom timing configuration.
	pub fn with_config(transport: T, config: ClientConfig) -> Result<Self, T::Error> {
		let baud_rate = transport.baud_rate()?;
		Ok(Self::with_baud_rate(transport, baud_rate, config))
	}

	/// Create a new client for a transport that is known to use the given baud rate.
	pub fn with_baud_rate(transport: T, baud_rate: u32, config: ClientConfig) -> Self {
		Self {
			bus: Bus::with_baud_rate(transport, baud_rate),
			config,
		}
	}

	/// Get a reference to the underlying transport.
	///
	/// Note that performing any read or write to the transport bypasses the read buffer of the client,
	/// and may disrupt the communication with the servos.
	pub fn transport(&self) -> &T {
		&self.bus.transport
	}

	/// Get a mutable reference to the underlying transport.
	///
	/// The same caveats apply as for [`Self::transport()`].
	pub fn transport_mut(&mut self) -> &mut T {
		&mut self.bus.transport
	}

	/// Consume the client to get ownership of the transport.
	pub fn into_transport(self) -> T {
		self.bus.transport
	}

	/// Get the baud rate of the bus.
	pub fn baud_rate(&self) -> u32 {
		self.bus.baud_rate
	}

	/// Set the baud rate of the underlying transport.
	pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), T::Error> {
		self.bus.set_baud_rate(baud_rate)
	}

	/// Get the timing configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Replace the timing configuration.
	pub fn set_config(&mut self, config: ClientConfig) {
		self.config = config;
	}

	/// The time to wait for a status packet with the given number of parameters.
	///
	/// This is the time needed to transfer the packet plus three bytes of slack at the current baud rate,
	/// plus the configured latency.
	pub fn reply_timeout(&self, expected_parameters: usize) -> Duration {
		// Header, error byte, parameters and checksum.
		let packet_size = HEADER_SIZE + 1 + expected_parameters + 1;
		message_transfer_time((packet_size + 3) as u32, self.bus.baud_rate) + self.config.latency
	}

	/// The time to wait for each reply of a sync read with the given data length.
	pub(crate) fn sync_read_timeout(&self, data_length: usize) -> Duration {
		self.config
			.sync_read_timeout
			.unwrap_or_else(|| self.reply_timeout(data_length))
	}

	/// Send an instruction packet and optionally wait for the status packet.
	///
	/// This performs exactly one attempt: the stale input is discarded, the packet is sent,
	/// and if `expect_reply` is true, the bus is read until a valid status packet from the addressed servo arrives or `timeout` elapses.
	/// Status packets from other servos are discarded.
	///
	/// Returns `Ok(None)` if no reply was expected.
	/// Fault bits reported by the servo are returned in [`StatusPacket::error`] and are not treated as an error.
	pub fn transact(
		&mut self,
		packet: &InstructionPacket,
		expect_reply: bool,
		timeout: Duration,
	) -> Result<Option<StatusPacket>, TransferError<T::Error>> {
		self.write_instruction(packet)?;
		if !expect_reply {
			return Ok(None);
		}

		let deadline = Instant::now() + timeout;
		loop {
			let status = self.read_status_packet(deadline)?;
			if status.servo_id == packet.servo_id() {
				return Ok(Some(status));
			}
			debug!(
				"discarding status packet from servo {}, expected a reply from servo {}",
				status.servo_id,
				packet.servo_id()
			);
		}
	}

	/// Send an instruction and wait for the reply if the instruction expects one.
	///
	/// The timeout is derived from `expected_parameters`.
	/// For instructions without reply, a response with empty data and no fault bits is returned.
	pub(crate) fn transfer_single(
		&mut self,
		servo_id: u8,
		instruction: Instruction,
		parameters: Vec<u8>,
		expected_parameters: usize,
	) -> Result<Response<Vec<u8>>, TransferError<T::Error>> {
		let packet = InstructionPacket::new(servo_id, instruction, parameters);
		let timeout = self.reply_timeout(expected_parameters);
		match self.transact(&packet, packet.expects_reply(), timeout)? {
			Some(status) => Ok(status.into()),
			None => Ok(Response {
				servo_id,
				error: Default::default(),
				data: Vec::new(),
			}),
		}
	}

	/// Write an instruction packet to the bus without waiting for a reply.
	pub fn write_instruction(&mut self, packet: &InstructionPacket) -> Result<(), WriteError<T::Error>> {
		self.bus.write_instruction(packet)
	}

	/// Read the next status packet from the bus, waiting at most until the deadline.
	///
	/// The status packet may come from any servo.
	pub fn read_status_packet(&mut self, deadline: Instant) -> Result<StatusPacket, ReadError<T::Error>> {
		self.bus.read_status_packet(deadline)
	}
}
