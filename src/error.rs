//! Error types and the [`CommResult`] classification of bus transactions.

use crate::packet::frame::FrameError;

/// The transport-level outcome of a single bus transaction.
///
/// Device reported faults are not part of this classification:
/// they are reported as [`crate::ErrorFlags`] next to a successful response.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CommResult {
	/// The instruction was sent and, if a reply was expected, a valid reply was received.
	Success,

	/// The bus is in use by another transaction.
	PortBusy,

	/// Failed to transmit the instruction packet.
	TxFail,

	/// Failed to read the status packet from the transport.
	RxFail,

	/// The instruction packet could not be built.
	TxError,

	/// A status packet is partially received.
	RxWaiting,

	/// No status packet was received before the timeout.
	RxTimeout,

	/// The status packet was malformed or failed the checksum.
	RxCorrupt,

	/// The operation is not available, for example a group operation without any servos.
	NotAvailable,
}

impl CommResult {
	/// Check if this result is [`CommResult::Success`].
	pub fn is_success(self) -> bool {
		self == Self::Success
	}
}

/// An error that can occur during a read/write transfer.
#[derive(Debug)]
pub enum TransferError<E> {
	WriteError(WriteError<E>),
	ReadError(ReadError<E>),
}

/// An error that can occur while sending an instruction.
#[derive(Debug)]
pub enum WriteError<E> {
	/// Failed to discard stale data from the input buffer of the transport.
	DiscardBuffer(E),

	/// Failed to write the instruction to the transport.
	Write(E),

	/// The instruction has too many parameters to fit in a single packet.
	PacketTooLong(PacketTooLong),

	/// A register value can not be encoded.
	ValueOutOfRange(ValueOutOfRange),

	/// The group operation has no servos to address.
	EmptyGroup,
}

/// An error that can occur while reading a status packet.
#[derive(Debug)]
pub enum ReadError<E> {
	/// The transport reported an error while reading.
	Io(E),

	/// No complete status packet was received before the timeout.
	Timeout,

	/// The received status packet is not valid.
	InvalidMessage(InvalidMessage),
}

/// The received message is not valid.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum InvalidMessage {
	InvalidChecksum(InvalidChecksum),
	InvalidParameterCount(InvalidParameterCount),
}

/// The received message has an invalid checksum value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvalidChecksum {
	/// The ID in the header of the corrupt packet.
	pub servo_id: u8,
	pub message: u8,
	pub computed: u8,
}

/// The expected number of parameters.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ExpectedCount {
	Exact(usize),
}

/// The received message has an invalid or unexpected parameter count.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvalidParameterCount {
	pub actual: usize,
	pub expected: ExpectedCount,
}

/// The instruction has more parameters than fit in one packet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PacketTooLong {
	pub parameters: usize,
	pub max: usize,
}

/// A value can not be represented in the requested register encoding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ValueOutOfRange {
	pub value: i32,
	pub max: u32,
}

/// The bus is already in use by another thread.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PortBusy;

impl<E> TransferError<E> {
	/// Classify the error as a [`CommResult`].
	pub fn comm_result(&self) -> CommResult {
		match self {
			Self::WriteError(e) => e.comm_result(),
			Self::ReadError(e) => e.comm_result(),
		}
	}
}

impl<E> WriteError<E> {
	/// Classify the error as a [`CommResult`].
	pub fn comm_result(&self) -> CommResult {
		match self {
			Self::DiscardBuffer(_) => CommResult::TxFail,
			Self::Write(_) => CommResult::TxFail,
			Self::PacketTooLong(_) => CommResult::TxError,
			Self::ValueOutOfRange(_) => CommResult::TxError,
			Self::EmptyGroup => CommResult::NotAvailable,
		}
	}
}

impl<E> ReadError<E> {
	/// Classify the error as a [`CommResult`].
	pub fn comm_result(&self) -> CommResult {
		match self {
			Self::Io(_) => CommResult::RxFail,
			Self::Timeout => CommResult::RxTimeout,
			Self::InvalidMessage(_) => CommResult::RxCorrupt,
		}
	}
}

impl PortBusy {
	/// Classify the error as a [`CommResult`].
	pub fn comm_result(&self) -> CommResult {
		CommResult::PortBusy
	}
}

impl From<&FrameError> for CommResult {
	fn from(other: &FrameError) -> Self {
		match other {
			FrameError::Incomplete { .. } => Self::RxWaiting,
			FrameError::HeaderNotFound { .. } => Self::RxCorrupt,
			FrameError::BadChecksum { .. } => Self::RxCorrupt,
		}
	}
}

impl InvalidParameterCount {
	pub fn check(actual: usize, expected: usize) -> Result<(), Self> {
		if actual == expected {
			Ok(())
		} else {
			Err(Self {
				actual,
				expected: ExpectedCount::Exact(expected),
			})
		}
	}
}

impl PacketTooLong {
	pub fn check(parameters: usize, max: usize) -> Result<(), Self> {
		if parameters <= max {
			Ok(())
		} else {
			Err(Self { parameters, max })
		}
	}
}

impl ValueOutOfRange {
	pub fn check(value: i32, max: u32) -> Result<(), Self> {
		if value.unsigned_abs() <= max {
			Ok(())
		} else {
			Err(Self { value, max })
		}
	}

	pub fn check_unsigned(value: i32, max: u32) -> Result<(), Self> {
		if value >= 0 && value.unsigned_abs() <= max {
			Ok(())
		} else {
			Err(Self { value, max })
		}
	}
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for TransferError<E> {}
impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for WriteError<E> {}
impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for ReadError<E> {}
impl std::error::Error for InvalidMessage {}
impl std::error::Error for InvalidChecksum {}
impl std::error::Error for InvalidParameterCount {}
impl std::error::Error for PacketTooLong {}
impl std::error::Error for ValueOutOfRange {}
impl std::error::Error for PortBusy {}

impl<E> From<WriteError<E>> for TransferError<E> {
	fn from(other: WriteError<E>) -> Self {
		Self::WriteError(other)
	}
}

impl<E> From<ReadError<E>> for TransferError<E> {
	fn from(other: ReadError<E>) -> Self {
		Self::ReadError(other)
	}
}

impl<E> From<PacketTooLong> for WriteError<E> {
	fn from(other: PacketTooLong) -> Self {
		Self::PacketTooLong(other)
	}
}

impl<E> From<PacketTooLong> for TransferError<E> {
	fn from(other: PacketTooLong) -> Self {
		Self::WriteError(other.into())
	}
}

impl<E> From<ValueOutOfRange> for WriteError<E> {
	fn from(other: ValueOutOfRange) -> Self {
		Self::ValueOutOfRange(other)
	}
}

impl<E> From<ValueOutOfRange> for TransferError<E> {
	fn from(other: ValueOutOfRange) -> Self {
		Self::WriteError(other.into())
	}
}

impl<E> From<InvalidMessage> for ReadError<E> {
	fn from(other: InvalidMessage) -> Self {
		Self::InvalidMessage(other)
	}
}

impl<E> From<InvalidChecksum> for ReadError<E> {
	fn from(other: InvalidChecksum) -> Self {
		Self::InvalidMessage(other.into())
	}
}

impl<E> From<InvalidParameterCount> for ReadError<E> {
	fn from(other: InvalidParameterCount) -> Self {
		Self::InvalidMessage(other.into())
	}
}

impl<E> From<InvalidMessage> for TransferError<E> {
	fn from(other: InvalidMessage) -> Self {
		Self::ReadError(other.into())
	}
}

impl<E> From<InvalidParameterCount> for TransferError<E> {
	fn from(other: InvalidParameterCount) -> Self {
		Self::ReadError(other.into())
	}
}

impl From<InvalidChecksum> for InvalidMessage {
	fn from(other: InvalidChecksum) -> Self {
		Self::InvalidChecksum(other)
	}
}

impl From<InvalidParameterCount> for InvalidMessage {
	fn from(other: InvalidParameterCount) -> Self {
		Self::InvalidParameterCount(other)
	}
}

impl std::fmt::Display for CommResult {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Success => write!(f, "communication success"),
			Self::PortBusy => write!(f, "port is in use"),
			Self::TxFail => write!(f, "failed to transmit instruction packet"),
			Self::RxFail => write!(f, "failed to get status packet from device"),
			Self::TxError => write!(f, "incorrect instruction packet"),
			Self::RxWaiting => write!(f, "now receiving status packet"),
			Self::RxTimeout => write!(f, "there is no status packet"),
			Self::RxCorrupt => write!(f, "incorrect status packet"),
			Self::NotAvailable => write!(f, "function is not available"),
		}
	}
}

impl<E: std::fmt::Display> std::fmt::Display for TransferError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::WriteError(e) => write!(f, "{}", e),
			Self::ReadError(e) => write!(f, "{}", e),
		}
	}
}

impl<E: std::fmt::Display> std::fmt::Display for WriteError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::DiscardBuffer(e) => write!(f, "failed to discard input buffer: {}", e),
			Self::Write(e) => write!(f, "failed to write to serial port: {}", e),
			Self::PacketTooLong(e) => write!(f, "{}", e),
			Self::ValueOutOfRange(e) => write!(f, "{}", e),
			Self::EmptyGroup => write!(f, "no servos added to the sync group"),
		}
	}
}

impl<E: std::fmt::Display> std::fmt::Display for ReadError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Io(e) => write!(f, "failed to read from serial port: {}", e),
			Self::Timeout => write!(f, "timeout while waiting for status packet"),
			Self::InvalidMessage(e) => write!(f, "{}", e),
		}
	}
}

impl std::fmt::Display for InvalidMessage {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::InvalidChecksum(e) => write!(f, "{}", e),
			Self::InvalidParameterCount(e) => write!(f, "{}", e),
		}
	}
}

impl std::fmt::Display for InvalidChecksum {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"invalid checksum in packet from servo {}, message claims {:#04X}, computed {:#04X}",
			self.servo_id, self.message, self.computed
		)
	}
}

impl std::fmt::Display for ExpectedCount {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Exact(x) => write!(f, "exactly {}", x),
		}
	}
}

impl std::fmt::Display for InvalidParameterCount {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "invalid parameter count, expected {}, got {}", self.expected, self.actual)
	}
}

impl std::fmt::Display for PacketTooLong {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "too many parameters for one packet: {} (maximum is {})", self.parameters, self.max)
	}
}

impl std::fmt::Display for ValueOutOfRange {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "value {} is out of range, the magnitude can be at most {}", self.value, self.max)
	}
}

impl std::fmt::Display for PortBusy {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}", CommResult::PortBusy)
	}
}
