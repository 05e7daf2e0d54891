//! Instruction and status packets of the Feetech serial bus protocol.
//!
//! Every packet on the wire looks like this:
//!
//! ```text
//! [0xFF, 0xFF, id, length, instruction/error, parameters..., checksum]
//! ```
//!
//! The length field counts the instruction (or error) byte, the parameters and the checksum.

pub mod frame;
mod status;

pub use status::{ErrorFlags, Response, StatusPacket};

/// The two bytes that start every packet.
pub const HEADER_PREFIX: [u8; 2] = [0xFF, 0xFF];

/// The size of the header: the prefix, the packet ID and the length field.
pub const HEADER_SIZE: usize = 4;

/// The maximum number of parameters in a single packet.
///
/// The length field is a single byte and also counts the instruction and checksum bytes.
pub const MAX_PARAMETERS: usize = 253;

#[rustfmt::skip]
pub mod instruction_id {
	pub const PING       : u8 = 0x01;
	pub const READ       : u8 = 0x02;
	pub const WRITE      : u8 = 0x03;
	pub const REG_WRITE  : u8 = 0x04;
	pub const ACTION     : u8 = 0x05;
	pub const RESET      : u8 = 0x06;
	pub const SYNC_READ  : u8 = 0x82;
	pub const SYNC_WRITE : u8 = 0x83;
}

pub mod packet_id {
	/// Address all servos at once. Servos never reply to a broadcast instruction.
	pub const BROADCAST: u8 = 0xFE;

	/// The highest ID that can be assigned to a single servo.
	pub const MAX: u8 = 0xFD;
}

/// The instructions understood by the servos.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Instruction {
	Ping,
	Read,
	Write,
	RegWrite,
	Action,
	SyncWrite,
	SyncRead,
	Reset,
}

impl Instruction {
	/// The instruction code used on the wire.
	pub fn id(self) -> u8 {
		match self {
			Self::Ping => instruction_id::PING,
			Self::Read => instruction_id::READ,
			Self::Write => instruction_id::WRITE,
			Self::RegWrite => instruction_id::REG_WRITE,
			Self::Action => instruction_id::ACTION,
			Self::SyncWrite => instruction_id::SYNC_WRITE,
			Self::SyncRead => instruction_id::SYNC_READ,
			Self::Reset => instruction_id::RESET,
		}
	}

	/// Look up an instruction by its wire code.
	pub fn from_id(id: u8) -> Option<Self> {
		match id {
			instruction_id::PING => Some(Self::Ping),
			instruction_id::READ => Some(Self::Read),
			instruction_id::WRITE => Some(Self::Write),
			instruction_id::REG_WRITE => Some(Self::RegWrite),
			instruction_id::ACTION => Some(Self::Action),
			instruction_id::SYNC_WRITE => Some(Self::SyncWrite),
			instruction_id::SYNC_READ => Some(Self::SyncRead),
			instruction_id::RESET => Some(Self::Reset),
			_ => None,
		}
	}
}

/// An instruction for one servo, or for all servos when sent to [`packet_id::BROADCAST`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstructionPacket {
	servo_id: u8,
	instruction: Instruction,
	parameters: Vec<u8>,
}

impl InstructionPacket {
	/// Create a new instruction packet.
	///
	/// The parameter count is validated when the packet is encoded.
	pub fn new(servo_id: u8, instruction: Instruction, parameters: impl Into<Vec<u8>>) -> Self {
		Self {
			servo_id,
			instruction,
			parameters: parameters.into(),
		}
	}

	/// The ID of the addressed servo.
	pub fn servo_id(&self) -> u8 {
		self.servo_id
	}

	/// The instruction to execute.
	pub fn instruction(&self) -> Instruction {
		self.instruction
	}

	/// The parameters of the instruction.
	pub fn parameters(&self) -> &[u8] {
		&self.parameters
	}

	/// The value of the length field: the parameters plus the instruction and checksum byte.
	pub fn length(&self) -> usize {
		self.parameters.len() + 2
	}

	/// Check if the addressed servo sends a status packet in response to this instruction.
	///
	/// Broadcast instructions never get a reply, and neither do action and sync write.
	/// The replies to sync read are not a single status packet, so they are read separately.
	pub fn expects_reply(&self) -> bool {
		self.servo_id != packet_id::BROADCAST
			&& !matches!(
				self.instruction,
				Instruction::Action | Instruction::SyncWrite | Instruction::SyncRead
			)
	}
}
