//! The control table of the STS series servos and typed accessors for it.
//!
//! The protocol engine only knows addresses and byte counts.
//! This module adds the meaning: which registers exist, how their values are encoded,
//! and which registers live in EEPROM and need to be unlocked before writing.

use std::time::Instant;

use crate::codec::{from_wire_signed, join_low_high, split_low_high, to_wire_signed, SIGN_BIT_WORD};
use crate::instructions::GroupSyncWrite;
use crate::packet::{ErrorFlags, Instruction, InstructionPacket, Response};
use crate::{Client, TransferError, Transport, ValueOutOfRange};

/// A register in the control table of a servo.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Register {
	/// The name of the register, as used on the command line.
	pub name: &'static str,

	/// The address of the (first byte of the) register.
	pub address: u8,

	/// The size of the register in bytes: 1 or 2.
	pub width: u8,

	/// True if the register is stored in EEPROM.
	///
	/// EEPROM registers can only be written after clearing the [`LOCK`] register.
	pub eeprom: bool,
}

const fn eeprom(name: &'static str, address: u8, width: u8) -> Register {
	Register { name, address, width, eeprom: true }
}

const fn ram(name: &'static str, address: u8, width: u8) -> Register {
	Register { name, address, width, eeprom: false }
}

#[rustfmt::skip]
mod table {
	use super::{eeprom, ram, Register};

	pub const MODEL               : Register = eeprom("model", 3, 2);
	pub const ID                  : Register = eeprom("id", 5, 1);
	pub const BAUD_RATE           : Register = eeprom("baud_rate", 6, 1);
	pub const MIN_ANGLE_LIMIT     : Register = eeprom("min_angle_limit", 9, 2);
	pub const MAX_ANGLE_LIMIT     : Register = eeprom("max_angle_limit", 11, 2);
	pub const MAX_TORQUE_LIMIT    : Register = eeprom("max_torque_limit", 16, 2);
	pub const MIN_STARTUP_FORCE   : Register = eeprom("min_startup_force", 24, 2);
	pub const CW_DEAD             : Register = eeprom("cw_dead", 26, 1);
	pub const CCW_DEAD            : Register = eeprom("ccw_dead", 27, 1);
	pub const PROTECTION_CURRENT  : Register = eeprom("protection_current", 28, 2);
	pub const OFFSET              : Register = eeprom("offset", 31, 2);
	pub const MODE                : Register = eeprom("mode", 33, 1);
	pub const PROTECTIVE_TORQUE   : Register = eeprom("protective_torque", 34, 1);

	pub const TORQUE_ENABLE       : Register = ram("torque_enable", 40, 1);
	pub const ACCELERATION        : Register = ram("acceleration", 41, 1);
	pub const GOAL_POSITION       : Register = ram("goal_position", 42, 2);
	pub const GOAL_TIME           : Register = ram("goal_time", 44, 2);
	pub const GOAL_SPEED          : Register = ram("goal_speed", 46, 2);
	pub const TORQUE_LIMIT        : Register = ram("torque_limit", 48, 2);
	pub const LOCK                : Register = ram("lock", 55, 1);
	pub const PRESENT_POSITION    : Register = ram("present_position", 56, 2);
	pub const PRESENT_SPEED       : Register = ram("present_speed", 58, 2);
	pub const PRESENT_LOAD        : Register = ram("present_load", 60, 2);
	pub const PRESENT_VOLTAGE     : Register = ram("present_voltage", 62, 1);
	pub const PRESENT_TEMPERATURE : Register = ram("present_temperature", 63, 1);
	pub const STATUS              : Register = ram("status", 65, 1);
	pub const MOVING              : Register = ram("moving", 66, 1);
	pub const PRESENT_CURRENT     : Register = ram("present_current", 69, 2);
}

pub use table::*;

/// All registers of the control table, ordered by address.
pub const ALL: [Register; 28] = [
	MODEL,
	ID,
	BAUD_RATE,
	MIN_ANGLE_LIMIT,
	MAX_ANGLE_LIMIT,
	MAX_TORQUE_LIMIT,
	MIN_STARTUP_FORCE,
	CW_DEAD,
	CCW_DEAD,
	PROTECTION_CURRENT,
	OFFSET,
	MODE,
	PROTECTIVE_TORQUE,
	TORQUE_ENABLE,
	ACCELERATION,
	GOAL_POSITION,
	GOAL_TIME,
	GOAL_SPEED,
	TORQUE_LIMIT,
	LOCK,
	PRESENT_POSITION,
	PRESENT_SPEED,
	PRESENT_LOAD,
	PRESENT_VOLTAGE,
	PRESENT_TEMPERATURE,
	STATUS,
	MOVING,
	PRESENT_CURRENT,
];

/// Number of bytes per servo in a [`motion_group()`]: acceleration, goal position, goal time and goal speed.
pub const MOTION_DATA_LENGTH: u8 = 7;

impl Register {
	/// Look up a register by name.
	pub fn from_name(name: &str) -> Option<Self> {
		ALL.into_iter().find(|register| register.name == name)
	}

	/// Encode a value for this register.
	///
	/// Two byte registers use sign-magnitude encoding with the sign in bit 15.
	/// One byte registers accept 0 to 255.
	pub fn encode(self, value: i32) -> Result<Vec<u8>, ValueOutOfRange> {
		if self.width == 1 {
			ValueOutOfRange::check_unsigned(value, 0xFF)?;
			Ok(vec![value as u8])
		} else {
			let (low, high) = split_low_high(to_wire_signed(value, SIGN_BIT_WORD)?);
			Ok(vec![low, high])
		}
	}

	/// Decode the raw bytes of this register.
	pub fn decode(self, data: &[u8]) -> i32 {
		match data {
			[value] => i32::from(*value),
			[low, high, ..] => from_wire_signed(join_low_high(*low, *high), SIGN_BIT_WORD),
			[] => 0,
		}
	}
}

impl std::fmt::Display for Register {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} (address {}, {} byte)", self.name, self.address, self.width)
	}
}

/// The operating mode of a servo.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Mode {
	/// Position servo mode.
	Position = 0,

	/// Constant speed mode.
	Speed = 1,

	/// Open-loop PWM speed mode.
	Pwm = 2,

	/// Step servo mode.
	Step = 3,
}

impl Mode {
	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			0 => Some(Self::Position),
			1 => Some(Self::Speed),
			2 => Some(Self::Pwm),
			3 => Some(Self::Step),
			_ => None,
		}
	}

	pub fn code(self) -> u8 {
		self as u8
	}
}

/// The baud rates supported by the servos, with their code in the baud rate register.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum BaudRate {
	Baud1M = 0,
	Baud500K = 1,
	Baud250K = 2,
	Baud128K = 3,
	Baud115200 = 4,
	Baud76800 = 5,
	Baud57600 = 6,
	Baud38400 = 7,
}

impl BaudRate {
	const ALL: [Self; 8] = [
		Self::Baud1M,
		Self::Baud500K,
		Self::Baud250K,
		Self::Baud128K,
		Self::Baud115200,
		Self::Baud76800,
		Self::Baud57600,
		Self::Baud38400,
	];

	pub fn from_code(code: u8) -> Option<Self> {
		Self::ALL.get(usize::from(code)).copied()
	}

	/// Find the register code for a baud rate in bits per second.
	pub fn from_bps(bps: u32) -> Option<Self> {
		Self::ALL.into_iter().find(|baud_rate| baud_rate.bps() == bps)
	}

	pub fn code(self) -> u8 {
		self as u8
	}

	/// The baud rate in bits per second.
	pub fn bps(self) -> u32 {
		match self {
			Self::Baud1M => 1_000_000,
			Self::Baud500K => 500_000,
			Self::Baud250K => 250_000,
			Self::Baud128K => 128_000,
			Self::Baud115200 => 115_200,
			Self::Baud76800 => 76_800,
			Self::Baud57600 => 57_600,
			Self::Baud38400 => 38_400,
		}
	}
}

/// Create a sync write group for acceleration, goal position, goal time and goal speed.
///
/// Fill it with [`motion_entry()`].
pub fn motion_group() -> GroupSyncWrite {
	GroupSyncWrite::new(ACCELERATION.address, MOTION_DATA_LENGTH)
}

/// Encode the data for one servo in a [`motion_group()`].
///
/// The goal time is always 0: the servo moves with the given acceleration and speed.
pub fn motion_entry(acceleration: u8, position: i32, speed: i32) -> Result<[u8; 7], ValueOutOfRange> {
	let (position_low, position_high) = split_low_high(to_wire_signed(position, SIGN_BIT_WORD)?);
	let (speed_low, speed_high) = split_low_high(to_wire_signed(speed, SIGN_BIT_WORD)?);
	Ok([acceleration, position_low, position_high, 0, 0, speed_low, speed_high])
}

impl<T> Client<T>
where
	T: Transport,
{
	/// Read and decode a register.
	pub fn get(&mut self, servo_id: u8, register: Register) -> Result<Response<i32>, TransferError<T::Error>> {
		let response = self.read_bytes(servo_id, register.address, register.width)?;
		Ok(response.map(|data| register.decode(&data)))
	}

	/// Encode and write a register.
	///
	/// The value is checked before anything is sent.
	/// EEPROM registers are written as-is: use the `set_*` methods for EEPROM registers to also handle the lock.
	pub fn set(&mut self, servo_id: u8, register: Register, value: i32) -> Result<Response<()>, TransferError<T::Error>> {
		let data = register.encode(value)?;
		self.write_bytes(servo_id, register.address, &data)
	}

	pub fn present_position(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PRESENT_POSITION)
	}

	pub fn present_speed(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PRESENT_SPEED)
	}

	pub fn present_load(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PRESENT_LOAD)
	}

	/// The supply voltage in units of 0.1 V.
	pub fn present_voltage(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PRESENT_VOLTAGE)
	}

	/// The internal temperature in degrees Celsius.
	pub fn present_temperature(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PRESENT_TEMPERATURE)
	}

	pub fn present_current(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PRESENT_CURRENT)
	}

	/// The fault bits currently latched in the status register.
	pub fn status(&mut self, servo_id: u8) -> Result<Response<ErrorFlags>, TransferError<T::Error>> {
		let response = self.read_u8(servo_id, STATUS.address)?;
		Ok(response.map(ErrorFlags::from_bits))
	}

	pub fn moving(&mut self, servo_id: u8) -> Result<Response<bool>, TransferError<T::Error>> {
		let response = self.read_u8(servo_id, MOVING.address)?;
		Ok(response.map(|value| value != 0))
	}

	/// The operating mode, or `None` if the servo reports an unknown mode.
	pub fn mode(&mut self, servo_id: u8) -> Result<Response<Option<Mode>>, TransferError<T::Error>> {
		let response = self.read_u8(servo_id, MODE.address)?;
		Ok(response.map(Mode::from_code))
	}

	/// The configured baud rate, or `None` if the servo reports an unknown code.
	pub fn configured_baud_rate(&mut self, servo_id: u8) -> Result<Response<Option<BaudRate>>, TransferError<T::Error>> {
		let response = self.read_u8(servo_id, BAUD_RATE.address)?;
		Ok(response.map(BaudRate::from_code))
	}

	pub fn torque_enable(&mut self, servo_id: u8) -> Result<Response<bool>, TransferError<T::Error>> {
		let response = self.read_u8(servo_id, TORQUE_ENABLE.address)?;
		Ok(response.map(|value| value != 0))
	}

	/// Check if the EEPROM of the servo is write protected.
	pub fn lock(&mut self, servo_id: u8) -> Result<Response<bool>, TransferError<T::Error>> {
		let response = self.read_u8(servo_id, LOCK.address)?;
		Ok(response.map(|value| value != 0))
	}

	/// Read the ID register of a servo.
	///
	/// Mostly useful with [`crate::Client::ping`] to verify an ID change.
	pub fn read_id(&mut self, servo_id: u8) -> Result<Response<u8>, TransferError<T::Error>> {
		self.read_u8(servo_id, ID.address)
	}

	pub fn min_angle_limit(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, MIN_ANGLE_LIMIT)
	}

	pub fn max_angle_limit(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, MAX_ANGLE_LIMIT)
	}

	pub fn max_torque_limit(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, MAX_TORQUE_LIMIT)
	}

	pub fn min_startup_force(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, MIN_STARTUP_FORCE)
	}

	pub fn protection_current(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PROTECTION_CURRENT)
	}

	pub fn protective_torque(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, PROTECTIVE_TORQUE)
	}

	pub fn torque_limit(&mut self, servo_id: u8) -> Result<Response<i32>, TransferError<T::Error>> {
		self.get(servo_id, TORQUE_LIMIT)
	}

	pub fn set_torque_enable(&mut self, servo_id: u8, enable: bool) -> Result<Response<()>, TransferError<T::Error>> {
		self.write_u8(servo_id, TORQUE_ENABLE.address, enable.into())
	}

	pub fn set_acceleration(&mut self, servo_id: u8, acceleration: u8) -> Result<Response<()>, TransferError<T::Error>> {
		self.write_u8(servo_id, ACCELERATION.address, acceleration)
	}

	pub fn set_goal_position(&mut self, servo_id: u8, position: i32) -> Result<Response<()>, TransferError<T::Error>> {
		self.set(servo_id, GOAL_POSITION, position)
	}

	pub fn set_goal_speed(&mut self, servo_id: u8, speed: i32) -> Result<Response<()>, TransferError<T::Error>> {
		self.set(servo_id, GOAL_SPEED, speed)
	}

	pub fn set_torque_limit(&mut self, servo_id: u8, torque: i32) -> Result<Response<()>, TransferError<T::Error>> {
		self.set(servo_id, TORQUE_LIMIT, torque)
	}

	/// Change the ID of a servo.
	///
	/// See [`Self::set_eeprom()`] for the write sequence.
	pub fn set_id(&mut self, servo_id: u8, new_id: u8) -> Result<Response<bool>, TransferError<T::Error>> {
		self.set_eeprom(servo_id, ID, new_id.into())
	}

	pub fn set_mode(&mut self, servo_id: u8, mode: Mode) -> Result<Response<bool>, TransferError<T::Error>> {
		self.set_eeprom(servo_id, MODE, mode.code().into())
	}

	pub fn set_min_angle_limit(&mut self, servo_id: u8, angle: i32) -> Result<Response<bool>, TransferError<T::Error>> {
		self.set_eeprom(servo_id, MIN_ANGLE_LIMIT, angle)
	}

	pub fn set_max_angle_limit(&mut self, servo_id: u8, angle: i32) -> Result<Response<bool>, TransferError<T::Error>> {
		self.set_eeprom(servo_id, MAX_ANGLE_LIMIT, angle)
	}

	pub fn set_max_torque_limit(&mut self, servo_id: u8, torque: i32) -> Result<Response<bool>, TransferError<T::Error>> {
		self.set_eeprom(servo_id, MAX_TORQUE_LIMIT, torque)
	}

	pub fn set_min_startup_force(&mut self, servo_id: u8, force: i32) -> Result<Response<bool>, TransferError<T::Error>> {
		self.set_eeprom(servo_id, MIN_STARTUP_FORCE, force)
	}

	/// Write an EEPROM register, but only if the value differs from the current value.
	///
	/// The register is read first.
	/// If the value needs to change, the EEPROM is unlocked, the register is written and the EEPROM is locked again.
	/// The lock is restored even if the write fails, and the first failure is returned.
	///
	/// The data of the response is true if the register was written.
	/// After changing the [`ID`] register, the servo is locked again using its new ID.
	pub fn set_eeprom(&mut self, servo_id: u8, register: Register, value: i32) -> Result<Response<bool>, TransferError<T::Error>> {
		let data = register.encode(value)?;
		let current = self.get(servo_id, register)?;
		if current.data == value {
			debug!("{} of servo {} is already {}, not writing", register.name, servo_id, value);
			return Ok(current.map(|_| false));
		}

		debug!("writing {} of servo {}: {} -> {}", register.name, servo_id, current.data, value);
		self.write_u8(servo_id, LOCK.address, 0)?;
		let written = if register == ID {
			self.write_id(servo_id, data[0])
		} else {
			self.write_bytes(servo_id, register.address, &data)
		};

		let lock_id = match &written {
			Ok(response) => response.servo_id,
			Err(_) => servo_id,
		};
		let locked = self.write_u8(lock_id, LOCK.address, 1);
		let written = written?;
		locked?;
		Ok(written.map(|()| true))
	}

	/// Write the ID register, accepting the reply from either the old or the new ID.
	fn write_id(&mut self, servo_id: u8, new_id: u8) -> Result<Response<()>, TransferError<T::Error>> {
		let packet = InstructionPacket::new(servo_id, Instruction::Write, vec![ID.address, new_id]);
		self.write_instruction(&packet)?;
		let deadline = Instant::now() + self.reply_timeout(0);
		loop {
			let status = self.read_status_packet(deadline)?;
			if status.servo_id == servo_id || status.servo_id == new_id {
				let response = Response::<()>::try_from(status)?;
				return Ok(Response {
					servo_id: new_id,
					..response
				});
			}
			debug!("discarding status packet from servo {} while changing ID {} to {}", status.servo_id, servo_id, new_id);
		}
	}
}
