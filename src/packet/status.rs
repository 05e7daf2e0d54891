use crate::codec::read_u16_le;

/// The fault bits reported by a servo in the error field of a status packet.
///
/// A servo reporting a fault still executed the instruction:
/// the flags are reported next to the data, not instead of it.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ErrorFlags(u8);

impl ErrorFlags {
	pub const OVERLOAD: Self = Self(0b00001);
	pub const ANGLE: Self = Self(0b00010);
	pub const CURRENT: Self = Self(0b00100);
	pub const TEMPERATURE: Self = Self(0b01000);
	pub const VOLTAGE: Self = Self(0b10000);

	const NAMES: [(Self, &'static str); 5] = [
		(Self::OVERLOAD, "overload"),
		(Self::ANGLE, "angle"),
		(Self::CURRENT, "current"),
		(Self::TEMPERATURE, "temperature"),
		(Self::VOLTAGE, "voltage"),
	];

	/// No fault bits set.
	pub const fn empty() -> Self {
		Self(0)
	}

	/// Wrap the raw error byte of a status packet.
	///
	/// Unknown bits are preserved.
	pub const fn from_bits(bits: u8) -> Self {
		Self(bits)
	}

	/// The raw error byte.
	pub const fn bits(self) -> u8 {
		self.0
	}

	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Check if all bits of `other` are set in `self`.
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Iterate over the names of the known faults that are set.
	pub fn names(self) -> impl Iterator<Item = &'static str> {
		Self::NAMES
			.into_iter()
			.filter(move |(flag, _)| self.contains(*flag))
			.map(|(_, name)| name)
	}
}

impl core::ops::BitOr for ErrorFlags {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

impl std::fmt::Debug for ErrorFlags {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "ErrorFlags({:#07b})", self.0)
	}
}

impl std::fmt::Display for ErrorFlags {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.is_empty() {
			return write!(f, "no error");
		}
		for (i, name) in self.names().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{}", name)?;
		}
		Ok(())
	}
}

/// A status packet sent by a servo in reply to an instruction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatusPacket {
	/// The ID of the servo that sent the packet.
	pub servo_id: u8,

	/// The fault bits reported by the servo.
	pub error: ErrorFlags,

	/// The parameters of the packet.
	pub parameters: Vec<u8>,

	/// True if the checksum of the packet matched its contents.
	pub checksum_valid: bool,
}

/// A response from a servo.
///
/// Note that the `Eq` and `PartialEq` compare all fields of the struct,
/// including the `servo_id` and `error`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Response<T> {
	/// The servo that sent the response.
	pub servo_id: u8,

	/// The fault bits from the response message.
	///
	/// These do not mean the instruction failed.
	/// It is up to the caller to decide if a reported fault is a reason to stop.
	pub error: ErrorFlags,

	/// The data from the servo.
	pub data: T,
}

impl<T> Response<T> {
	/// Replace the data of the response, keeping the servo ID and error flags.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
		Response {
			servo_id: self.servo_id,
			error: self.error,
			data: f(self.data),
		}
	}
}

impl TryFrom<StatusPacket> for Response<()> {
	type Error = crate::InvalidParameterCount;

	fn try_from(status_packet: StatusPacket) -> Result<Self, Self::Error> {
		crate::InvalidParameterCount::check(status_packet.parameters.len(), 0)?;
		Ok(Self {
			servo_id: status_packet.servo_id,
			error: status_packet.error,
			data: (),
		})
	}
}

impl From<StatusPacket> for Response<Vec<u8>> {
	fn from(status_packet: StatusPacket) -> Self {
		Self {
			servo_id: status_packet.servo_id,
			error: status_packet.error,
			data: status_packet.parameters,
		}
	}
}

impl TryFrom<StatusPacket> for Response<u8> {
	type Error = crate::InvalidParameterCount;

	fn try_from(status_packet: StatusPacket) -> Result<Self, Self::Error> {
		crate::InvalidParameterCount::check(status_packet.parameters.len(), 1)?;
		Ok(Self {
			servo_id: status_packet.servo_id,
			error: status_packet.error,
			data: status_packet.parameters[0],
		})
	}
}

impl TryFrom<StatusPacket> for Response<u16> {
	type Error = crate::InvalidParameterCount;

	fn try_from(status_packet: StatusPacket) -> Result<Self, Self::Error> {
		crate::InvalidParameterCount::check(status_packet.parameters.len(), 2)?;
		Ok(Self {
			servo_id: status_packet.servo_id,
			error: status_packet.error,
			data: read_u16_le(&status_packet.parameters),
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	fn status(parameters: &[u8], error: u8) -> StatusPacket {
		StatusPacket {
			servo_id: 3,
			error: ErrorFlags::from_bits(error),
			parameters: parameters.to_vec(),
			checksum_valid: true,
		}
	}

	#[test]
	fn error_flags() {
		let flags = ErrorFlags::OVERLOAD | ErrorFlags::VOLTAGE;
		assert!(flags.bits() == 0b10001);
		assert!(flags.contains(ErrorFlags::OVERLOAD));
		assert!(!flags.contains(ErrorFlags::ANGLE));
		assert!(flags.names().collect::<Vec<_>>() == ["overload", "voltage"]);
		assert!(flags.to_string() == "overload, voltage");
		assert!(ErrorFlags::empty().to_string() == "no error");
	}

	#[test]
	fn response_from_status() {
		let_assert!(Ok(response) = Response::<u16>::try_from(status(&[0x00, 0x08], 0)));
		assert!(response.servo_id == 3);
		assert!(response.data == 0x0800);
		assert!(response.error.is_empty());

		let_assert!(Ok(response) = Response::<u8>::try_from(status(&[7], 0b01000)));
		assert!(response.data == 7);
		assert!(response.error == ErrorFlags::TEMPERATURE);

		let_assert!(Err(e) = Response::<u16>::try_from(status(&[1], 0)));
		assert!(e.actual == 1);

		let_assert!(Ok(_) = Response::<()>::try_from(status(&[], 0)));
	}
}
