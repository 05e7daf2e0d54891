use crate::codec::split_low_high;
use crate::packet::{Instruction, Response};
use crate::{Client, TransferError, Transport};

impl<T> Client<T>
where
	T: Transport,
{
	/// Write an arbitrary number of bytes to a specific servo.
	///
	/// You may specify [`crate::packet_id::BROADCAST`] as servo ID.
	/// If you do, none of the servos will reply with a response, and this function will not wait for any.
	pub fn write_bytes(&mut self, servo_id: u8, address: u8, data: &[u8]) -> Result<Response<()>, TransferError<T::Error>> {
		let mut parameters = Vec::with_capacity(1 + data.len());
		parameters.push(address);
		parameters.extend_from_slice(data);
		let response = self.transfer_single(servo_id, Instruction::Write, parameters, 0)?;
		Ok(super::expect_empty(response)?)
	}

	/// Write an 8 bit value to a specific servo.
	///
	/// You may specify [`crate::packet_id::BROADCAST`] as servo ID.
	/// If you do, none of the servos will reply with a response, and this function will not wait for any.
	pub fn write_u8(&mut self, servo_id: u8, address: u8, value: u8) -> Result<Response<()>, TransferError<T::Error>> {
		self.write_bytes(servo_id, address, &[value])
	}

	/// Write a 16 bit value to a specific servo, low byte first.
	///
	/// You may specify [`crate::packet_id::BROADCAST`] as servo ID.
	/// If you do, none of the servos will reply with a response, and this function will not wait for any.
	pub fn write_u16(&mut self, servo_id: u8, address: u8, value: u16) -> Result<Response<()>, TransferError<T::Error>> {
		let (low, high) = split_low_high(value);
		self.write_bytes(servo_id, address, &[low, high])
	}
}
