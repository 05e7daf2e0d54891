use crate::codec::read_u16_le;
use crate::packet::{Instruction, Response};
use crate::{Client, TransferError, Transport};

impl<T> Client<T>
where
	T: Transport,
{
	/// Read `count` bytes from the control table of a specific servo, starting at `address`.
	pub fn read_bytes(&mut self, servo_id: u8, address: u8, count: u8) -> Result<Response<Vec<u8>>, TransferError<T::Error>> {
		let response = self.transfer_single(servo_id, Instruction::Read, vec![address, count], count.into())?;
		crate::InvalidParameterCount::check(response.data.len(), count.into())?;
		Ok(response)
	}

	/// Read an 8 bit value from a specific servo.
	pub fn read_u8(&mut self, servo_id: u8, address: u8) -> Result<Response<u8>, TransferError<T::Error>> {
		let response = self.read_bytes(servo_id, address, 1)?;
		Ok(response.map(|data| data[0]))
	}

	/// Read a 16 bit little endian value from a specific servo.
	pub fn read_u16(&mut self, servo_id: u8, address: u8) -> Result<Response<u16>, TransferError<T::Error>> {
		let response = self.read_bytes(servo_id, address, 2)?;
		Ok(response.map(|data| read_u16_le(&data)))
	}
}
