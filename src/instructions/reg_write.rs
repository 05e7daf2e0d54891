use crate::packet::{Instruction, Response};
use crate::{Client, TransferError, Transport};

impl<T> Client<T>
where
	T: Transport,
{
	/// Register a write of an arbitrary number of bytes, to be triggered later by an `action` command.
	///
	/// Only one write command can be registered per servo.
	///
	/// You can have all connected servos execute their registered write by calling [`Self::action`]
	/// with [`crate::packet_id::BROADCAST`], or a single servo by using its own ID.
	pub fn reg_write(&mut self, servo_id: u8, address: u8, data: &[u8]) -> Result<Response<()>, TransferError<T::Error>> {
		let mut parameters = Vec::with_capacity(1 + data.len());
		parameters.push(address);
		parameters.extend_from_slice(data);
		let response = self.transfer_single(servo_id, Instruction::RegWrite, parameters, 0)?;
		Ok(super::expect_empty(response)?)
	}
}
