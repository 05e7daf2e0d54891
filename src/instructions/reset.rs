use crate::packet::{Instruction, Response};
use crate::{Client, TransferError, Transport};

impl<T> Client<T>
where
	T: Transport,
{
	/// Reset the control table of a servo to the factory defaults.
	///
	/// This also resets the ID of the servo, so it may no longer be reachable on the old ID.
	///
	/// You may specify [`crate::packet_id::BROADCAST`] as servo ID.
	/// If you do, none of the servos will reply with a response, and this function will not wait for any.
	pub fn reset(&mut self, servo_id: u8) -> Result<Response<()>, TransferError<T::Error>> {
		let response = self.transfer_single(servo_id, Instruction::Reset, Vec::new(), 0)?;
		Ok(super::expect_empty(response)?)
	}
}
