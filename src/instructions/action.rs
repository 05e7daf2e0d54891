use crate::packet::{Instruction, Response};
use crate::{Client, TransferError, Transport};

impl<T> Client<T>
where
	T: Transport,
{
	/// Send an action command to trigger a previously registered write.
	///
	/// This function never waits for a reply, so the returned response has no data and no fault bits.
	/// Use [`crate::packet_id::BROADCAST`] as servo ID to trigger all servos at once.
	pub fn action(&mut self, servo_id: u8) -> Result<Response<()>, TransferError<T::Error>> {
		let response = self.transfer_single(servo_id, Instruction::Action, Vec::new(), 0)?;
		Ok(super::expect_empty(response)?)
	}
}
