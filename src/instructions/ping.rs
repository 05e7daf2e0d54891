use crate::packet::{Instruction, Response};
use crate::{Client, ReadError, TransferError, Transport};

impl<T> Client<T>
where
	T: Transport,
{
	/// Ping a specific servo.
	///
	/// Servos do not reply to a broadcast ping, so pinging [`crate::packet_id::BROADCAST`] only transmits the instruction.
	/// Use [`Self::scan()`] to find the servos on the bus.
	pub fn ping(&mut self, servo_id: u8) -> Result<Response<()>, TransferError<T::Error>> {
		let response = self.transfer_single(servo_id, Instruction::Ping, Vec::new(), 0)?;
		Ok(super::expect_empty(response)?)
	}

	/// Ping all given IDs one by one and collect the replies.
	///
	/// IDs that do not answer before the reply timeout are left out of the result.
	/// Any other error aborts the scan.
	pub fn scan(&mut self, servo_ids: impl IntoIterator<Item = u8>) -> Result<Vec<Response<()>>, TransferError<T::Error>> {
		let mut found = Vec::new();
		for servo_id in servo_ids {
			match self.ping(servo_id) {
				Ok(response) => {
					debug!("found servo {}", servo_id);
					found.push(response);
				},
				Err(TransferError::ReadError(ReadError::Timeout)) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(found)
	}
}
