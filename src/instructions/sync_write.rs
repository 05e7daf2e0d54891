use crate::packet::{packet_id, Instruction, InstructionPacket};
use crate::{Client, InvalidParameterCount, TransferError, Transport, WriteError};

/// The data for a sync write: one block of bytes per servo, all written to the same address.
///
/// A group is typically built once and transmitted every control cycle with updated entries.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GroupSyncWrite {
	start_address: u8,
	data_length: u8,
	entries: Vec<(u8, Vec<u8>)>,
}

impl GroupSyncWrite {
	/// Create an empty group that writes `data_length` bytes starting at `start_address`.
	pub fn new(start_address: u8, data_length: u8) -> Self {
		Self {
			start_address,
			data_length,
			entries: Vec::new(),
		}
	}

	/// The address the data is written to.
	pub fn start_address(&self) -> u8 {
		self.start_address
	}

	/// The number of bytes written to each servo.
	pub fn data_length(&self) -> u8 {
		self.data_length
	}

	/// Add the data for a servo, or replace the data if the servo is already part of the group.
	///
	/// A replaced entry keeps its original position in the packet.
	/// The data must be exactly [`Self::data_length()`] bytes.
	pub fn add(&mut self, servo_id: u8, data: &[u8]) -> Result<(), InvalidParameterCount> {
		InvalidParameterCount::check(data.len(), self.data_length.into())?;
		match self.entries.iter_mut().find(|(id, _)| *id == servo_id) {
			Some((_, existing)) => existing.copy_from_slice(data),
			None => self.entries.push((servo_id, data.to_vec())),
		}
		Ok(())
	}

	/// Remove a servo from the group.
	///
	/// Returns the removed data, if the servo was part of the group.
	pub fn remove(&mut self, servo_id: u8) -> Option<Vec<u8>> {
		let index = self.entries.iter().position(|(id, _)| *id == servo_id)?;
		Some(self.entries.remove(index).1)
	}

	/// Remove all servos from the group.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterate over the servo IDs and their data, in the order they are sent.
	pub fn entries(&self) -> impl Iterator<Item = (u8, &[u8])> + '_ {
		self.entries.iter().map(|(id, data)| (*id, data.as_slice()))
	}

	/// The parameters of the sync write instruction for this group.
	pub fn parameters(&self) -> Vec<u8> {
		let mut parameters = Vec::with_capacity(2 + self.entries.len() * (1 + usize::from(self.data_length)));
		parameters.push(self.start_address);
		parameters.push(self.data_length);
		for (servo_id, data) in &self.entries {
			parameters.push(*servo_id);
			parameters.extend_from_slice(data);
		}
		parameters
	}
}

impl<T> Client<T>
where
	T: Transport,
{
	/// Write the data of a group to all servos in the group with a single broadcast instruction.
	///
	/// The servos do not reply to a sync write,
	/// so success only means that the instruction was transmitted.
	///
	/// An empty group is rejected without touching the bus.
	pub fn sync_write(&mut self, group: &GroupSyncWrite) -> Result<(), TransferError<T::Error>> {
		if group.is_empty() {
			return Err(WriteError::EmptyGroup.into());
		}
		let packet = InstructionPacket::new(packet_id::BROADCAST, Instruction::SyncWrite, group.parameters());
		self.transact(&packet, false, Default::default())?;
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	#[test]
	fn parameters_in_insertion_order() {
		let mut group = GroupSyncWrite::new(42, 2);
		assert!(let Ok(()) = group.add(1, &[0x10, 0x20]));
		assert!(let Ok(()) = group.add(2, &[0x30, 0x40]));
		assert!(group.parameters() == [42, 2, 1, 0x10, 0x20, 2, 0x30, 0x40]);
	}

	#[test]
	fn replace_keeps_position() {
		let mut group = GroupSyncWrite::new(42, 2);
		assert!(let Ok(()) = group.add(7, &[1, 1]));
		assert!(let Ok(()) = group.add(3, &[2, 2]));
		assert!(let Ok(()) = group.add(7, &[9, 9]));
		assert!(group.len() == 2);
		assert!(group.parameters() == [42, 2, 7, 9, 9, 3, 2, 2]);
	}

	#[test]
	fn reject_wrong_length() {
		let mut group = GroupSyncWrite::new(42, 2);
		let_assert!(Err(e) = group.add(1, &[1, 2, 3]));
		assert!(e.actual == 3);
		assert!(group.is_empty());
	}

	#[test]
	fn remove_and_clear() {
		let mut group = GroupSyncWrite::new(42, 1);
		assert!(let Ok(()) = group.add(1, &[1]));
		assert!(let Ok(()) = group.add(2, &[2]));
		assert!(group.remove(1) == Some(vec![1]));
		assert!(group.remove(1) == None);
		assert!(group.entries().collect::<Vec<_>>() == [(2, &[2u8][..])]);
		group.clear();
		assert!(group.is_empty());
	}
}
