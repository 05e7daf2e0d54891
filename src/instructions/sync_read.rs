use std::collections::BTreeMap;
use std::time::Instant;

use crate::codec::read_u16_le;
use crate::packet::{packet_id, ErrorFlags, Instruction, InstructionPacket};
use crate::{Client, CommResult, InvalidMessage, ReadError, TransferError, Transport, WriteError};

/// The result of a sync read for one servo.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SyncReadEntry {
	/// The data read from the servo.
	///
	/// Empty if `comm_result` is not [`CommResult::Success`].
	pub data: Vec<u8>,

	/// The outcome of the reply of this servo.
	pub comm_result: CommResult,

	/// The fault bits reported by the servo.
	pub error: ErrorFlags,
}

/// A set of servos to read the same register range from with a single instruction.
///
/// After [`Client::sync_read`], servos that answered have an entry in [`Self::last_result()`].
/// A servo without entry did not answer at all,
/// while an entry with a [`CommResult`] other than `Success` means the servo answered with a corrupt reply.
#[derive(Debug, Clone)]
pub struct GroupSyncRead {
	start_address: u8,
	data_length: u8,
	servo_ids: Vec<u8>,
	last_result: BTreeMap<u8, SyncReadEntry>,
}

impl GroupSyncRead {
	/// Create an empty group that reads `data_length` bytes starting at `start_address`.
	pub fn new(start_address: u8, data_length: u8) -> Self {
		Self {
			start_address,
			data_length,
			servo_ids: Vec::new(),
			last_result: BTreeMap::new(),
		}
	}

	/// The first address that is read.
	pub fn start_address(&self) -> u8 {
		self.start_address
	}

	/// The number of bytes read from each servo.
	pub fn data_length(&self) -> u8 {
		self.data_length
	}

	/// Add a servo to the group.
	///
	/// Adding a servo that is already part of the group has no effect.
	pub fn add(&mut self, servo_id: u8) {
		if !self.servo_ids.contains(&servo_id) {
			self.servo_ids.push(servo_id);
		}
	}

	/// Remove a servo from the group, including its last result.
	///
	/// Returns true if the servo was part of the group.
	pub fn remove(&mut self, servo_id: u8) -> bool {
		self.last_result.remove(&servo_id);
		let len = self.servo_ids.len();
		self.servo_ids.retain(|&id| id != servo_id);
		self.servo_ids.len() != len
	}

	/// Remove all servos and results from the group.
	pub fn clear(&mut self) {
		self.servo_ids.clear();
		self.last_result.clear();
	}

	/// The servos in the group, in the order they were added.
	pub fn ids(&self) -> &[u8] {
		&self.servo_ids
	}

	pub fn len(&self) -> usize {
		self.servo_ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.servo_ids.is_empty()
	}

	/// The results of the last sync read, by servo ID.
	pub fn last_result(&self) -> &BTreeMap<u8, SyncReadEntry> {
		&self.last_result
	}

	/// The result of the last sync read for one servo.
	pub fn get(&self, servo_id: u8) -> Option<&SyncReadEntry> {
		self.last_result.get(&servo_id)
	}

	/// Iterate over the servos that did not answer the last sync read.
	pub fn missing(&self) -> impl Iterator<Item = u8> + '_ {
		self.servo_ids
			.iter()
			.copied()
			.filter(|id| !self.last_result.contains_key(id))
	}

	/// Check if every servo in the group answered the last sync read with a valid reply.
	pub fn is_complete(&self) -> bool {
		self.servo_ids
			.iter()
			.all(|id| self.last_result.get(id).is_some_and(|entry| entry.comm_result.is_success()))
	}

	/// Extract a little endian value of `width` bytes at `address` from the last result of a servo.
	///
	/// Returns `None` if the servo has no valid result,
	/// if the requested field is not inside the read range or if the width is not 1 or 2.
	pub fn value(&self, servo_id: u8, address: u8, width: u8) -> Option<u16> {
		let entry = self.get(servo_id)?;
		if !entry.comm_result.is_success() {
			return None;
		}
		let offset = usize::from(address.checked_sub(self.start_address)?);
		let field = entry.data.get(offset..offset + usize::from(width))?;
		match width {
			1 => Some(field[0].into()),
			2 => Some(read_u16_le(field)),
			_ => None,
		}
	}

	/// The parameters of the sync read instruction for this group.
	pub fn parameters(&self) -> Vec<u8> {
		let mut parameters = Vec::with_capacity(2 + self.servo_ids.len());
		parameters.push(self.start_address);
		parameters.push(self.data_length);
		parameters.extend_from_slice(&self.servo_ids);
		parameters
	}

	fn record(&mut self, servo_id: u8, entry: SyncReadEntry) {
		// A valid reply is never overwritten by a later duplicate.
		match self.last_result.get(&servo_id) {
			Some(existing) if existing.comm_result.is_success() => (),
			_ => {
				self.last_result.insert(servo_id, entry);
			},
		}
	}
}

impl<T> Client<T>
where
	T: Transport,
{
	/// Read the same register range from all servos in a group with a single broadcast instruction.
	///
	/// The results are stored in the group, replacing the results of the previous read.
	/// One reply is awaited per servo in the group, each with its own timeout.
	/// Replies are matched to servos by the ID in the reply, not by their position.
	/// Replies from servos that are not part of the group are ignored and do not count as one of the awaited replies.
	///
	/// Slow or missing servos do not cause an error: they have no entry in [`GroupSyncRead::last_result()`].
	/// An error is only returned if the instruction could not be sent, or if the transport failed while reading.
	/// An empty group is rejected without touching the bus.
	pub fn sync_read<'a>(&mut self, group: &'a mut GroupSyncRead) -> Result<&'a BTreeMap<u8, SyncReadEntry>, TransferError<T::Error>> {
		group.last_result.clear();
		if group.is_empty() {
			return Err(WriteError::EmptyGroup.into());
		}

		let packet = InstructionPacket::new(packet_id::BROADCAST, Instruction::SyncRead, group.parameters());
		self.transact(&packet, false, Default::default())?;

		let data_length = usize::from(group.data_length);
		let timeout = self.sync_read_timeout(data_length);
		// Replies from servos outside the group do not use up a slot, but they do not extend its deadline either.
		let mut remaining = group.servo_ids.len();
		let mut deadline = Instant::now() + timeout;
		while remaining > 0 {
			match self.read_status_packet(deadline) {
				Ok(status) => {
					if !group.servo_ids.contains(&status.servo_id) {
						debug!("ignoring sync read reply from servo {} that is not part of the group", status.servo_id);
						continue;
					}
					let entry = if status.parameters.len() == data_length {
						SyncReadEntry {
							data: status.parameters,
							comm_result: CommResult::Success,
							error: status.error,
						}
					} else {
						debug!(
							"sync read reply from servo {} has {} parameters, expected {}",
							status.servo_id,
							status.parameters.len(),
							data_length
						);
						SyncReadEntry {
							data: Vec::new(),
							comm_result: CommResult::RxCorrupt,
							error: status.error,
						}
					};
					group.record(status.servo_id, entry);
				},
				Err(ReadError::Timeout) => {
					debug!("timeout waiting for sync read reply");
				},
				Err(ReadError::InvalidMessage(InvalidMessage::InvalidChecksum(e))) => {
					if group.servo_ids.contains(&e.servo_id) {
						group.record(
							e.servo_id,
							SyncReadEntry {
								data: Vec::new(),
								comm_result: CommResult::RxCorrupt,
								error: ErrorFlags::empty(),
							},
						);
					}
				},
				Err(e) => return Err(e.into()),
			}
			remaining -= 1;
			deadline = Instant::now() + timeout;
		}

		for servo_id in group.missing() {
			debug!("no sync read reply from servo {}", servo_id);
		}
		Ok(&group.last_result)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::assert;

	fn entry(data: &[u8]) -> SyncReadEntry {
		SyncReadEntry {
			data: data.to_vec(),
			comm_result: CommResult::Success,
			error: ErrorFlags::empty(),
		}
	}

	#[test]
	fn add_ignores_duplicates() {
		let mut group = GroupSyncRead::new(56, 2);
		group.add(1);
		group.add(2);
		group.add(1);
		assert!(group.ids() == [1, 2]);
		assert!(group.parameters() == [56, 2, 1, 2]);
		assert!(group.remove(1));
		assert!(!group.remove(1));
		assert!(group.ids() == [2]);
	}

	#[test]
	fn value_inside_window() {
		let mut group = GroupSyncRead::new(56, 4);
		group.add(1);
		group.add(2);
		group.record(1, entry(&[0x00, 0x08, 0x10, 0x80]));

		assert!(group.value(1, 56, 2) == Some(0x0800));
		assert!(group.value(1, 58, 2) == Some(0x8010));
		assert!(group.value(1, 59, 1) == Some(0x80));
		assert!(group.value(1, 59, 2) == None);
		assert!(group.value(1, 55, 1) == None);
		assert!(group.value(1, 56, 4) == None);
		assert!(group.value(2, 56, 2) == None);

		assert!(group.missing().collect::<Vec<_>>() == [2]);
		assert!(!group.is_complete());
	}

	#[test]
	fn corrupt_entry_has_no_value() {
		let mut group = GroupSyncRead::new(56, 2);
		group.add(1);
		group.record(
			1,
			SyncReadEntry {
				data: Vec::new(),
				comm_result: CommResult::RxCorrupt,
				error: ErrorFlags::empty(),
			},
		);
		assert!(group.get(1).is_some());
		assert!(group.value(1, 56, 2) == None);
		assert!(group.missing().count() == 0);

		// A later valid reply replaces the corrupt one, but not the other way around.
		group.record(1, entry(&[1, 0]));
		group.record(
			1,
			SyncReadEntry {
				data: Vec::new(),
				comm_result: CommResult::RxCorrupt,
				error: ErrorFlags::empty(),
			},
		);
		assert!(group.value(1, 56, 2) == Some(1));
		assert!(group.is_complete());
	}
}
