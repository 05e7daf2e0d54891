use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use feetech_sts::packet::frame;
use feetech_sts::packet::{instruction_id, packet_id};
use feetech_sts::{ReadError, Transport};
use log::trace;

const CONTROL_TABLE_SIZE: usize = 128;
const LOCK_ADDRESS: usize = 55;

/// An emulated servo with its own control table.
#[derive(Debug, Clone)]
pub struct MockServo {
	pub id: u8,
	pub control_table: Vec<u8>,

	/// The error byte sent in every reply.
	pub error: u8,

	/// A silent servo executes instructions but never replies.
	pub silent: bool,

	registered: Option<(usize, Vec<u8>)>,
}

impl MockServo {
	pub fn new(id: u8) -> Self {
		let mut control_table = vec![0; CONTROL_TABLE_SIZE];
		control_table[5] = id;
		control_table[LOCK_ADDRESS] = 1;
		Self {
			id,
			control_table,
			error: 0,
			silent: false,
			registered: None,
		}
	}

	pub fn read(&self, address: usize, count: usize) -> &[u8] {
		&self.control_table[address..address + count]
	}

	fn write(&mut self, address: usize, data: &[u8]) {
		self.control_table[address..address + data.len()].copy_from_slice(data);
		self.id = self.control_table[5];
	}
}

/// A write to the control table of a servo, as seen by the mock.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LoggedWrite {
	pub servo_id: u8,
	pub address: u8,
	pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
	servos: Vec<MockServo>,
	input: VecDeque<u8>,
	written: Vec<Vec<u8>>,
	writes: Vec<LoggedWrite>,
	scripted: VecDeque<Vec<u8>>,
	sync_read_order: Option<Vec<u8>>,
	chunk_size: Option<usize>,
	fail_writes: bool,
	discards: usize,
	baud_rate: u32,
}

/// An in-memory transport that emulates servos on a bus.
///
/// Replies are queued when an instruction is written, so they are available as soon as the client starts reading.
/// Reading from an empty input immediately reports a timeout.
#[derive(Debug, Clone)]
pub struct MockTransport {
	state: Arc<Mutex<State>>,
}

impl MockTransport {
	pub fn new(servo_ids: &[u8]) -> Self {
		let state = State {
			servos: servo_ids.iter().map(|&id| MockServo::new(id)).collect(),
			baud_rate: 1_000_000,
			..Default::default()
		};
		Self {
			state: Arc::new(Mutex::new(state)),
		}
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap()
	}

	/// Access an emulated servo by its current ID.
	pub fn with_servo<R>(&self, id: u8, f: impl FnOnce(&mut MockServo) -> R) -> R {
		let mut state = self.state();
		let servo = state.servos.iter_mut().find(|servo| servo.id == id).unwrap();
		f(servo)
	}

	/// Replace the emulated reply to the next instruction with raw bytes.
	///
	/// Each call scripts the reply of one more instruction.
	pub fn script_reply(&self, raw: Vec<u8>) {
		self.state().scripted.push_back(raw);
	}

	/// Put bytes in the input buffer, as if they arrived before the next instruction.
	pub fn push_input(&self, data: &[u8]) {
		self.state().input.extend(data);
	}

	/// Set the order in which servos reply to a sync read.
	pub fn set_sync_read_order(&self, order: &[u8]) {
		self.state().sync_read_order = Some(order.to_vec());
	}

	/// Deliver at most `size` bytes per read call.
	pub fn set_chunk_size(&self, size: usize) {
		self.state().chunk_size = Some(size);
	}

	pub fn set_fail_writes(&self, fail: bool) {
		self.state().fail_writes = fail;
	}

	/// All packets written to the bus so far.
	pub fn written(&self) -> Vec<Vec<u8>> {
		self.state().written.clone()
	}

	/// All control table writes executed by the servos so far.
	pub fn writes(&self) -> Vec<LoggedWrite> {
		self.state().writes.clone()
	}

	pub fn discards(&self) -> usize {
		self.state().discards
	}
}

/// Build a status packet the way a servo sends it.
pub fn status_packet(id: u8, error: u8, parameters: &[u8]) -> Vec<u8> {
	let mut packet = vec![0xFF, 0xFF, id, parameters.len() as u8 + 2, error];
	packet.extend_from_slice(parameters);
	packet.push(frame::checksum(&packet[2..]));
	packet
}

impl State {
	fn reply(&mut self, servo_index: usize, parameters: &[u8]) {
		let servo = &self.servos[servo_index];
		if !servo.silent {
			let packet = status_packet(servo.id, servo.error, parameters);
			self.input.extend(packet);
		}
	}

	fn log_write(&mut self, servo_index: usize, address: usize, data: &[u8]) {
		let servo_id = self.servos[servo_index].id;
		self.writes.push(LoggedWrite {
			servo_id,
			address: address as u8,
			data: data.to_vec(),
		});
		self.servos[servo_index].write(address, data);
	}

	fn execute(&mut self, target: u8, instruction: u8, parameters: &[u8]) {
		let broadcast = target == packet_id::BROADCAST;
		match instruction {
			instruction_id::SYNC_WRITE => {
				let address = usize::from(parameters[0]);
				let length = usize::from(parameters[1]);
				for chunk in parameters[2..].chunks(length + 1) {
					if let Some(index) = self.servos.iter().position(|servo| servo.id == chunk[0]) {
						self.log_write(index, address, &chunk[1..]);
					}
				}
				return;
			},
			instruction_id::SYNC_READ => {
				let address = usize::from(parameters[0]);
				let length = usize::from(parameters[1]);
				let requested = &parameters[2..];
				let order = self.sync_read_order.clone().unwrap_or_else(|| requested.to_vec());
				for id in order {
					if !requested.contains(&id) {
						continue;
					}
					if let Some(index) = self.servos.iter().position(|servo| servo.id == id) {
						let data = self.servos[index].read(address, length).to_vec();
						self.reply(index, &data);
					}
				}
				return;
			},
			_ => (),
		}

		let targets: Vec<usize> = (0..self.servos.len())
			.filter(|&index| broadcast || self.servos[index].id == target)
			.collect();
		for index in targets {
			let reply: Vec<u8> = match instruction {
				instruction_id::PING => Vec::new(),
				instruction_id::READ => {
					let address = usize::from(parameters[0]);
					let count = usize::from(parameters[1]);
					self.servos[index].read(address, count).to_vec()
				},
				instruction_id::WRITE => {
					self.log_write(index, parameters[0].into(), &parameters[1..]);
					Vec::new()
				},
				instruction_id::REG_WRITE => {
					self.servos[index].registered = Some((parameters[0].into(), parameters[1..].to_vec()));
					Vec::new()
				},
				instruction_id::ACTION => {
					if let Some((address, data)) = self.servos[index].registered.take() {
						self.log_write(index, address, &data);
					}
					Vec::new()
				},
				instruction_id::RESET => {
					let id = self.servos[index].id;
					self.servos[index] = MockServo::new(id);
					Vec::new()
				},
				other => panic!("unknown instruction: {:#04X}", other),
			};
			if !broadcast {
				self.reply(index, &reply);
			}
		}
	}
}

impl Transport for MockTransport {
	type Error = std::io::Error;

	fn baud_rate(&self) -> Result<u32, Self::Error> {
		Ok(self.state().baud_rate)
	}

	fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), Self::Error> {
		self.state().baud_rate = baud_rate;
		Ok(())
	}

	fn discard_input_buffer(&mut self) -> Result<(), Self::Error> {
		let mut state = self.state();
		state.input.clear();
		state.discards += 1;
		Ok(())
	}

	fn read(&mut self, buffer: &mut [u8], _timeout: Duration) -> Result<usize, ReadError<Self::Error>> {
		let mut state = self.state();
		if state.input.is_empty() {
			return Err(ReadError::Timeout);
		}
		let count = state.input.len().min(buffer.len()).min(state.chunk_size.unwrap_or(usize::MAX));
		for (target, byte) in buffer.iter_mut().zip(state.input.drain(..count)) {
			*target = byte;
		}
		trace!("mock read: {:02X?}", &buffer[..count]);
		Ok(count)
	}

	fn write_all(&mut self, buffer: &[u8]) -> Result<(), Self::Error> {
		let mut state = self.state();
		if state.fail_writes {
			return Err(std::io::ErrorKind::BrokenPipe.into());
		}
		trace!("mock write: {:02X?}", buffer);
		state.written.push(buffer.to_vec());

		// Instruction packets have the same layout as status packets, with the instruction in place of the error byte.
		let packet = frame::decode(buffer).unwrap().packet;

		if let Some(raw) = state.scripted.pop_front() {
			state.input.extend(raw);
			return Ok(());
		}
		state.execute(packet.servo_id, packet.error.bits(), &packet.parameters);
		Ok(())
	}
}
