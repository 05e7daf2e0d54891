use assert2::{assert, let_assert};
use feetech_sts::registers::{self, BaudRate, Mode, GOAL_POSITION, MAX_ANGLE_LIMIT, PRESENT_LOAD};
use feetech_sts::{Client, CommResult, ErrorFlags};
use test_log::test;

mod common;
use common::mock_transport::{status_packet, LoggedWrite};
use common::MockTransport;

fn setup(servo_ids: &[u8]) -> (Client<MockTransport>, MockTransport) {
	let transport = MockTransport::new(servo_ids);
	let_assert!(Ok(client) = Client::new(transport.clone()));
	(client, transport)
}

fn logged(servo_id: u8, address: u8, data: &[u8]) -> LoggedWrite {
	LoggedWrite {
		servo_id,
		address,
		data: data.to_vec(),
	}
}

#[test]
fn set_encodes_signed_values() {
	let (mut client, transport) = setup(&[1]);
	let_assert!(Ok(_) = client.set_goal_position(1, -2048));
	let_assert!(Ok(_) = client.set_goal_speed(1, 2400));
	assert!(transport.writes() == [logged(1, 42, &[0x00, 0x88]), logged(1, 46, &[0x60, 0x09])]);

	let_assert!(Ok(response) = client.get(1, GOAL_POSITION));
	assert!(response.data == -2048);
}

#[test]
fn negative_zero_reads_as_zero() {
	let (mut client, transport) = setup(&[1]);
	transport.with_servo(1, |servo| servo.control_table[60..62].copy_from_slice(&[0x00, 0x80]));
	let_assert!(Ok(response) = client.get(1, PRESENT_LOAD));
	assert!(response.data == 0);
}

#[test]
fn out_of_range_value_is_not_sent() {
	let (mut client, transport) = setup(&[1]);
	let_assert!(Err(e) = client.set_goal_position(1, 40_000));
	assert!(e.comm_result() == CommResult::TxError);
	let_assert!(Err(_) = client.set_max_angle_limit(1, -40_000));
	assert!(transport.written().is_empty());
}

#[test]
fn typed_getters() {
	let (mut client, transport) = setup(&[1]);
	transport.with_servo(1, |servo| {
		servo.control_table[33] = 1;
		servo.control_table[6] = 4;
		servo.control_table[65] = 0b10010;
		servo.control_table[66] = 1;
		servo.control_table[62] = 121;
	});
	let_assert!(Ok(response) = client.mode(1));
	assert!(response.data == Some(Mode::Speed));
	let_assert!(Ok(response) = client.configured_baud_rate(1));
	assert!(response.data == Some(BaudRate::Baud115200));
	let_assert!(Ok(response) = client.status(1));
	assert!(response.data == ErrorFlags::ANGLE | ErrorFlags::VOLTAGE);
	let_assert!(Ok(response) = client.moving(1));
	assert!(response.data);
	let_assert!(Ok(response) = client.present_voltage(1));
	assert!(response.data == 121);
	let_assert!(Ok(response) = client.lock(1));
	assert!(response.data);
	let_assert!(Ok(response) = client.read_id(1));
	assert!(response.data == 1);
}

#[test]
fn eeprom_write_is_wrapped_in_unlock_and_lock() {
	let (mut client, transport) = setup(&[1]);
	let_assert!(Ok(response) = client.set_max_angle_limit(1, 4000));
	assert!(response.data);
	assert!(transport.writes() == [logged(1, 55, &[0]), logged(1, 11, &[0xA0, 0x0F]), logged(1, 55, &[1])]);
	assert!(transport.with_servo(1, |servo| servo.control_table[55]) == 1);
	let_assert!(Ok(response) = client.max_angle_limit(1));
	assert!(response.data == 4000);
}

#[test]
fn unchanged_eeprom_value_is_not_written() {
	let (mut client, transport) = setup(&[1]);
	let_assert!(Ok(response) = client.set_max_angle_limit(1, 4000));
	assert!(response.data);
	let_assert!(Ok(response) = client.set_max_angle_limit(1, 4000));
	assert!(!response.data);
	assert!(transport.writes().len() == 3);
}

#[test]
fn set_mode_uses_the_lock() {
	let (mut client, transport) = setup(&[2]);
	let_assert!(Ok(response) = client.set_mode(2, Mode::Pwm));
	assert!(response.data);
	assert!(transport.writes()[1] == logged(2, 33, &[Mode::Pwm.code()]));
	let_assert!(Ok(response) = client.mode(2));
	assert!(response.data == Some(Mode::Pwm));
}

#[test]
fn change_id() {
	let (mut client, transport) = setup(&[1]);
	let_assert!(Ok(response) = client.set_id(1, 5));
	assert!(response.servo_id == 5);
	assert!(response.data);

	// The lock is restored through the new ID.
	assert!(transport.writes() == [logged(1, 55, &[0]), logged(1, 5, &[5]), logged(5, 55, &[1])]);
	let_assert!(Err(_) = client.ping(1));
	let_assert!(Ok(response) = client.read_id(5));
	assert!(response.data == 5);
	let_assert!(Ok(response) = client.lock(5));
	assert!(response.data);
}

#[test]
fn change_id_to_same_id_does_nothing() {
	let (mut client, transport) = setup(&[3]);
	let_assert!(Ok(response) = client.set_id(3, 3));
	assert!(!response.data);
	assert!(transport.writes().is_empty());
}

#[test]
fn failed_eeprom_write_still_locks() {
	let (mut client, transport) = setup(&[1]);
	transport.with_servo(1, |servo| servo.control_table[55] = 0);
	// Scripted replies to the read, the unlock and the register write. Only the final lock is executed.
	transport.script_reply(status_packet(1, 0, &[0, 0]));
	transport.script_reply(status_packet(1, 0, &[]));
	transport.script_reply(vec![0xFF, 0xFF, 0x01, 0x02, 0x00, 0x00]);
	let_assert!(Err(e) = client.set_max_angle_limit(1, 4000));
	assert!(e.comm_result() == CommResult::RxCorrupt);
	assert!(transport.writes() == [logged(1, 55, &[1])]);
	assert!(transport.with_servo(1, |servo| servo.control_table[55]) == 1);
}

#[test]
fn motion_group_moves_servos() {
	let (mut client, _transport) = setup(&[1, 2]);
	let mut group = registers::motion_group();
	let_assert!(Ok(data) = registers::motion_entry(50, -8190, 2400));
	let_assert!(Ok(()) = group.add(1, &data));
	let_assert!(Ok(data) = registers::motion_entry(50, 8190, 2400));
	let_assert!(Ok(()) = group.add(2, &data));
	let_assert!(Ok(()) = client.sync_write(&group));

	let_assert!(Ok(response) = client.get(1, GOAL_POSITION));
	assert!(response.data == -8190);
	let_assert!(Ok(response) = client.get(2, GOAL_POSITION));
	assert!(response.data == 8190);
	let_assert!(Ok(response) = client.get(2, MAX_ANGLE_LIMIT));
	assert!(response.data == 0);
}
