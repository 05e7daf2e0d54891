use assert2::{assert, let_assert};
use feetech_sts::{Client, CommResult, ErrorFlags, GroupSyncRead, GroupSyncWrite};
use test_log::test;

mod common;
use common::mock_transport::status_packet;
use common::MockTransport;

fn setup(servo_ids: &[u8]) -> (Client<MockTransport>, MockTransport) {
	let transport = MockTransport::new(servo_ids);
	let_assert!(Ok(client) = Client::new(transport.clone()));
	(client, transport)
}

fn set_position(transport: &MockTransport, id: u8, raw: [u8; 2]) {
	transport.with_servo(id, |servo| servo.control_table[56..58].copy_from_slice(&raw));
}

#[test]
fn sync_write_packet_layout() {
	let (mut client, transport) = setup(&[1, 2]);
	let mut group = GroupSyncWrite::new(42, 2);
	let_assert!(Ok(()) = group.add(1, &[0x10, 0x20]));
	let_assert!(Ok(()) = group.add(2, &[0x30, 0x40]));
	let_assert!(Ok(()) = client.sync_write(&group));

	let written = transport.written();
	assert!(written.len() == 1);
	let packet = &written[0];
	assert!(packet[..5] == [0xFF, 0xFF, 0xFE, 10, 0x83]);
	assert!(packet[5..13] == [42, 2, 1, 0x10, 0x20, 2, 0x30, 0x40]);

	assert!(transport.with_servo(1, |servo| servo.read(42, 2).to_vec()) == [0x10, 0x20]);
	assert!(transport.with_servo(2, |servo| servo.read(42, 2).to_vec()) == [0x30, 0x40]);
	assert!(transport.discards() == 1);
}

#[test]
fn sync_write_does_not_wait() {
	let (mut client, transport) = setup(&[1]);
	let mut group = GroupSyncWrite::new(40, 1);
	let_assert!(Ok(()) = group.add(1, &[1]));
	let_assert!(Ok(()) = client.sync_write(&group));
	let_assert!(Ok(response) = client.read_u8(1, 40));
	assert!(response.data == 1);
	assert!(transport.writes().len() == 1);
}

#[test]
fn empty_groups_are_rejected() {
	let (mut client, transport) = setup(&[1]);

	let_assert!(Err(e) = client.sync_write(&GroupSyncWrite::new(42, 2)));
	assert!(e.comm_result() == CommResult::NotAvailable);

	let mut group = GroupSyncRead::new(56, 2);
	let_assert!(Err(e) = client.sync_read(&mut group));
	assert!(e.comm_result() == CommResult::NotAvailable);

	assert!(transport.written().is_empty());
}

#[test]
fn sync_read_matches_replies_by_id() {
	let (mut client, transport) = setup(&[1, 2, 3]);
	set_position(&transport, 1, [0x00, 0x08]);
	set_position(&transport, 3, [0x00, 0x88]);
	transport.with_servo(2, |servo| servo.silent = true);
	transport.set_sync_read_order(&[3, 1, 2]);

	let mut group = GroupSyncRead::new(56, 2);
	group.add(1);
	group.add(2);
	group.add(3);
	let_assert!(Ok(results) = client.sync_read(&mut group));
	assert!(results.len() == 2);
	assert!(results[&1].data == [0x00, 0x08]);
	assert!(results[&3].data == [0x00, 0x88]);
	assert!(!results.contains_key(&2));

	assert!(group.value(1, 56, 2) == Some(0x0800));
	assert!(group.value(3, 56, 2) == Some(0x8800));
	assert!(group.value(2, 56, 2) == None);
	assert!(group.missing().collect::<Vec<_>>() == [2]);
	assert!(!group.is_complete());

	let written = transport.written();
	assert!(written[0][..5] == [0xFF, 0xFF, 0xFE, 7, 0x82]);
	assert!(written[0][5..10] == [56, 2, 1, 2, 3]);
}

#[test]
fn sync_read_clears_previous_results() {
	let (mut client, transport) = setup(&[1, 2]);
	let mut group = GroupSyncRead::new(56, 2);
	group.add(1);
	group.add(2);
	let_assert!(Ok(results) = client.sync_read(&mut group));
	assert!(results.len() == 2);

	transport.with_servo(1, |servo| servo.silent = true);
	let_assert!(Ok(results) = client.sync_read(&mut group));
	assert!(results.keys().copied().collect::<Vec<_>>() == [2]);
}

#[test]
fn sync_read_ignores_servos_outside_group() {
	let (mut client, transport) = setup(&[1, 2]);
	let mut replies = status_packet(9, 0, &[0xAA, 0xBB]);
	replies.extend(status_packet(2, 0, &[0x01, 0x02]));
	replies.extend(status_packet(1, 0, &[0x03, 0x04]));
	transport.script_reply(replies);

	let mut group = GroupSyncRead::new(56, 2);
	group.add(1);
	group.add(2);
	let_assert!(Ok(results) = client.sync_read(&mut group));
	assert!(!results.contains_key(&9));
	assert!(results.len() == 2);
	assert!(results[&2].data == [0x01, 0x02]);
	assert!(results[&1].data == [0x03, 0x04]);
	assert!(group.missing().next() == None);
	assert!(group.is_complete());
}

#[test]
fn sync_read_reply_outside_group_does_not_hide_a_silent_member() {
	let (mut client, transport) = setup(&[1, 2]);
	let mut replies = status_packet(2, 0, &[0x01, 0x02]);
	replies.extend(status_packet(7, 0, &[0xAA, 0xBB]));
	transport.script_reply(replies);

	let mut group = GroupSyncRead::new(56, 2);
	group.add(1);
	group.add(2);
	let_assert!(Ok(results) = client.sync_read(&mut group));
	assert!(results.keys().copied().collect::<Vec<_>>() == [2]);
	assert!(group.missing().collect::<Vec<_>>() == [1]);
	assert!(!group.is_complete());
}

#[test]
fn sync_read_marks_corrupt_replies() {
	let (mut client, transport) = setup(&[1, 2, 3]);
	let mut corrupt = status_packet(1, 0, &[0x00, 0x08]);
	let last = corrupt.len() - 1;
	corrupt[last] ^= 0x55;
	let mut replies = corrupt;
	replies.extend(status_packet(2, 0, &[0x00]));
	replies.extend(status_packet(3, 0b100, &[0x10, 0x00]));
	transport.script_reply(replies);

	let mut group = GroupSyncRead::new(56, 2);
	group.add(1);
	group.add(2);
	group.add(3);
	let_assert!(Ok(results) = client.sync_read(&mut group));
	assert!(results[&1].comm_result == CommResult::RxCorrupt);
	assert!(results[&2].comm_result == CommResult::RxCorrupt);
	assert!(results[&3].comm_result == CommResult::Success);
	assert!(results[&3].error == ErrorFlags::CURRENT);

	assert!(group.value(1, 56, 2) == None);
	assert!(group.value(2, 56, 2) == None);
	assert!(group.value(3, 56, 2) == Some(0x0010));
	assert!(!group.is_complete());
}

#[test]
fn sync_read_with_chunked_replies() {
	let (mut client, transport) = setup(&[1, 2]);
	set_position(&transport, 1, [0xFF, 0x0F]);
	set_position(&transport, 2, [0x01, 0x00]);
	transport.set_chunk_size(3);

	let mut group = GroupSyncRead::new(56, 2);
	group.add(1);
	group.add(2);
	let_assert!(Ok(_) = client.sync_read(&mut group));
	assert!(group.value(1, 56, 2) == Some(0x0FFF));
	assert!(group.value(2, 56, 2) == Some(0x0001));
	assert!(group.is_complete());
}
