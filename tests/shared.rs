use assert2::{assert, let_assert};
use feetech_sts::{Client, CommResult, SharedClient};
use test_log::test;

mod common;
use common::MockTransport;

fn setup(servo_ids: &[u8]) -> (SharedClient<MockTransport>, MockTransport) {
	let transport = MockTransport::new(servo_ids);
	let_assert!(Ok(client) = Client::new(transport.clone()));
	(SharedClient::new(client), transport)
}

#[test]
fn try_lock_reports_busy_port() {
	let (client, _transport) = setup(&[1]);
	let other = client.clone();

	let guard = client.lock();
	let_assert!(Err(e) = other.try_lock());
	assert!(e.comm_result() == CommResult::PortBusy);
	drop(guard);

	let_assert!(Ok(mut guard) = other.try_lock());
	let_assert!(Ok(_) = guard.ping(1));
}

#[test]
fn threads_take_turns_on_the_bus() {
	let (client, transport) = setup(&[1, 2, 3, 4]);

	let handles: Vec<_> = (1..=4u8)
		.map(|servo_id| {
			let client = client.clone();
			std::thread::spawn(move || {
				for value in 0..10u8 {
					let_assert!(Ok(_) = client.with(|client| client.write_u8(servo_id, 41, value)));
					let_assert!(Ok(response) = client.with(|client| client.read_u8(servo_id, 41)));
					assert!(response.servo_id == servo_id);
					assert!(response.data == value);
				}
			})
		})
		.collect();

	for handle in handles {
		let_assert!(Ok(()) = handle.join());
	}
	assert!(transport.writes().len() == 40);
}

#[test]
fn lock_survives_panicking_thread() {
	let (client, _transport) = setup(&[1]);
	let other = client.clone();
	let result = std::thread::spawn(move || {
		let _guard = other.lock();
		panic!("boom");
	})
	.join();
	assert!(result.is_err());

	let_assert!(Ok(_) = client.lock().ping(1));
}
