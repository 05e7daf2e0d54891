use feetech_sts::registers::{self, Register};
use feetech_sts::{ClientConfig, Response};
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

mod logging;
mod options;

use options::{Command, Options, ServoId};

/// Goal positions for the drive command.
const DRIVE_UP: i32 = -2 * 4095;
const DRIVE_DOWN: i32 = 2 * 4095;

fn main() {
	if let Err(()) = do_main(clap::Parser::parse()) {
		std::process::exit(1);
	}
}

fn do_main(options: Options) -> Result<(), ()> {
	logging::init(module_path!(), options.verbose);
	match &options.command {
		Command::Ping { servo_id } => {
			let mut client = open_client(&options)?;
			match *servo_id {
				ServoId::Id(servo_id) => {
					log::debug!("Sending ping command to servo {}", servo_id);
					let start = Instant::now();
					let response = client.ping(servo_id).map_err(|e| log::error!("Command failed: {}", e))?;
					log_ping_response(&response, start.elapsed());
				},
				ServoId::Broadcast => scan(&mut client)?,
			}
		},
		Command::Scan => {
			let mut client = open_client(&options)?;
			scan(&mut client)?;
		},
		Command::Reset { servo_id } => {
			let mut client = open_client(&options)?;
			log::debug!("Sending reset command with servo ID {}", servo_id.raw());
			let start = Instant::now();
			let response = client.reset(servo_id.raw()).map_err(|e| log::error!("Command failed: {}", e))?;
			warn_faults(&response);
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::Read8 { servo_id, address } => {
			let mut client = open_client(&options)?;
			log::debug!("Reading an 8-bit value from servo {} at address {}", servo_id.raw(), address);
			let start = Instant::now();
			let response = client
				.read_u8(servo_id.assume_unicast()?, *address)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			warn_faults(&response);
			log::info!("{:?}: {:?} (0x{:02X})", start.elapsed(), response.data, response.data);
		},
		Command::Read16 { servo_id, address } => {
			let mut client = open_client(&options)?;
			log::debug!("Reading a 16-bit value from servo {} at address {}", servo_id.raw(), address);
			let start = Instant::now();
			let response = client
				.read_u16(servo_id.assume_unicast()?, *address)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			warn_faults(&response);
			log::info!("{:?}: {:?} (0x{:04X})", start.elapsed(), response.data, response.data);
		},
		Command::Write8 { servo_id, address, value } => {
			let mut client = open_client(&options)?;
			log::debug!(
				"Writing 8-bit value {} (0x{:02X}) to servo {} at address {}",
				value,
				value,
				servo_id.raw(),
				address
			);
			let start = Instant::now();
			let response = client
				.write_u8(servo_id.raw(), *address, *value)
				.map_err(|e| log::error!("Write failed: {}", e))?;
			warn_faults(&response);
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::Write16 { servo_id, address, value } => {
			let mut client = open_client(&options)?;
			log::debug!(
				"Writing 16-bit value {} (0x{:04X}) to servo {} at address {}",
				value,
				value,
				servo_id.raw(),
				address
			);
			let start = Instant::now();
			let response = client
				.write_u16(servo_id.raw(), *address, *value)
				.map_err(|e| log::error!("Write failed: {}", e))?;
			warn_faults(&response);
			log::info!("{:?}: Ok", start.elapsed());
		},
		Command::Get { servo_id, register } => {
			let mut client = open_client(&options)?;
			log::debug!("Reading {} from servo {}", register, servo_id.raw());
			let start = Instant::now();
			let response = client
				.get(servo_id.assume_unicast()?, *register)
				.map_err(|e| log::error!("Command failed: {}", e))?;
			warn_faults(&response);
			log::info!("{:?}: {}: {}", start.elapsed(), register.name, response.data);
		},
		Command::Set { servo_id, register, value } => {
			let mut client = open_client(&options)?;
			set_register(&mut client, servo_id.assume_unicast()?, *register, *value)?;
		},
		Command::Monitor { servo_id, count, interval } => {
			let mut client = open_client(&options)?;
			let servo_id = servo_id.assume_unicast()?;
			let interval = Duration::from_millis(*interval);
			let mut polls = 0;
			while count.map_or(true, |count| polls < count) {
				log_state(&mut client, servo_id)?;
				polls += 1;
				std::thread::sleep(interval);
			}
		},
		Command::SetId { servo_id, new_id } => {
			let mut client = open_client(&options)?;
			let servo_id = servo_id.assume_unicast()?;
			log::debug!("Changing ID of servo {} to {}", servo_id, new_id);
			let response = client
				.set_id(servo_id, *new_id)
				.map_err(|e| log::error!("Failed to change ID: {}", e))?;
			warn_faults(&response);
			if response.data {
				log::info!("Changed ID of servo {} to {}", servo_id, new_id);
			} else {
				log::info!("Servo already has ID {}", new_id);
			}
		},
		Command::Drive { servo_id, interval } => {
			let mut client = open_client(&options)?;
			drive(&mut client, servo_id.assume_unicast()?, Duration::from_millis(*interval))?;
		},
		Command::ShellCompletion { shell, output } => {
			write_shell_completion(*shell, output.as_deref())?;
		},
	}

	Ok(())
}

fn open_client(options: &Options) -> Result<feetech_sts::Client, ()> {
	let mut config = ClientConfig::default();
	if let Some(timeout) = options.timeout {
		config.latency = Duration::from_millis(timeout);
	}
	let client = feetech_sts::Client::open_with_config(&options.serial_port, options.baud_rate, config)
		.map_err(|e| log::error!("Failed to open serial port: {}: {}", options.serial_port.display(), e))?;
	log::debug!(
		"Using serial port {} with baud rate {}",
		options.serial_port.display(),
		options.baud_rate
	);
	Ok(client)
}

fn scan(client: &mut feetech_sts::Client) -> Result<(), ()> {
	log::debug!("Scanning the bus for servos");
	let start = Instant::now();
	let found = client
		.scan(0..=feetech_sts::packet_id::MAX)
		.map_err(|e| log::error!("Command failed: {}", e))?;
	for response in &found {
		log_ping_response(response, start.elapsed());
	}
	log::info!("Found {} servo(s) in {:?}", found.len(), start.elapsed());
	Ok(())
}

fn warn_faults<T>(response: &Response<T>) {
	if !response.error.is_empty() {
		log::warn!("Servo {} reports: {}", response.servo_id, response.error);
	}
}

fn log_ping_response(response: &Response<()>, elapsed: Duration) {
	log::info!("Servo ID: {}", response.servo_id);
	log::info!(" ├─ Response time: {:?}", elapsed);
	log::info!(" └─ Faults: {}", response.error);
}

fn set_register(client: &mut feetech_sts::Client, servo_id: u8, register: Register, value: i32) -> Result<(), ()> {
	let start = Instant::now();
	if register.eeprom {
		log::debug!("Writing EEPROM register {} of servo {}: {}", register, servo_id, value);
		let response = client
			.set_eeprom(servo_id, register, value)
			.map_err(|e| log::error!("Write failed: {}", e))?;
		warn_faults(&response);
		if response.data {
			log::info!("{:?}: Ok", start.elapsed());
		} else {
			log::info!("{:?}: {} is already {}", start.elapsed(), register.name, value);
		}
	} else {
		log::debug!("Writing register {} of servo {}: {}", register, servo_id, value);
		let response = client
			.set(servo_id, register, value)
			.map_err(|e| log::error!("Write failed: {}", e))?;
		warn_faults(&response);
		log::info!("{:?}: Ok", start.elapsed());
	}
	Ok(())
}

fn log_state(client: &mut feetech_sts::Client, servo_id: u8) -> Result<(), ()> {
	let read = |client: &mut feetech_sts::Client, register: Register| {
		client
			.get(servo_id, register)
			.map(|response| response.data)
			.map_err(|e| log::error!("Failed to read {}: {}", register.name, e))
	};
	let position = read(client, registers::PRESENT_POSITION)?;
	let speed = read(client, registers::PRESENT_SPEED)?;
	let load = read(client, registers::PRESENT_LOAD)?;
	let current = read(client, registers::PRESENT_CURRENT)?;
	let voltage = read(client, registers::PRESENT_VOLTAGE)?;
	let temperature = read(client, registers::PRESENT_TEMPERATURE)?;
	let status = client
		.status(servo_id)
		.map_err(|e| log::error!("Failed to read status: {}", e))?;
	log::info!(
		"position: {:5}, speed: {:5}, load: {:5}, current: {:4}, voltage: {}.{} V, temperature: {} °C, status: {}",
		position,
		speed,
		load,
		current,
		voltage / 10,
		voltage % 10,
		temperature,
		status.data,
	);
	Ok(())
}

fn drive(client: &mut feetech_sts::Client, servo_id: u8, interval: Duration) -> Result<(), ()> {
	let (sender, receiver) = mpsc::sync_channel(4);
	std::thread::spawn(move || read_drive_commands(sender));

	log::info!("Type u, d or z followed by enter to move the servo, or q to quit");
	loop {
		match receiver.try_recv() {
			Ok(position) => {
				log::debug!("Moving servo {} to {}", servo_id, position);
				let response = client
					.set_goal_position(servo_id, position)
					.map_err(|e| log::error!("Failed to set goal position: {}", e))?;
				warn_faults(&response);
			},
			Err(mpsc::TryRecvError::Empty) => (),
			Err(mpsc::TryRecvError::Disconnected) => break,
		}

		match client.present_position(servo_id) {
			Ok(response) => {
				warn_faults(&response);
				log::info!("position: {}", response.data);
			},
			Err(e) => log::warn!("Failed to read position: {}", e),
		}
		std::thread::sleep(interval);
	}
	Ok(())
}

fn read_drive_commands(sender: mpsc::SyncSender<i32>) {
	for line in std::io::stdin().lock().lines() {
		let line = match line {
			Ok(line) => line,
			Err(e) => {
				log::error!("Failed to read from stdin: {}", e);
				return;
			},
		};
		let position = match line.trim() {
			"u" => DRIVE_UP,
			"d" => DRIVE_DOWN,
			"z" => 0,
			"q" => return,
			"" => continue,
			other => {
				log::warn!("Unknown command: {:?}, expected u, d, z or q", other);
				continue;
			},
		};
		if sender.send(position).is_err() {
			return;
		}
	}
}

fn write_shell_completion(shell: clap_complete::Shell, path: Option<&Path>) -> Result<(), ()> {
	use clap::CommandFactory;
	use std::io::Write;

	let mut buffer = Vec::with_capacity(4 * 1024);

	let mut command = Options::command();
	clap_complete::generate(shell, &mut command, env!("CARGO_BIN_NAME"), &mut buffer);
	if !buffer.ends_with(b"\n") {
		buffer.push(b'\n');
	}

	let path = path.unwrap_or_else(|| Path::new("-"));
	if path == Path::new("-") {
		log::debug!("Writing shell completion for {} to stdout", shell);
		let stdout = std::io::stdout();
		stdout
			.lock()
			.write_all(&buffer)
			.map_err(|e| log::error!("Failed to write to stdout: {}", e))?;
	} else {
		log::debug!("Writing shell completion for {} to {}", shell, path.display());
		let mut output = std::fs::File::create(path).map_err(|e| log::error!("Failed to create {}: {}", path.display(), e))?;
		output
			.write_all(&buffer)
			.map_err(|e| log::error!("Failed to write to {}: {}", path.display(), e))?;
	}

	Ok(())
}
