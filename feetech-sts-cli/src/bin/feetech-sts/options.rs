use feetech_sts::registers::Register;
use std::path::PathBuf;

/// Communicate with Feetech STS/SCS serial bus servos.
///
/// Most commands that take a servo ID can also take the special value "broadcast".
/// The exceptions are the commands that read from a servo, which can not be broadcasted.
#[derive(clap::Parser)]
#[command(author, version)]
pub struct Options {
	/// Print more verbose output. Can be repeated.
	#[arg(long, short, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// The serial port to use.
	#[arg(long, short, global = true)]
	#[cfg_attr(target_os = "windows", arg(default_value = "COM1"))]
	#[cfg_attr(not(target_os = "windows"), arg(default_value = "/dev/ttyUSB0"))]
	pub serial_port: PathBuf,

	/// The baud rate of the bus.
	#[arg(long, short, global = true, default_value = "1000000")]
	pub baud_rate: u32,

	/// Extra time to wait for each reply, in milliseconds.
	#[arg(long, global = true, value_name = "MILLISECONDS")]
	pub timeout: Option<u64>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
	/// Ping a servo or scan the entire bus.
	Ping {
		/// The servo to ping.
		///
		/// You may specify the broadcast address to scan the bus for connected servos.
		#[arg(value_name = "SERVO_ID|broadcast")]
		servo_id: ServoId,
	},

	/// Scan the bus for connected servos.
	Scan,

	/// Reset the control table of a servo to the factory defaults.
	Reset {
		/// The servo to reset.
		#[arg(value_name = "SERVO_ID|broadcast")]
		servo_id: ServoId,
	},

	/// Read an 8-bit value from a servo.
	Read8 {
		/// The servo to read from (no broadcast ID allowed).
		#[arg(value_name = "SERVO_ID")]
		servo_id: ServoId,

		/// The address to read from.
		#[arg(value_name = "ADDRESS")]
		address: u8,
	},

	/// Read a 16-bit value from a servo.
	Read16 {
		/// The servo to read from (no broadcast ID allowed).
		#[arg(value_name = "SERVO_ID")]
		servo_id: ServoId,

		/// The address to read from.
		#[arg(value_name = "ADDRESS")]
		address: u8,
	},

	/// Write an 8-bit value to a servo.
	Write8 {
		/// The servo to write to.
		#[arg(value_name = "SERVO_ID|broadcast")]
		servo_id: ServoId,

		/// The address to write to.
		#[arg(value_name = "ADDRESS")]
		address: u8,

		/// The value to write.
		#[arg(value_name = "VALUE")]
		value: u8,
	},

	/// Write a 16-bit value to a servo.
	Write16 {
		/// The servo to write to.
		#[arg(value_name = "SERVO_ID|broadcast")]
		servo_id: ServoId,

		/// The address to write to.
		#[arg(value_name = "ADDRESS")]
		address: u8,

		/// The value to write.
		#[arg(value_name = "VALUE")]
		value: u16,
	},

	/// Read a named register and decode the value.
	Get {
		/// The servo to read from (no broadcast ID allowed).
		#[arg(value_name = "SERVO_ID")]
		servo_id: ServoId,

		/// The name of the register, for example "present_position".
		#[arg(value_name = "REGISTER", value_parser = parse_register)]
		register: Register,
	},

	/// Encode a value and write it to a named register.
	///
	/// EEPROM registers are unlocked before and locked after the write.
	Set {
		/// The servo to write to.
		#[arg(value_name = "SERVO_ID")]
		servo_id: ServoId,

		/// The name of the register, for example "goal_position".
		#[arg(value_name = "REGISTER", value_parser = parse_register)]
		register: Register,

		/// The value to write.
		#[arg(value_name = "VALUE", allow_negative_numbers = true)]
		value: i32,
	},

	/// Continuously print the state of a servo.
	Monitor {
		/// The servo to monitor (no broadcast ID allowed).
		#[arg(value_name = "SERVO_ID")]
		servo_id: ServoId,

		/// Stop after this many polls.
		#[arg(long, short)]
		count: Option<usize>,

		/// The time between polls in milliseconds.
		#[arg(long, short, default_value = "100")]
		interval: u64,
	},

	/// Change the ID of a servo.
	SetId {
		/// The current ID of the servo (no broadcast ID allowed).
		#[arg(value_name = "SERVO_ID")]
		servo_id: ServoId,

		/// The new ID of the servo.
		#[arg(value_name = "NEW_ID", value_parser = clap::value_parser!(u8).range(0..=253))]
		new_id: u8,
	},

	/// Drive a servo interactively.
	///
	/// Type "u" to move up, "d" to move down, "z" to move to zero and "q" to quit, each followed by enter.
	Drive {
		/// The servo to drive (no broadcast ID allowed).
		#[arg(value_name = "SERVO_ID")]
		servo_id: ServoId,

		/// The time between polls in milliseconds.
		#[arg(long, short, default_value = "100")]
		interval: u64,
	},

	/// Write shell completions to a file or stdout.
	ShellCompletion {
		/// The shell for which to generate completions.
		#[arg(long)]
		shell: clap_complete::Shell,

		/// The file to write the generated completion file to.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
}

#[derive(Copy, Clone)]
pub enum ServoId {
	Id(u8),
	Broadcast,
}

impl ServoId {
	pub fn raw(self) -> u8 {
		match self {
			Self::Id(raw) => raw,
			Self::Broadcast => feetech_sts::packet_id::BROADCAST,
		}
	}

	pub fn assume_unicast(self) -> Result<u8, ()> {
		match self {
			Self::Id(raw) => Ok(raw),
			Self::Broadcast => {
				log::error!("Invalid servo ID: this command can not be broadcasted.");
				Err(())
			},
		}
	}
}

impl std::str::FromStr for ServoId {
	type Err = &'static str;

	fn from_str(data: &str) -> Result<Self, Self::Err> {
		if data.eq_ignore_ascii_case("broadcast") {
			return Ok(Self::Broadcast);
		}
		match data.parse() {
			Ok(feetech_sts::packet_id::BROADCAST) => Ok(Self::Broadcast),
			Ok(id) if id <= feetech_sts::packet_id::MAX => Ok(Self::Id(id)),
			_ => Err("invalid servo ID: expected a number in the range 0..=253 or the special value \"broadcast\""),
		}
	}
}

fn parse_register(name: &str) -> Result<Register, String> {
	Register::from_name(name).ok_or_else(|| {
		let names: Vec<_> = feetech_sts::registers::ALL.iter().map(|register| register.name).collect();
		format!("unknown register, expected one of: {}", names.join(", "))
	})
}
