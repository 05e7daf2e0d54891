//! Logging macros that forward to the `log` crate when the `"log"` feature is enabled.
//!
//! Without the feature, the macros expand to nothing, but the arguments are still type checked.

#[cfg(feature = "log")]
#[allow(unused)]
#[macro_use]
mod log {
	macro_rules! trace {
		($($args:tt)*) => { ::log::trace!(target: "feetech_sts", $($args)*) }
	}

	macro_rules! debug {
		($($args:tt)*) => { ::log::debug!(target: "feetech_sts", $($args)*) }
	}

	macro_rules! warn {
		($($args:tt)*) => { ::log::warn!(target: "feetech_sts", $($args)*) }
	}
}

#[cfg(not(feature = "log"))]
#[allow(unused)]
#[macro_use]
mod log {
	macro_rules! trace {
		($($args:tt)*) => {
			if false {
				let _ = format_args!($($args)*);
			}
		};
	}

	macro_rules! debug {
		($($args:tt)*) => {
			if false {
				let _ = format_args!($($args)*);
			}
		};
	}

	macro_rules! warn {
		($($args:tt)*) => {
			if false {
				let _ = format_args!($($args)*);
			}
		};
	}
}
