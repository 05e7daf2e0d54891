//! Communication with Feetech STS/SCS smart servos over the half-duplex serial bus.
//!
//! The main interface is the [`Client`] struct, which is used to send instructions to servos and read their replies.
//! Register level access for the STS control table is provided by the methods in [`registers`].
//!
//! Servos can be addressed one at a time, or many at once with [`GroupSyncWrite`] and [`GroupSyncRead`].
//! Each operation sends one instruction and waits for the reply, if any.
//! Nothing is retried automatically: a write that timed out may still have been executed by the servo.
//!
//! Every failure is returned as a [`TransferError`], which can be classified as a [`CommResult`].
//! Faults reported by a servo are not errors: they are returned as [`ErrorFlags`] next to the data.
//!
//! # Optional features
//!
//! You can enable the `log` feature to have the library use `log::trace!()` to log all sent instructions and received replies.
//!
//! The `serial2` feature, enabled by default, implements [`Transport`] for [`serial2::SerialPort`].

#[macro_use]
mod log;

mod bus;
mod client;
mod error;
mod shared;

pub mod codec;
pub mod instructions;
pub mod packet;
pub mod registers;
pub mod transport;

pub use client::{Client, ClientConfig};
pub use error::*;
pub use instructions::{GroupSyncRead, GroupSyncWrite, SyncReadEntry};
pub use packet::{packet_id, ErrorFlags, Response, StatusPacket};
pub use shared::SharedClient;
pub use transport::Transport;

