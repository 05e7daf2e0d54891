//! The instructions of the Feetech serial bus protocol, implemented as methods on [`crate::Client`].

mod action;
mod ping;
mod read;
mod reg_write;
mod reset;
mod sync_read;
mod sync_write;
mod write;

pub use sync_read::{GroupSyncRead, SyncReadEntry};
pub use sync_write::GroupSyncWrite;

use crate::packet::Response;

/// Check that a response has no parameters.
pub(crate) fn expect_empty(response: Response<Vec<u8>>) -> Result<Response<()>, crate::InvalidParameterCount> {
	crate::InvalidParameterCount::check(response.data.len(), 0)?;
	Ok(response.map(|_| ()))
}
