//! Sharing one bus between threads.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use crate::{Client, PortBusy, Transport};

/// A [`Client`] that can be cloned and used from multiple threads.
///
/// The bus is half-duplex, so only one transaction may be in flight at a time.
/// Every caller must hold the lock for the whole transaction,
/// which is enforced by only exposing the client through a lock guard.
pub struct SharedClient<T: Transport> {
	inner: Arc<Mutex<Client<T>>>,
}

impl<T: Transport> SharedClient<T> {
	pub fn new(client: Client<T>) -> Self {
		Self {
			inner: Arc::new(Mutex::new(client)),
		}
	}

	/// Wait for exclusive access to the bus.
	///
	/// The guard can be used for any number of transactions.
	/// If a thread panicked while holding the lock, the lock is recovered:
	/// the next transmission discards any half-read data anyway.
	pub fn lock(&self) -> MutexGuard<'_, Client<T>> {
		self.inner.lock().unwrap_or_else(|poisoned| {
			warn!("recovering bus lock poisoned by a panicking thread");
			poisoned.into_inner()
		})
	}

	/// Get exclusive access to the bus if no other thread is using it.
	///
	/// Returns [`PortBusy`] if another thread holds the lock.
	pub fn try_lock(&self) -> Result<MutexGuard<'_, Client<T>>, PortBusy> {
		match self.inner.try_lock() {
			Ok(guard) => Ok(guard),
			Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
			Err(TryLockError::WouldBlock) => Err(PortBusy),
		}
	}

	/// Run a closure with exclusive access to the bus.
	pub fn with<R>(&self, f: impl FnOnce(&mut Client<T>) -> R) -> R {
		f(&mut self.lock())
	}
}

impl<T: Transport> Clone for SharedClient<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Transport> From<Client<T>> for SharedClient<T> {
	fn from(client: Client<T>) -> Self {
		Self::new(client)
	}
}

impl<T: Transport> std::fmt::Debug for SharedClient<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SharedClient").finish_non_exhaustive()
	}
}
