//! Internal helpers

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a shared handle, recovering the data if a previous holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
