//! Lock acquisition for the tag cache map and per-query merge buffers.
//!
//! A panicking fan-out task can poison a lock it held. Posts are only ever
//! appended or inserted whole, so a poisoned lock is taken over with its
//! contents.

use std::sync::{
    LockResult, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), owner, op, "read")
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), owner, op, "write")
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    owner: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    recover(lock.lock(), owner, op, "mutex")
}

fn recover<G>(
    result: LockResult<G>,
    owner: &'static str,
    op: &'static str,
    mode: &'static str,
) -> G {
    result.unwrap_or_else(|poisoned: PoisonError<G>| {
        warn!(owner, op, mode, "posts lock poisoned by a panicked task, taking it over");
        poisoned.into_inner()
    })
}
