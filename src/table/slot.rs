/*!
 * Emulated File Objects
 * One occupancy of a table slot: the registered file plus its lock
 */

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use super::lock::SlotLock;
use super::token::StreamToken;

/// Shared reference to an emulated file object
pub type EmuFileRef<F> = Arc<EmuFileObject<F>>;

/// Registered file and the bookkeeping that belongs to its slot
///
/// Created on register, detached from the table on unregister. A detached
/// object stays valid for anyone still holding a reference, but its file
/// is gone once the table closed it or handed it back.
pub struct EmuFileObject<F> {
    file: Mutex<Option<F>>,
    lock: SlotLock,
    mode: AtomicI32,
    fd: AtomicI32,
    index: usize,
    token: StreamToken,
    table_id: u64,
}

impl<F> EmuFileObject<F> {
    pub(crate) fn new(file: F, token: StreamToken, table_id: u64) -> Self {
        Self {
            file: Mutex::new(Some(file)),
            lock: SlotLock::new(),
            mode: AtomicI32::new(0),
            fd: AtomicI32::new(0),
            index: token.index(),
            token,
            table_id,
        }
    }

    /// Slot index within the owning table
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn stream(&self) -> StreamToken {
        self.token
    }

    /// Per-slot lock, independent of the table's structural lock
    #[inline]
    pub fn lock(&self) -> &SlotLock {
        &self.lock
    }

    /// Caller-defined open mode; the table never sets it
    pub fn mode(&self) -> i32 {
        self.mode.load(Ordering::Relaxed)
    }

    pub fn set_mode(&self, mode: i32) {
        self.mode.store(mode, Ordering::Relaxed);
    }

    /// Caller-defined descriptor hint; the table never sets it
    pub fn fd_hint(&self) -> i32 {
        self.fd.load(Ordering::Relaxed)
    }

    pub fn set_fd_hint(&self, fd: i32) {
        self.fd.store(fd, Ordering::Relaxed);
    }

    /// Run `f` over the file, or return None once it has been closed
    /// or handed back
    ///
    /// Does not take the slot lock; see `SlotGuard` for that. `f` runs under
    /// the file's mutex, which is not reentrant even though the slot lock
    /// is: it must not call back into the table for this file.
    pub fn with_file<R>(&self, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        self.file.lock().as_mut().map(f)
    }

    pub fn is_open(&self) -> bool {
        self.file.lock().is_some()
    }

    pub(crate) fn table_id(&self) -> u64 {
        self.table_id
    }

    pub(crate) fn take_file(&self) -> Option<F> {
        self.file.lock().take()
    }
}

impl<F> fmt::Debug for EmuFileObject<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmuFileObject")
            .field("index", &self.index)
            .field("token", &self.token)
            .field("mode", &self.mode())
            .field("fd", &self.fd_hint())
            .field("open", &self.is_open())
            .finish()
    }
}
