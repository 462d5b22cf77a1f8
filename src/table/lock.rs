/*!
 * Per-Slot Locks
 *
 * Recursive, thread-owned lock guarding one emulated file's I/O.
 * Lock and unlock arrive as separate descriptor-addressed calls, so the
 * owning thread and depth are tracked in the lock itself.
 */

use parking_lot::{Condvar, Mutex};
use std::marker::PhantomData;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tracing::trace;

use super::slot::EmuFileRef;

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<ThreadId>,
    depth: usize,
}

impl Ownership {
    #[inline]
    fn acquire(&mut self, me: ThreadId) -> bool {
        match self.owner {
            None => {
                self.owner = Some(me);
                self.depth = 1;
                true
            }
            Some(owner) if owner == me => {
                self.depth += 1;
                true
            }
            Some(_) => false,
        }
    }
}

/// Recursive lock owned by one slot occupancy
///
/// The owning thread may re-acquire it; it is released once every
/// acquisition has been matched by an unlock.
#[derive(Debug, Default)]
pub struct SlotLock {
    state: Mutex<Ownership>,
    released: Condvar,
}

impl SlotLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is held by the calling thread
    pub fn lock(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        while !state.acquire(me) {
            trace!("Slot lock contended, waiting");
            self.released.wait(&mut state);
        }
    }

    /// Acquire without blocking; false if another thread holds it
    pub fn try_lock(&self) -> bool {
        let me = thread::current().id();
        self.state.lock().acquire(me)
    }

    /// Acquire, giving up after `timeout`
    pub fn try_lock_for(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.lock();
            return true;
        };

        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            if state.acquire(me) {
                return true;
            }
            if self.released.wait_until(&mut state, deadline).timed_out() {
                let acquired = state.acquire(me);
                if !acquired {
                    trace!(?timeout, "Slot lock timed out");
                }
                return acquired;
            }
        }
    }

    /// Release one level of ownership
    ///
    /// Returns false, changing nothing, if the calling thread does not
    /// hold the lock.
    pub fn unlock(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.owner != Some(me) {
            return false;
        }

        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            drop(state);
            self.released.notify_one();
        }
        true
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }
}

/// Scoped slot lock acquisition
///
/// Keeps the file object alive and releases its lock on drop. Not `Send`:
/// the lock belongs to the thread that acquired it.
pub struct SlotGuard<F> {
    object: EmuFileRef<F>,
    _thread_bound: PhantomData<*const ()>,
}

impl<F> SlotGuard<F> {
    /// Lock `object`, waiting at most `timeout` when one is given
    pub fn acquire(object: EmuFileRef<F>, timeout: Option<Duration>) -> Option<Self> {
        let acquired = match timeout {
            Some(timeout) => object.lock().try_lock_for(timeout),
            None => {
                object.lock().lock();
                true
            }
        };

        acquired.then(|| Self {
            object,
            _thread_bound: PhantomData,
        })
    }

    /// Lock `object` only if it is free right now
    pub fn try_acquire(object: EmuFileRef<F>) -> Option<Self> {
        object.lock().try_lock().then(|| Self {
            object,
            _thread_bound: PhantomData,
        })
    }

    /// Run `f` over the file while the slot lock is held
    ///
    /// `f` runs under the file's own mutex, which is not reentrant: it must
    /// not call back into the table for the same file (`with_file_*`, io,
    /// or `unregister`), or it deadlocks.
    pub fn with_file<R>(&self, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        self.object.with_file(f)
    }
}

impl<F> Drop for SlotGuard<F> {
    fn drop(&mut self) {
        self.object.lock().unlock();
    }
}
