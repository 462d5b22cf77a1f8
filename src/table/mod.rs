/*!
 * Emulated File Table
 *
 * Fixed-capacity registry mapping host file objects to synthetic
 * descriptors and stream tokens:
 * - descriptor = base + slot index, disjoint from OS descriptors
 * - stream token = slot index + occupancy generation, unique per process
 * - one recursive lock per occupied slot for the file's own I/O
 *
 * # Locking
 *
 * A table-wide mutex serialises claiming and vacating slots. Lookups
 * never take it: each slot is an `ArcSwapOption`, so readers get a strong
 * reference that stays valid across a concurrent unregister. Forced
 * closes run after the table mutex has been released.
 */

mod io;
mod bitmap;
mod lock;
mod slot;
mod token;

pub use lock::{SlotGuard, SlotLock};
pub use slot::{EmuFileObject, EmuFileRef};
pub use token::StreamToken;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::TableConfig;
use crate::core::errors::{EmuError, EmuResult, RegisterError};
use crate::core::limits::{DESCRIPTOR_BASE, FIRST_GENERATION, MAX_EMULATED_FILES};
use crate::monitoring::{CleanupReport, TableCounters, TableStats};
use crate::vfs::EmulatedFile;
use bitmap::SlotBitmap;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Occupancy generations are drawn process-wide, so a token is unique
/// across every table until the counter wraps
static NEXT_GENERATION: AtomicU32 = AtomicU32::new(FIRST_GENERATION);

/// Take the next generation from `counter`, never zero
fn next_generation(counter: &AtomicU32) -> u32 {
    loop {
        let generation = counter.fetch_add(1, Ordering::Relaxed);
        if generation != 0 {
            return generation;
        }
    }
}

/// Structural state guarded by the table-wide lock
struct Registry {
    occupied: SlotBitmap,
}

impl Registry {
    fn new(capacity: usize) -> Self {
        Self {
            occupied: SlotBitmap::new(capacity),
        }
    }
}

/// Fixed-capacity emulated file table with `N` slots
pub struct EmuFileTable<F: EmulatedFile, const N: usize = MAX_EMULATED_FILES> {
    id: u64,
    slots: Box<[ArcSwapOption<EmuFileObject<F>>]>,
    registry: Mutex<Registry>,
    config: TableConfig,
    counters: TableCounters,
}

impl<F: EmulatedFile, const N: usize> EmuFileTable<F, N> {
    const CAPACITY_FITS: () = assert!(
        N > 0 && N <= (i32::MAX - DESCRIPTOR_BASE) as usize,
        "emulated file table capacity must be non-zero and fit above the default descriptor base"
    );

    /// Empty table with the default configuration
    pub fn new() -> Self {
        Self::build(TableConfig::default())
    }

    /// Empty table with a validated configuration
    pub fn with_config(config: TableConfig) -> EmuResult<Self> {
        config.validate(N)?;
        Ok(Self::build(config))
    }

    fn build(config: TableConfig) -> Self {
        let () = Self::CAPACITY_FITS;

        let slots = (0..N).map(|_| ArcSwapOption::empty()).collect();
        Self {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            slots,
            registry: Mutex::new(Registry::new(N)),
            config,
            counters: TableCounters::default(),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// First descriptor of the emulated range
    #[inline]
    pub fn base(&self) -> i32 {
        self.config.descriptor_base
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.registry.lock().occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> TableStats {
        let registry = self.registry.lock();
        self.counters
            .snapshot(N, registry.occupied.len(), registry.occupied.first_free())
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Claim the lowest free slot for `file`
    ///
    /// A full table hands the file back inside the error.
    pub fn register(&self, file: F) -> Result<EmuFileRef<F>, RegisterError<F>> {
        let mut registry = self.registry.lock();

        let Some(index) = registry.occupied.first_free() else {
            drop(registry);
            self.counters.record_reject();
            warn!(capacity = N, name = ?file.name(), "Emulated file table full");
            return Err(RegisterError::new(file, N));
        };

        let generation = next_generation(&NEXT_GENERATION);
        let object = Arc::new(EmuFileObject::new(
            file,
            StreamToken::new(index as u32, generation),
            self.id,
        ));
        self.slots[index].store(Some(Arc::clone(&object)));
        registry.occupied.set(index);
        drop(registry);

        self.counters.record_register();
        if self.config.log_registrations {
            debug!(
                descriptor = self.descriptor_at(index),
                index,
                generation,
                name = ?object.with_file(|f| f.name().map(str::to_owned)).flatten(),
                "Registered emulated file"
            );
        }
        Ok(object)
    }

    /// Vacate `object`'s slot
    ///
    /// With `release` the file is closed and dropped and None is returned;
    /// otherwise the file is handed back to the caller. A no-op returning
    /// None when `object` is no longer the slot's occupant.
    pub fn unregister(&self, object: &EmuFileObject<F>, release: bool) -> Option<F> {
        if object.table_id() != self.id {
            return None;
        }
        let detached = self.detach(object.index(), |current| std::ptr::eq(current, object))?;

        if release {
            let descriptor = self.descriptor_at(detached.index());
            if let Err(e) = self.close_detached(&detached, descriptor) {
                warn!(descriptor, error = %e, "Failed to close emulated file");
            }
            None
        } else {
            detached.take_file()
        }
    }

    /// Vacate the slot behind `fd`, handing the file back without closing it
    pub fn unregister_by_descriptor(&self, fd: i32) -> Option<F> {
        let index = self.index_of_descriptor(fd)?;
        self.detach(index, |_| true)?.take_file()
    }

    /// Vacate the slot behind `token`, handing the file back without closing it
    pub fn unregister_by_stream(&self, token: StreamToken) -> Option<F> {
        if token.index() >= N {
            return None;
        }
        self.detach(token.index(), |current| current.stream() == token)?
            .take_file()
    }

    /// Detach every occupant and close its file
    ///
    /// Intended for final teardown; callers must make sure no other thread
    /// is still using registered files. Safe to call repeatedly.
    pub fn clean_up(&self) -> CleanupReport {
        let detached: Vec<EmuFileRef<F>> = {
            let mut registry = self.registry.lock();
            let occupied: Vec<usize> = registry.occupied.iter().collect();
            occupied
                .into_iter()
                .filter_map(|index| {
                    registry.occupied.clear(index);
                    self.slots[index].swap(None)
                })
                .collect()
        };

        let mut report = CleanupReport::default();
        for object in detached {
            self.counters.record_unregister();
            let descriptor = self.descriptor_at(object.index());
            match self.close_detached(&object, descriptor) {
                Ok(true) => report.closed += 1,
                Ok(false) => report.already_closed += 1,
                Err(e) => {
                    warn!(descriptor, error = %e, "Failed to close emulated file during cleanup");
                    report.failures.push(e);
                }
            }
        }

        if report.detached() > 0 {
            info!(
                closed = report.closed,
                already_closed = report.already_closed,
                failures = report.failures.len(),
                "Emulated file table cleaned up"
            );
        }
        report
    }

    /// Remove the occupant of `index` if `matches` accepts it
    fn detach(
        &self,
        index: usize,
        matches: impl FnOnce(&EmuFileObject<F>) -> bool,
    ) -> Option<EmuFileRef<F>> {
        let mut registry = self.registry.lock();
        let current = self.slots[index].load_full()?;
        if !matches(&*current) {
            return None;
        }
        self.slots[index].store(None);
        registry.occupied.clear(index);
        drop(registry);

        self.counters.record_unregister();
        if self.config.log_registrations {
            debug!(
                descriptor = self.descriptor_at(index),
                index,
                generation = current.stream().generation(),
                "Unregistered emulated file"
            );
        }
        Some(current)
    }

    /// Close the file of an already-detached object
    ///
    /// Ok(false) when the file had already been taken.
    fn close_detached(&self, object: &EmuFileObject<F>, descriptor: i32) -> EmuResult<bool> {
        let Some(mut file) = object.take_file() else {
            return Ok(false);
        };
        let result = file.close();
        self.counters.record_close(result.is_ok());
        result
            .map(|()| true)
            .map_err(|e| EmuError::close_failed(descriptor, &e))
    }

    // =========================================================================
    // Per-slot locking
    // =========================================================================

    /// Acquire the slot lock behind `fd`
    ///
    /// Waits at most the configured lock timeout. False if `fd` does not
    /// resolve or the timeout expired.
    pub fn lock_by_descriptor(&self, fd: i32) -> bool {
        match self.config.lock_timeout {
            Some(timeout) => self.lock_by_descriptor_for(fd, timeout),
            None => self
                .object_by_descriptor(fd)
                .map(|object| object.lock().lock())
                .is_some(),
        }
    }

    pub fn lock_by_descriptor_for(&self, fd: i32, timeout: Duration) -> bool {
        self.object_by_descriptor(fd)
            .is_some_and(|object| object.lock().try_lock_for(timeout))
    }

    /// Non-blocking acquire; false if unresolved or held by another thread
    pub fn try_lock_by_descriptor(&self, fd: i32) -> bool {
        self.object_by_descriptor(fd)
            .is_some_and(|object| object.lock().try_lock())
    }

    /// Release one level of the slot lock behind `fd`
    pub fn unlock_by_descriptor(&self, fd: i32) -> bool {
        self.object_by_descriptor(fd)
            .is_some_and(|object| object.lock().unlock())
    }

    /// Scoped acquisition of the slot lock behind `fd`
    pub fn lock_guard_by_descriptor(&self, fd: i32) -> Option<SlotGuard<F>> {
        SlotGuard::acquire(self.object_by_descriptor(fd)?, self.config.lock_timeout)
    }

    /// Scoped acquisition that never waits; None if unresolved or held elsewhere
    pub fn try_lock_guard_by_descriptor(&self, fd: i32) -> Option<SlotGuard<F>> {
        SlotGuard::try_acquire(self.object_by_descriptor(fd)?)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// True if `fd` falls in the emulated range, occupied or not
    #[inline]
    pub fn contains_descriptor_range(&self, fd: i32) -> bool {
        self.index_of_descriptor(fd).is_some()
    }

    #[inline]
    fn index_of_descriptor(&self, fd: i32) -> Option<usize> {
        let offset = fd.checked_sub(self.base())?;
        usize::try_from(offset).ok().filter(|&index| index < N)
    }

    #[inline]
    fn descriptor_at(&self, index: usize) -> i32 {
        self.base() + index as i32
    }

    /// Occupant of the slot behind `fd`
    pub fn object_by_descriptor(&self, fd: i32) -> Option<EmuFileRef<F>> {
        self.slots[self.index_of_descriptor(fd)?].load_full()
    }

    /// Descriptor for `object`'s slot; None for objects from another table
    pub fn descriptor_of(&self, object: &EmuFileObject<F>) -> Option<i32> {
        (object.table_id() == self.id && object.index() < N)
            .then(|| self.descriptor_at(object.index()))
    }

    /// Occupant issued `token`; None once the slot has been vacated or reused
    pub fn object_by_stream(&self, token: StreamToken) -> Option<EmuFileRef<F>> {
        if token.index() >= N {
            return None;
        }
        self.slots[token.index()]
            .load_full()
            .filter(|object| object.stream() == token)
    }

    #[inline]
    pub fn stream_of(&self, object: &EmuFileObject<F>) -> StreamToken {
        object.stream()
    }

    pub fn descriptor_by_stream(&self, token: StreamToken) -> Option<i32> {
        self.object_by_stream(token)
            .and_then(|object| self.descriptor_of(&object))
    }

    pub fn stream_by_descriptor(&self, fd: i32) -> Option<StreamToken> {
        self.object_by_descriptor(fd).map(|object| object.stream())
    }

    /// Run `f` over the file behind `fd`, without the slot lock
    ///
    /// `f` must not re-enter the table for the same descriptor.
    pub fn with_file_by_descriptor<R>(&self, fd: i32, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        self.object_by_descriptor(fd)?.with_file(f)
    }

    /// Run `f` over the file behind `token`, without the slot lock
    pub fn with_file_by_stream<R>(&self, token: StreamToken, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        self.object_by_stream(token)?.with_file(f)
    }

    pub fn is_emulated_descriptor(&self, fd: i32) -> bool {
        self.object_by_descriptor(fd).is_some()
    }

    pub fn is_emulated_stream(&self, token: StreamToken) -> bool {
        self.object_by_stream(token).is_some()
    }
}

impl<F: EmulatedFile> Default for EmuFileTable<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: EmulatedFile, const N: usize> Drop for EmuFileTable<F, N> {
    fn drop(&mut self) {
        self.clean_up();
    }
}

impl<F: EmulatedFile, const N: usize> std::fmt::Debug for EmuFileTable<F, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmuFileTable")
            .field("capacity", &N)
            .field("base", &format_args!("{:#x}", self.base()))
            .field("occupied", &self.len())
            .finish()
    }
}
