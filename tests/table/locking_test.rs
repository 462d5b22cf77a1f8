/*!
 * Per-slot lock behaviour across threads
 */

use crate::support::{counter, TrackedFile};
use emufile::{EmuFileTable, TableConfig};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_lock_independence() {
    let closes = counter();
    let table: Arc<EmuFileTable<TrackedFile, 4>> = Arc::new(EmuFileTable::new());
    let fd_a = table
        .descriptor_of(&table.register(TrackedFile::new(1, &closes)).unwrap())
        .unwrap();
    let fd_b = table
        .descriptor_of(&table.register(TrackedFile::new(2, &closes)).unwrap())
        .unwrap();

    let locked = Arc::new(Barrier::new(2));
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let holder = {
        let table = Arc::clone(&table);
        let locked = Arc::clone(&locked);
        thread::spawn(move || {
            assert!(table.lock_by_descriptor(fd_a));
            locked.wait();
            release_rx.recv().unwrap();
            assert!(table.unlock_by_descriptor(fd_a));
        })
    };

    locked.wait();

    // A is contended, B and registration are not
    assert!(!table.try_lock_by_descriptor(fd_a));
    assert!(!table.unlock_by_descriptor(fd_a), "non-owner unlock must be rejected");
    assert!(table.try_lock_by_descriptor(fd_b));
    let c = table.register(TrackedFile::new(3, &closes)).unwrap();
    let fd_c = table.descriptor_of(&c).unwrap();
    assert!(table.try_lock_by_descriptor(fd_c));

    release_tx.send(()).unwrap();
    holder.join().unwrap();

    assert!(table.try_lock_by_descriptor(fd_a));
    assert!(table.unlock_by_descriptor(fd_a));
    assert!(table.unlock_by_descriptor(fd_b));
    assert!(table.unlock_by_descriptor(fd_c));
}

#[test]
fn test_lock_is_recursive_for_owner() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile, 2> = EmuFileTable::new();
    let object = table.register(TrackedFile::new(1, &closes)).unwrap();
    let fd = table.descriptor_of(&object).unwrap();

    assert!(table.lock_by_descriptor(fd));
    assert!(table.try_lock_by_descriptor(fd));
    assert!(table.unlock_by_descriptor(fd));
    assert!(object.lock().is_locked());
    assert!(table.unlock_by_descriptor(fd));
    assert!(!object.lock().is_locked());
    assert!(!table.unlock_by_descriptor(fd));
}

#[test]
fn test_configured_timeout_bounds_blocking_lock() {
    let closes = counter();
    let config = TableConfig::default().with_lock_timeout(Duration::from_millis(25));
    let table: Arc<EmuFileTable<TrackedFile, 2>> = Arc::new(EmuFileTable::with_config(config).unwrap());
    let object = table.register(TrackedFile::new(1, &closes)).unwrap();
    let fd = table.descriptor_of(&object).unwrap();

    assert!(table.lock_by_descriptor(fd));

    let contender = Arc::clone(&table);
    let (acquired, guard_acquired) = thread::spawn(move || {
        (
            contender.lock_by_descriptor(fd),
            contender.lock_guard_by_descriptor(fd).is_some(),
        )
    })
    .join()
    .unwrap();
    assert!(!acquired);
    assert!(!guard_acquired);

    assert!(table.unlock_by_descriptor(fd));
}

#[test]
fn test_guard_releases_on_drop() {
    let closes = counter();
    let table: Arc<EmuFileTable<TrackedFile, 2>> = Arc::new(EmuFileTable::new());
    let object = table.register(TrackedFile::new(1, &closes)).unwrap();
    let fd = table.descriptor_of(&object).unwrap();

    {
        let guard = table.lock_guard_by_descriptor(fd).unwrap();
        assert_eq!(guard.with_file(|f| f.id), Some(1));

        let contender = Arc::clone(&table);
        let acquired = thread::spawn(move || contender.try_lock_by_descriptor(fd))
            .join()
            .unwrap();
        assert!(!acquired);
    }

    let contender = Arc::clone(&table);
    let acquired = thread::spawn(move || {
        let ok = contender.lock_by_descriptor_for(fd, Duration::from_secs(1));
        contender.unlock_by_descriptor(fd);
        ok
    })
    .join()
    .unwrap();
    assert!(acquired);
}

#[test]
fn test_try_guard_fails_while_held_elsewhere() {
    let closes = counter();
    let table: Arc<EmuFileTable<TrackedFile, 2>> = Arc::new(EmuFileTable::new());
    let object = table.register(TrackedFile::new(1, &closes)).unwrap();
    let fd = table.descriptor_of(&object).unwrap();

    assert!(table.try_lock_guard_by_descriptor(fd + 1).is_none());

    let guard = table.try_lock_guard_by_descriptor(fd).unwrap();
    let contender = Arc::clone(&table);
    let acquired = thread::spawn(move || contender.try_lock_guard_by_descriptor(fd).is_some())
        .join()
        .unwrap();
    assert!(!acquired);

    drop(guard);
    assert!(!object.lock().is_locked());
}

#[test]
fn test_concurrent_registration_claims_distinct_slots() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 6;

    let closes = counter();
    let table: Arc<EmuFileTable<TrackedFile>> = Arc::new(EmuFileTable::new());
    let start = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let table = Arc::clone(&table);
            let start = Arc::clone(&start);
            let closes = Arc::clone(&closes);
            thread::spawn(move || {
                start.wait();
                (0..PER_THREAD)
                    .filter_map(|i| {
                        table
                            .register(TrackedFile::new((t * PER_THREAD + i) as u32, &closes))
                            .ok()
                            .and_then(|object| table.descriptor_of(&object))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut descriptors: Vec<i32> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect();

    // 48 attempts against 50 slots: every attempt wins a unique slot
    assert_eq!(descriptors.len(), THREADS * PER_THREAD);
    descriptors.sort_unstable();
    descriptors.dedup();
    assert_eq!(descriptors.len(), THREADS * PER_THREAD);
    assert_eq!(table.len(), THREADS * PER_THREAD);
}
