/*!
 * Registration, unregistration and teardown
 */

use crate::support::{count, counter, TrackedFile};
use emufile::{EmuError, EmuFileTable, DESCRIPTOR_BASE, MAX_EMULATED_FILES};
use pretty_assertions::assert_eq;

#[test]
fn test_capacity_invariant() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile> = EmuFileTable::new();
    assert_eq!(table.capacity(), MAX_EMULATED_FILES);

    let objects: Vec<_> = (0..MAX_EMULATED_FILES as u32)
        .map(|id| table.register(TrackedFile::new(id, &closes)).unwrap())
        .collect();
    assert_eq!(table.len(), MAX_EMULATED_FILES);

    let rejected = table.register(TrackedFile::new(999, &closes)).unwrap_err();
    assert_eq!(rejected.error(), EmuError::TableFull { capacity: MAX_EMULATED_FILES });
    assert_eq!(rejected.into_file().id, 999);

    // all previous registrations are untouched
    assert_eq!(table.len(), MAX_EMULATED_FILES);
    for object in &objects {
        assert!(table.is_emulated_stream(object.stream()));
    }
    assert_eq!(count(&closes), 0);
    assert_eq!(table.stats().rejected_total, 1);
}

#[test]
fn test_unregister_frees_exactly_one_slot() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile, 8> = EmuFileTable::new();
    for id in 0..8 {
        table.register(TrackedFile::new(id, &closes)).unwrap();
    }

    let fd = table.base() + 5;
    let handed_back = table.unregister_by_descriptor(fd).unwrap();
    assert_eq!(handed_back.id, 5);
    assert_eq!(count(&closes), 0, "unregister by descriptor must not close");

    let object = table.register(TrackedFile::new(100, &closes)).unwrap();
    assert_eq!(table.descriptor_of(&object), Some(fd));
    assert!(table.register(TrackedFile::new(101, &closes)).is_err());
}

#[test]
fn test_lowest_index_reuse_scenario() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile> = EmuFileTable::new();

    let h1 = table.register(TrackedFile::new(1, &closes)).unwrap();
    let h2 = table.register(TrackedFile::new(2, &closes)).unwrap();
    let h3 = table.register(TrackedFile::new(3, &closes)).unwrap();

    let d1 = table.descriptor_of(&h1).unwrap();
    let d2 = table.descriptor_of(&h2).unwrap();
    let d3 = table.descriptor_of(&h3).unwrap();
    assert_eq!((d1, d2, d3), (DESCRIPTOR_BASE, DESCRIPTOR_BASE + 1, DESCRIPTOR_BASE + 2));

    assert_eq!(table.unregister_by_descriptor(d2).map(|f| f.id), Some(2));

    let h4 = table.register(TrackedFile::new(4, &closes)).unwrap();
    assert_eq!(table.descriptor_of(&h4), Some(d2));
    assert_eq!(table.with_file_by_descriptor(d2, |f| f.id), Some(4));

    assert!(table.is_emulated_descriptor(d1));
    assert!(!table.is_emulated_descriptor(d1 - 1));
}

#[test]
fn test_no_cross_contamination() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile, 4> = EmuFileTable::new();
    let a = table.register(TrackedFile::new(10, &closes)).unwrap();
    let b = table.register(TrackedFile::new(20, &closes)).unwrap();
    let fd_a = table.descriptor_of(&a).unwrap();
    let fd_b = table.descriptor_of(&b).unwrap();

    assert!(table.lock_by_descriptor(fd_b));
    table.unregister_by_descriptor(fd_a).unwrap();

    assert!(table.is_emulated_descriptor(fd_b));
    assert!(table.is_emulated_stream(b.stream()));
    assert_eq!(table.with_file_by_descriptor(fd_b, |f| f.id), Some(20));
    assert!(b.lock().is_held_by_current_thread());
    assert!(table.unlock_by_descriptor(fd_b));
}

#[test]
fn test_double_unregister_is_noop() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile, 4> = EmuFileTable::new();
    let object = table.register(TrackedFile::new(1, &closes)).unwrap();
    let fd = table.descriptor_of(&object).unwrap();

    assert!(table.unregister_by_descriptor(fd).is_some());
    assert!(table.unregister_by_descriptor(fd).is_none());
    assert!(table.unregister_by_stream(object.stream()).is_none());
    assert!(table.unregister(&object, true).is_none());
    assert_eq!(table.stats().unregistered_total, 1);
    assert_eq!(count(&closes), 0);
}

#[test]
fn test_unregister_by_stream_hands_file_back() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile, 4> = EmuFileTable::new();
    let object = table.register(TrackedFile::new(7, &closes)).unwrap();

    let file = table.unregister_by_stream(object.stream()).unwrap();
    assert_eq!(file.id, 7);
    assert!(!object.is_open());
    assert!(table.is_empty());
    assert_eq!(count(&closes), 0);
}

#[test]
fn test_clean_up_closes_each_file_once() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile, 6> = EmuFileTable::new();
    for id in 0..4 {
        table.register(TrackedFile::new(id, &closes)).unwrap();
    }
    table.register(TrackedFile::failing(4, &closes)).unwrap();

    let report = table.clean_up();
    assert_eq!(report.closed, 4);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        &report.failures[0],
        EmuError::CloseFailed { descriptor, .. } if *descriptor == table.base() + 4
    ));
    assert_eq!(count(&closes), 5);
    assert!(table.is_empty());

    let again = table.clean_up();
    assert_eq!(again.detached(), 0);
    assert!(again.is_clean());
    assert_eq!(count(&closes), 5);
}

#[test]
fn test_drop_closes_remaining_files() {
    let closes = counter();
    {
        let table: EmuFileTable<TrackedFile, 4> = EmuFileTable::new();
        table.register(TrackedFile::new(1, &closes)).unwrap();
        table.register(TrackedFile::new(2, &closes)).unwrap();
        let handed_back = table.unregister_by_descriptor(table.base());
        assert!(handed_back.is_some());
    }
    assert_eq!(count(&closes), 1);
}

#[test]
fn test_auxiliary_fields_untouched_by_table() {
    let closes = counter();
    let table: EmuFileTable<TrackedFile, 2> = EmuFileTable::new();
    let object = table.register(TrackedFile::new(1, &closes)).unwrap();
    assert_eq!((object.mode(), object.fd_hint()), (0, 0));

    object.set_mode(0o644);
    object.set_fd_hint(3);
    let fd = table.descriptor_of(&object).unwrap();
    let resolved = table.object_by_descriptor(fd).unwrap();
    assert_eq!((resolved.mode(), resolved.fd_hint()), (0o644, 3));
}
