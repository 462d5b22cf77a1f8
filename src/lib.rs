/*!
 * Emulated File Descriptor Library
 *
 * Fixed-capacity table that lets descriptor- and stream-based callers
 * operate on host file objects instead of real OS descriptors.
 */

pub mod core;
pub mod monitoring;
pub mod table;
pub mod vfs;

// Re-exports
pub use crate::core::{
    EmuError, EmuResult, RegisterError, TableConfig, DESCRIPTOR_BASE, INVALID_DESCRIPTOR,
    MAX_EMULATED_FILES,
};
pub use monitoring::{init_tracing, CleanupReport, TableStats};
pub use table::{EmuFileObject, EmuFileRef, EmuFileTable, SlotGuard, SlotLock, StreamToken};
pub use vfs::{EmulatedFile, MemFile};
