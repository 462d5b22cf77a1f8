/*!
 * Virtual File System Module
 * File objects the emulated table can host
 */

pub mod memfile;
pub mod traits;

// Re-exports
pub use memfile::MemFile;
pub use traits::EmulatedFile;
