/*!
 * Table Limits and Constants
 *
 * Fixed sizes and descriptor ranges for the emulated file table.
 * - Capacity values bound how many host files can be emulated at once
 * - Descriptor values must stay disjoint from anything the OS hands out
 */

// =============================================================================
// CAPACITY
// =============================================================================

/// Default number of slots in an emulated file table
pub const MAX_EMULATED_FILES: usize = 50;

/// Bits per word in the occupancy bitmap
pub const BITMAP_WORD_BITS: usize = u64::BITS as usize;

// =============================================================================
// DESCRIPTOR RANGE
// =============================================================================

/// First synthetic descriptor handed out by a default table
/// Callers classify emulated vs real descriptors with a single range check
pub const DESCRIPTOR_BASE: i32 = 0x700_0000;

/// Lowest descriptor base a table will accept
/// Well above any per-process descriptor limit the host OS configures
pub const MIN_DESCRIPTOR_BASE: i32 = 1 << 20;

/// Sentinel for callers that need the integer form of "no descriptor"
pub const INVALID_DESCRIPTOR: i32 = -1;

// =============================================================================
// STREAM TOKENS
// =============================================================================

/// First occupancy generation issued in the process
/// Generation zero is never issued so a zeroed raw token never resolves
pub const FIRST_GENERATION: u32 = 1;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Overrides the descriptor base (decimal or 0x-prefixed hex)
pub const ENV_DESCRIPTOR_BASE: &str = "EMUFILE_DESCRIPTOR_BASE";

/// Per-slot lock timeout in milliseconds (0 disables the timeout)
pub const ENV_LOCK_TIMEOUT_MS: &str = "EMUFILE_LOCK_TIMEOUT_MS";

/// Enables or disables registration logging
pub const ENV_LOG_REGISTRATIONS: &str = "EMUFILE_LOG_REGISTRATIONS";

/// Selects JSON tracing output
pub const ENV_TRACE_JSON: &str = "EMUFILE_TRACE_JSON";
