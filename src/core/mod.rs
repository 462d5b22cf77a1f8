/*!
 * Core Module
 * Limits, configuration and error handling shared by the table
 */

pub mod config;
pub mod errors;
pub mod limits;

// Re-export for convenience
pub use config::TableConfig;
pub use errors::{EmuError, EmuResult, RegisterError};
pub use limits::*;
