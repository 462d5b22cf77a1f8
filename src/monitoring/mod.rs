/*!
 * Monitoring Module
 * Tracing setup and table statistics
 */

pub mod stats;
pub mod tracer;

pub use stats::{CleanupReport, TableStats};
pub(crate) use stats::TableCounters;
pub use tracer::init_tracing;
