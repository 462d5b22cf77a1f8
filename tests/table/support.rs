/*!
 * Shared fixtures for table tests
 */

use emufile::EmulatedFile;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// File that records how often it was closed and can be told to fail
#[derive(Debug)]
pub struct TrackedFile {
    pub id: u32,
    closes: Arc<AtomicUsize>,
    fail_close: bool,
}

impl TrackedFile {
    pub fn new(id: u32, closes: &Arc<AtomicUsize>) -> Self {
        Self {
            id,
            closes: Arc::clone(closes),
            fail_close: false,
        }
    }

    pub fn failing(id: u32, closes: &Arc<AtomicUsize>) -> Self {
        Self {
            fail_close: true,
            ..Self::new(id, closes)
        }
    }
}

impl EmulatedFile for TrackedFile {
    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
        }
        Ok(())
    }
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn count(closes: &Arc<AtomicUsize>) -> usize {
    closes.load(Ordering::SeqCst)
}
