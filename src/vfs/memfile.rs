/*!
 * In-Memory File
 * Cursor-backed file object for hosts without a real filesystem behind them
 */

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use super::traits::EmulatedFile;

/// In-memory file handle
#[derive(Debug, Clone)]
pub struct MemFile {
    name: String,
    cursor: Cursor<Vec<u8>>,
    readable: bool,
    writable: bool,
    closed: bool,
}

impl MemFile {
    /// Empty read/write file
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_contents(name, Vec::new())
    }

    /// Read/write file positioned at offset 0
    pub fn with_contents(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            cursor: Cursor::new(data.into()),
            readable: true,
            writable: true,
            closed: false,
        }
    }

    pub fn read_only(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            writable: false,
            ..Self::with_contents(name, data)
        }
    }

    pub fn contents(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.cursor.into_inner()
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::Other, "file is closed"));
        }
        Ok(())
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        if !self.readable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file not opened for reading",
            ));
        }
        self.cursor.read(buf)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file not opened for writing",
            ));
        }
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_open()?;
        self.cursor.seek(pos)
    }
}

impl EmulatedFile for MemFile {
    fn close(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.closed = true;
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
