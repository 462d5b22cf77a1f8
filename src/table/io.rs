/*!
 * Descriptor-Addressed I/O
 *
 * read/write/seek/flush on emulated descriptors, plus read/write on
 * stream tokens. Each call holds the slot's lock for its whole duration,
 * so concurrent callers on one file are serialised while other files
 * proceed.
 */

use std::io::{Read, Seek, SeekFrom, Write};

use super::lock::SlotGuard;
use super::slot::EmuFileRef;
use super::token::StreamToken;
use super::EmuFileTable;
use crate::core::errors::{EmuError, EmuResult};
use crate::vfs::EmulatedFile;

impl<F: EmulatedFile, const N: usize> EmuFileTable<F, N> {
    fn locked_io<R>(&self, fd: i32, op: impl FnOnce(&mut F) -> std::io::Result<R>) -> EmuResult<R> {
        let object = self
            .object_by_descriptor(fd)
            .ok_or(EmuError::InvalidDescriptor(fd))?;
        self.locked_object_io(object, op)
    }

    fn locked_stream_io<R>(
        &self,
        token: StreamToken,
        op: impl FnOnce(&mut F) -> std::io::Result<R>,
    ) -> EmuResult<R> {
        let object = self
            .object_by_stream(token)
            .ok_or(EmuError::InvalidStream(token.as_raw()))?;
        self.locked_object_io(object, op)
    }

    fn locked_object_io<R>(
        &self,
        object: EmuFileRef<F>,
        op: impl FnOnce(&mut F) -> std::io::Result<R>,
    ) -> EmuResult<R> {
        let fd = self.descriptor_at(object.index());
        let guard =
            SlotGuard::acquire(object, self.config().lock_timeout).ok_or(EmuError::LockTimeout(fd))?;

        guard
            .with_file(op)
            .ok_or(EmuError::Closed(fd))?
            .map_err(|e| EmuError::io(fd, &e))
    }
}

impl<F: EmulatedFile + Read, const N: usize> EmuFileTable<F, N> {
    /// Read into `buf` from the file behind `fd`
    pub fn read(&self, fd: i32, buf: &mut [u8]) -> EmuResult<usize> {
        self.locked_io(fd, |file| file.read(buf))
    }

    /// Read until EOF, appending to `buf`
    pub fn read_to_end(&self, fd: i32, buf: &mut Vec<u8>) -> EmuResult<usize> {
        self.locked_io(fd, |file| file.read_to_end(buf))
    }

    /// Read into `buf` from the file behind `token`
    pub fn read_stream(&self, token: StreamToken, buf: &mut [u8]) -> EmuResult<usize> {
        self.locked_stream_io(token, |file| file.read(buf))
    }
}

impl<F: EmulatedFile + Write, const N: usize> EmuFileTable<F, N> {
    /// Write all of `data` to the file behind `fd`
    pub fn write(&self, fd: i32, data: &[u8]) -> EmuResult<usize> {
        self.locked_io(fd, |file| file.write_all(data).map(|()| data.len()))
    }

    pub fn flush(&self, fd: i32) -> EmuResult<()> {
        self.locked_io(fd, |file| file.flush())
    }

    /// Write all of `data` to the file behind `token`
    pub fn write_stream(&self, token: StreamToken, data: &[u8]) -> EmuResult<usize> {
        self.locked_stream_io(token, |file| file.write_all(data).map(|()| data.len()))
    }
}

impl<F: EmulatedFile + Seek, const N: usize> EmuFileTable<F, N> {
    /// Seek the file behind `fd`, returning the new offset
    pub fn seek(&self, fd: i32, pos: SeekFrom) -> EmuResult<u64> {
        self.locked_io(fd, |file| file.seek(pos))
    }

    pub fn tell(&self, fd: i32) -> EmuResult<u64> {
        self.locked_io(fd, |file| file.stream_position())
    }
}
