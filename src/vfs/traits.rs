/*!
 * VFS Traits
 * Contract between host filesystem objects and the emulated file table
 */

use std::io;

/// Open file object that can be registered with an emulated file table
///
/// The table owns the object once registered and never inspects it.
/// `close` is called exactly once when the table force-closes the
/// object; files handed back by a plain unregister are not closed.
pub trait EmulatedFile: Send {
    /// Flush and release the underlying file
    fn close(&mut self) -> io::Result<()>;

    /// Name shown in log events
    fn name(&self) -> Option<&str> {
        None
    }
}

impl<T: EmulatedFile + ?Sized> EmulatedFile for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

/// Real OS files
///
/// `close` only flushes, which is a no-op for `File`. The OS descriptor is
/// released when the table drops the file, and errors from that close are
/// not reported. Wrap the file and call `sync_all` in `close` when write
/// durability has to be checked.
impl EmulatedFile for std::fs::File {
    fn close(&mut self) -> io::Result<()> {
        io::Write::flush(self)
    }
}
