//! # engine
//!
//! The SMB engine capability this crate drives. The engine owns the wire
//! protocol; this crate only opens, lists, reads and writes remote paths
//! through it, one context per logical operation.

#[cfg(all(target_family = "unix", feature = "libsmbclient"))]
mod libsmbclient;
#[cfg(all(target_family = "unix", feature = "libsmbclient"))]
pub use self::libsmbclient::LibSmbClient;

use std::sync::Arc;

use crate::client::{Authenticator, SmbOptions};

/// Raw platform error code captured right after a failing engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub i32);

/// Raw engine result
pub type EngineResult<T> = Result<T, Errno>;

/// Kind of a directory entry, as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirEntryType {
    Workgroup,
    Server,
    FileShare,
    PrinterShare,
    CommsShare,
    IpcShare,
    Directory,
    File,
    Link,
    Unrecognized,
}

impl DirEntryType {
    /// Map the engine's numeric entry type (`SMBC_*` constants)
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Workgroup,
            2 => Self::Server,
            3 => Self::FileShare,
            4 => Self::PrinterShare,
            5 => Self::CommsShare,
            6 => Self::IpcShare,
            7 => Self::Directory,
            8 => Self::File,
            9 => Self::Link,
            _ => Self::Unrecognized,
        }
    }
}

/// One raw item returned by directory enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub entry_type: DirEntryType,
    pub name: String,
}

impl DirEntry {
    pub fn new<S: Into<String>>(entry_type: DirEntryType, name: S) -> Self {
        Self {
            entry_type,
            name: name.into(),
        }
    }
}

/// Options used to open a remote file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
    pub exclusive: bool,
}

impl OpenOptions {
    /// Open for reading
    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    /// Open for writing
    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Create the file if it doesn't exist
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Truncate an existing file
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Fail if the file already exists (with `create`)
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }
}

/// Output buffers an authentication request must fill.
///
/// Each buffer has the capacity granted by the engine, NUL terminator included.
pub struct AuthReply<'a> {
    pub workgroup: &'a mut [u8],
    pub username: &'a mut [u8],
    pub password: &'a mut [u8],
}

/// Capability exposed by an SMB client engine.
///
/// Handles are plain values; releasing them is up to the caller, through the
/// `free_context`, `closedir` and `close` primitives, each called once per handle.
pub trait SmbEngine: Send + Sync + 'static {
    /// Connection context
    type Context;
    /// Open directory handle
    type Dir;
    /// Open file handle
    type File;

    /// Allocate a new, uninitialized context
    fn new_context(&self) -> EngineResult<Self::Context>;

    /// Register the authentication callback for `ctx` and attach `authenticator`
    /// to the context, so the callback can look it up from the context handle
    fn set_authenticator(&self, ctx: &mut Self::Context, authenticator: Arc<Authenticator>);

    /// Detach the authenticator from `ctx`, if any
    fn take_authenticator(&self, ctx: &mut Self::Context) -> Option<Arc<Authenticator>>;

    /// Apply options to a context before initialization
    fn configure(&self, ctx: &mut Self::Context, options: &SmbOptions);

    fn init_context(&self, ctx: &mut Self::Context) -> EngineResult<()>;

    /// Drop any server connection the engine cached for this context
    fn purge_cached_servers(&self, ctx: &mut Self::Context);

    fn free_context(&self, ctx: &mut Self::Context);

    fn opendir(&self, ctx: &Self::Context, url: &str) -> EngineResult<Self::Dir>;

    /// Read next entry; `Ok(None)` once entries are exhausted
    fn readdir(&self, ctx: &Self::Context, dir: &mut Self::Dir) -> EngineResult<Option<DirEntry>>;

    fn closedir(&self, ctx: &Self::Context, dir: &mut Self::Dir) -> EngineResult<()>;

    fn open(
        &self,
        ctx: &Self::Context,
        url: &str,
        options: OpenOptions,
        mode: u32,
    ) -> EngineResult<Self::File>;

    fn read(&self, ctx: &Self::Context, file: &mut Self::File, buf: &mut [u8]) -> EngineResult<usize>;

    fn write(&self, ctx: &Self::Context, file: &mut Self::File, buf: &[u8]) -> EngineResult<usize>;

    fn close(&self, ctx: &Self::Context, file: &mut Self::File) -> EngineResult<()>;
}
