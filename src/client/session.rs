//! # session
//!
//! One engine context bound to one credential set, living for one logical
//! operation. Contexts, directories and files are released by their guards'
//! `Drop`, exactly once, whatever path the operation takes.

use std::sync::Arc;

use super::{SmbCredentials, SmbOptions};
use crate::engine::{AuthReply, DirEntry, OpenOptions, SmbEngine};
use crate::CifsResult;

/// Username supplied when credentials don't carry one
const GUEST_USER: &str = "guest";

/// Supplies the credentials of a session to the engine's authentication callback
#[derive(Debug)]
pub struct Authenticator {
    credentials: Arc<SmbCredentials>,
}

impl Authenticator {
    pub fn new(credentials: Arc<SmbCredentials>) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &SmbCredentials {
        &self.credentials
    }

    /// Fill `reply` for an authentication request on `server`/`share`.
    ///
    /// An empty workgroup clears the engine's buffer, so the engine falls back
    /// to its configured workgroup. Values are truncated to fit their buffer,
    /// NUL included.
    pub fn supply(&self, server: &str, share: &str, reply: &mut AuthReply<'_>) {
        trace!(
            "authentication requested for smb://{}/{}; user '{}'",
            server,
            share,
            self.credentials.username
        );
        fill(reply.workgroup, &self.credentials.workgroup);
        if self.credentials.username.is_empty() {
            fill(reply.username, GUEST_USER);
        } else {
            fill(reply.username, &self.credentials.username);
        }
        fill(reply.password, &self.credentials.password);
    }
}

/// Copy `value` into a C string buffer, truncating it if needed
fn fill(buf: &mut [u8], value: &str) {
    let Some(max) = buf.len().checked_sub(1) else {
        return;
    };
    let len = value.len().min(max);
    buf[..len].copy_from_slice(&value.as_bytes()[..len]);
    buf[len] = 0;
}

/// A live engine context with its credentials attached
pub struct Session<'a, E: SmbEngine> {
    engine: &'a E,
    context: E::Context,
}

impl<'a, E: SmbEngine> Session<'a, E> {
    /// Create and initialize a context for `credentials`.
    ///
    /// On failure nothing stays allocated.
    pub fn open(
        engine: &'a E,
        credentials: Arc<SmbCredentials>,
        options: &SmbOptions,
    ) -> CifsResult<Self> {
        trace!("creating smb context for user '{}'", credentials.username);
        let mut context = engine.new_context().map_err(|e| {
            error!("failed to allocate smb context: {:?}", e);
            e
        })?;
        engine.set_authenticator(&mut context, Arc::new(Authenticator::new(credentials)));
        engine.configure(&mut context, options);
        if let Err(e) = engine.init_context(&mut context) {
            error!("failed to initialize smb context: {:?}", e);
            drop(engine.take_authenticator(&mut context));
            engine.free_context(&mut context);
            return Err(e.into());
        }
        debug!("smb context ready");
        Ok(Self { engine, context })
    }

    /// Tear the session down. Same as dropping it.
    pub fn close(self) {}

    /// Open `url` as a directory
    pub fn opendir<'s>(&'s self, url: &str) -> CifsResult<RemoteDir<'s, 'a, E>> {
        trace!("opening directory {}", url);
        let dir = self.engine.opendir(&self.context, url).map_err(|e| {
            error!("failed to open directory {}: {:?}", url, e);
            e
        })?;
        Ok(RemoteDir { session: self, dir })
    }

    /// Open the file at `url`; new files get `mode`
    pub fn open_file<'s>(
        &'s self,
        url: &str,
        options: OpenOptions,
        mode: u32,
    ) -> CifsResult<RemoteFile<'s, 'a, E>> {
        trace!("opening file {} with {:?}", url, options);
        let file = self
            .engine
            .open(&self.context, url, options, mode)
            .map_err(|e| {
                error!("failed to open file {}: {:?}", url, e);
                e
            })?;
        Ok(RemoteFile {
            session: self,
            file,
        })
    }
}

impl<E: SmbEngine> Drop for Session<'_, E> {
    fn drop(&mut self) {
        trace!("destroying smb context");
        drop(self.engine.take_authenticator(&mut self.context));
        self.engine.purge_cached_servers(&mut self.context);
        self.engine.free_context(&mut self.context);
    }
}

/// Directory open on a session; iterates over its entries
pub struct RemoteDir<'s, 'a, E: SmbEngine> {
    session: &'s Session<'a, E>,
    dir: E::Dir,
}

impl<E: SmbEngine> Iterator for RemoteDir<'_, '_, E> {
    type Item = CifsResult<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let session = self.session;
        match session.engine.readdir(&session.context, &mut self.dir) {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                error!("failed to read directory entry: {:?}", e);
                Some(Err(e.into()))
            }
        }
    }
}

impl<E: SmbEngine> Drop for RemoteDir<'_, '_, E> {
    fn drop(&mut self) {
        let session = self.session;
        if let Err(e) = session.engine.closedir(&session.context, &mut self.dir) {
            warn!("failed to close directory: {:?}", e);
        }
    }
}

/// File open on a session
pub struct RemoteFile<'s, 'a, E: SmbEngine> {
    session: &'s Session<'a, E>,
    file: E::File,
}

impl<E: SmbEngine> RemoteFile<'_, '_, E> {
    /// Read into `buf`; `Ok(0)` at end of file
    pub fn read(&mut self, buf: &mut [u8]) -> CifsResult<usize> {
        let session = self.session;
        session
            .engine
            .read(&session.context, &mut self.file, buf)
            .map_err(|e| {
                error!("failed to read file: {:?}", e);
                e.into()
            })
    }

    /// Write from `buf`; returns the amount of bytes accepted by the server
    pub fn write(&mut self, buf: &[u8]) -> CifsResult<usize> {
        let session = self.session;
        session
            .engine
            .write(&session.context, &mut self.file, buf)
            .map_err(|e| {
                error!("failed to write file: {:?}", e);
                e.into()
            })
    }
}

impl<E: SmbEngine> Drop for RemoteFile<'_, '_, E> {
    fn drop(&mut self) {
        let session = self.session;
        if let Err(e) = session.engine.close(&session.context, &mut self.file) {
            warn!("failed to close file: {:?}", e);
        }
    }
}
