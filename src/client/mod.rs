//! # client
//!
//! CIFS client: browse hosts, shares and directories, and copy files to and
//! from a SMB server. Every operation opens its own session and closes it
//! before returning.

pub(crate) mod address;
mod credentials;
mod dispatch;
mod file;
mod list;
mod options;
mod session;
mod transfer;

use std::sync::Arc;

pub use address::ServerAddress;
pub use credentials::SmbCredentials;
pub use dispatch::{dispatch, run_blocking, Completion};
pub use file::{FileInfo, TargetType};
pub use options::SmbOptions;
pub use session::{Authenticator, RemoteDir, RemoteFile, Session};
pub use transfer::{READ_BUFFER_SIZE, WRITE_CHUNK_SIZE};

use crate::engine::SmbEngine;
use crate::CifsResult;

/// CIFS client over an SMB engine
pub struct CifsClient<E: SmbEngine> {
    engine: Arc<E>,
    options: SmbOptions,
}

impl<E: SmbEngine> Clone for CifsClient<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            options: self.options.clone(),
        }
    }
}

impl<E: SmbEngine> CifsClient<E> {
    /// Create a client with the engine's default options
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, SmbOptions::default())
    }

    /// Create a client whose contexts are configured with `options`
    pub fn with_options(engine: E, options: SmbOptions) -> Self {
        Self {
            engine: Arc::new(engine),
            options,
        }
    }

    /// Return a reference to the inner engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> &SmbOptions {
        &self.options
    }

    /// Open a session for a single operation
    pub fn session(&self, credentials: Arc<SmbCredentials>) -> CifsResult<Session<'_, E>> {
        Session::open(self.engine.as_ref(), credentials, &self.options)
    }
}

#[cfg(feature = "libsmbclient")]
#[cfg(target_family = "unix")]
impl CifsClient<crate::engine::LibSmbClient> {
    /// Create a client backed by libsmbclient
    pub fn libsmbclient(options: SmbOptions) -> Self {
        Self::with_options(crate::engine::LibSmbClient::new(), options)
    }
}
