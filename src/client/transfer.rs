//! # transfer
//!
//! Reading and writing whole remote files, and copying files between the
//! local file system and a SMB server

use std::fs;
use std::path::Path;
use std::sync::Arc;

use url::Url;

use super::{CifsClient, ServerAddress, SmbCredentials};
use crate::engine::{OpenOptions, SmbEngine};
use crate::{CifsResult, CopyError};

/// Size of the buffer remote files are read through
pub const READ_BUFFER_SIZE: usize = 1024 * 1024;
/// Largest amount of bytes handed to a single remote write
pub const WRITE_CHUNK_SIZE: usize = 1024 * 1024;

/// Permissions given to files created on the server
const DEFAULT_FILE_MODE: u32 = 0o644;

impl<E: SmbEngine> CifsClient<E> {
    /// Write `data` to the file at `address`.
    ///
    /// With `overwrite` unset, an existing file fails with `AlreadyExists`.
    /// Returns the amount of bytes written, which is less than `data.len()`
    /// if the server stops accepting data.
    pub fn write_file(
        &self,
        address: &ServerAddress,
        credentials: Arc<SmbCredentials>,
        data: &[u8],
        overwrite: bool,
    ) -> CifsResult<usize> {
        trace!(
            "writing {} bytes to {} (overwrite: {})",
            data.len(),
            address,
            overwrite
        );
        let session = self.session(credentials)?;
        let mut file = session.open_file(
            address.as_str(),
            OpenOptions::default()
                .write(true)
                .create(true)
                .truncate(overwrite)
                .exclusive(!overwrite),
            DEFAULT_FILE_MODE,
        )?;
        let mut written = 0;
        while written < data.len() {
            let end = data.len().min(written + WRITE_CHUNK_SIZE);
            let n = file.write(&data[written..end])?;
            if n == 0 {
                warn!(
                    "server stopped accepting data for {} after {} bytes",
                    address, written
                );
                break;
            }
            written += n;
        }
        debug!("wrote {} bytes to {}", written, address);
        Ok(written)
    }

    /// Read the whole file at `address`
    pub fn read_file(
        &self,
        address: &ServerAddress,
        credentials: Arc<SmbCredentials>,
    ) -> CifsResult<Vec<u8>> {
        trace!("reading {}", address);
        let session = self.session(credentials)?;
        let mut file = session.open_file(
            address.as_str(),
            OpenOptions::default().read(true),
            0,
        )?;
        let mut data = Vec::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = file.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buffer[..n]);
        }
        debug!("read {} bytes from {}", data.len(), address);
        Ok(data)
    }

    /// Copy the local file `src` to `dest` on the server, replacing it if it exists
    pub fn copy_to_server(&self, src: &Path, dest: &Url) -> Result<(), CopyError> {
        let (address, credentials) = ServerAddress::extract(dest)?;
        info!("copying {} to {}", src.display(), address);
        let data = fs::read(src).map_err(|e| {
            error!("failed to read local file {}: {}", src.display(), e);
            CopyError::local(e)
        })?;
        self.write_file(&address, Arc::new(credentials), &data, true)?;
        Ok(())
    }

    /// Copy `src` on the server to the local file `dest`
    pub fn copy_from_server(&self, src: &Url, dest: &Path) -> Result<(), CopyError> {
        let (address, credentials) = ServerAddress::extract(src)?;
        info!("copying {} to {}", address, dest.display());
        let data = self.read_file(&address, Arc::new(credentials))?;
        fs::write(dest, data).map_err(|e| {
            error!("failed to write local file {}: {}", dest.display(), e);
            CopyError::LocalFileError(e)
        })
    }
}
