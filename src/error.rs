//! # error
//!
//! Error taxonomy for CIFS operations

use std::io;

use thiserror::Error;
use tokio::task::JoinError;

use crate::engine::Errno;

/// Result returned by remote operations
pub type CifsResult<T> = Result<T, CifsError>;

/// Semantic error kinds for failures reported by the SMB engine or the OS.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CifsError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("out of memory")]
    OutOfMemory,
    #[error("permission denied")]
    PermissionDenied,
    #[error("no such file or directory")]
    NoSuchFileOrDirectory,
    #[error("not a directory")]
    NotDirectory,
    #[error("is a directory")]
    IsDirectory,
    #[error("operation not permitted")]
    OperationNotPermitted,
    #[error("share does not exist")]
    ShareNotExist,
    #[error("already exists")]
    AlreadyExists,
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("unknown error (errno {0})")]
    Unknown(i32),
}

impl CifsError {
    /// Classify a platform error code.
    ///
    /// Must be called right after the failing call, since errno is only
    /// meaningful until the next one.
    pub fn from_errno(code: i32) -> Self {
        match code {
            libc::EINVAL => Self::InvalidArgument,
            libc::ENOMEM => Self::OutOfMemory,
            libc::EACCES => Self::PermissionDenied,
            libc::ENOENT => Self::NoSuchFileOrDirectory,
            libc::ENOTDIR => Self::NotDirectory,
            libc::EISDIR => Self::IsDirectory,
            libc::EPERM => Self::OperationNotPermitted,
            libc::ENODEV => Self::ShareNotExist,
            libc::EEXIST => Self::AlreadyExists,
            libc::ENOTEMPTY => Self::DirectoryNotEmpty,
            libc::ECONNREFUSED => Self::ConnectionRefused,
            other => Self::Unknown(other),
        }
    }
}

impl From<Errno> for CifsError {
    fn from(errno: Errno) -> Self {
        Self::from_errno(errno.0)
    }
}

impl From<JoinError> for CifsError {
    fn from(e: JoinError) -> Self {
        error!("background task failed: {}", e);
        Self::Unknown(0)
    }
}

/// Errors raised by the copy operations, keeping local failures apart from remote ones.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("local file not found")]
    LocalFileNotFound,
    #[error("local file error: {0}")]
    LocalFileError(#[source] io::Error),
    #[error("remote error: {0}")]
    Cifs(#[from] CifsError),
}

impl CopyError {
    /// Wrap a local io error, singling out missing files
    pub(crate) fn local(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::LocalFileNotFound,
            _ => Self::LocalFileError(e),
        }
    }
}

impl From<JoinError> for CopyError {
    fn from(e: JoinError) -> Self {
        Self::Cifs(CifsError::from(e))
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_classify_known_errno() {
        let table = [
            (libc::EINVAL, CifsError::InvalidArgument),
            (libc::ENOMEM, CifsError::OutOfMemory),
            (libc::EACCES, CifsError::PermissionDenied),
            (libc::ENOENT, CifsError::NoSuchFileOrDirectory),
            (libc::ENOTDIR, CifsError::NotDirectory),
            (libc::EISDIR, CifsError::IsDirectory),
            (libc::EPERM, CifsError::OperationNotPermitted),
            (libc::ENODEV, CifsError::ShareNotExist),
            (libc::EEXIST, CifsError::AlreadyExists),
            (libc::ENOTEMPTY, CifsError::DirectoryNotEmpty),
            (libc::ECONNREFUSED, CifsError::ConnectionRefused),
        ];
        for (code, expected) in table {
            assert_eq!(CifsError::from_errno(code), expected);
            assert_eq!(CifsError::from(Errno(code)), expected);
        }
    }

    #[test]
    fn should_keep_unknown_errno() {
        assert_eq!(CifsError::from_errno(0), CifsError::Unknown(0));
        assert_eq!(
            CifsError::from_errno(libc::ETIMEDOUT),
            CifsError::Unknown(libc::ETIMEDOUT)
        );
        assert_eq!(CifsError::from_errno(-42), CifsError::Unknown(-42));
    }

    #[test]
    fn should_wrap_local_errors() {
        assert!(matches!(
            CopyError::local(io::Error::from(io::ErrorKind::NotFound)),
            CopyError::LocalFileNotFound
        ));
        assert!(matches!(
            CopyError::local(io::Error::from(io::ErrorKind::PermissionDenied)),
            CopyError::LocalFileError(e) if e.kind() == io::ErrorKind::PermissionDenied
        ));
        assert!(matches!(
            CopyError::from(CifsError::AlreadyExists),
            CopyError::Cifs(CifsError::AlreadyExists)
        ));
    }

    #[test]
    fn should_display_errors() {
        assert_eq!(CifsError::Unknown(5).to_string(), "unknown error (errno 5)");
        assert_eq!(
            CopyError::Cifs(CifsError::PermissionDenied).to_string(),
            "remote error: permission denied"
        );
    }
}
