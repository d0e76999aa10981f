//! # dispatch
//!
//! Asynchronous entry points. Operations block for their whole duration, so
//! they run on tokio's blocking pool; results come back either as a future
//! or through a completion handler.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;

use tokio::runtime::Handle;
use tokio::task::JoinError;
use url::Url;

use super::{CifsClient, FileInfo, TargetType};
use crate::engine::SmbEngine;
use crate::{CifsError, CifsResult, CopyError};

/// Runtime a completion handler is invoked on
#[derive(Debug, Clone, Default)]
pub enum Completion {
    /// The runtime the operation is dispatched from. Without one, the
    /// operation and its handler run on a dedicated thread.
    #[default]
    Current,
    /// A chosen runtime
    Handle(Handle),
}

impl Completion {
    fn handle(self) -> Option<Handle> {
        match self {
            Self::Current => Handle::try_current().ok(),
            Self::Handle(handle) => Some(handle),
        }
    }
}

/// Run blocking `work` on the blocking pool.
///
/// A task that fails to complete (e.g. it panicked) resolves to the error
/// built from the `JoinError`.
pub async fn run_blocking<T, E, F>(work: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) => Err(e.into()),
    }
}

/// Run blocking `work` in the background and hand its outcome to `handler`
/// on the `completion` runtime. Never fails on the calling side; a panicking
/// `work` is reported to `handler` as `Unknown(0)`.
pub fn dispatch<T, E, F, C>(completion: Completion, work: F, handler: C)
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    C: FnOnce(Result<T, E>) + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + From<CifsError> + Send + 'static,
{
    match completion.handle() {
        Some(handle) => {
            handle.spawn(async move {
                let result = run_blocking(work).await;
                handler(result);
            });
        }
        None => {
            debug!("no runtime available; running operation on a dedicated thread");
            thread::spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|_| {
                    error!("background operation panicked");
                    Err(CifsError::Unknown(0).into())
                });
                handler(result)
            });
        }
    }
}

impl<E: SmbEngine> CifsClient<E> {
    pub async fn get_hosts_async(&self) -> CifsResult<Vec<String>> {
        let client = self.clone();
        run_blocking(move || client.get_hosts()).await
    }

    pub async fn get_file_info_list_async(
        &self,
        url: Url,
        target: TargetType,
    ) -> CifsResult<Vec<FileInfo>> {
        let client = self.clone();
        run_blocking(move || client.get_file_info_list(&url, target)).await
    }

    pub async fn copy_to_server_async(&self, src: PathBuf, dest: Url) -> Result<(), CopyError> {
        let client = self.clone();
        run_blocking(move || client.copy_to_server(&src, &dest)).await
    }

    pub async fn copy_from_server_async(&self, src: Url, dest: PathBuf) -> Result<(), CopyError> {
        let client = self.clone();
        run_blocking(move || client.copy_from_server(&src, &dest)).await
    }

    /// List hosts in the background; `handler` gets the outcome on `completion`
    pub fn get_hosts_with<C>(&self, completion: Completion, handler: C)
    where
        C: FnOnce(CifsResult<Vec<String>>) + Send + 'static,
    {
        let client = self.clone();
        dispatch(completion, move || client.get_hosts(), handler)
    }

    /// List `url` in the background; `handler` gets the outcome on `completion`
    pub fn get_file_info_list_with<C>(
        &self,
        url: Url,
        target: TargetType,
        completion: Completion,
        handler: C,
    ) where
        C: FnOnce(CifsResult<Vec<FileInfo>>) + Send + 'static,
    {
        let client = self.clone();
        dispatch(
            completion,
            move || client.get_file_info_list(&url, target),
            handler,
        )
    }

    /// Copy `src` to the server in the background; `handler` gets the outcome on `completion`
    pub fn copy_to_server_with<C>(&self, src: PathBuf, dest: Url, completion: Completion, handler: C)
    where
        C: FnOnce(Result<(), CopyError>) + Send + 'static,
    {
        let client = self.clone();
        dispatch(
            completion,
            move || client.copy_to_server(&src, &dest),
            handler,
        )
    }

    /// Copy `src` from the server in the background; `handler` gets the outcome on `completion`
    pub fn copy_from_server_with<C>(
        &self,
        src: Url,
        dest: PathBuf,
        completion: Completion,
        handler: C,
    ) where
        C: FnOnce(Result<(), CopyError>) + Send + 'static,
    {
        let client = self.clone();
        dispatch(
            completion,
            move || client.copy_from_server(&src, &dest),
            handler,
        )
    }
}
