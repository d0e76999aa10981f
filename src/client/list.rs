//! # list
//!
//! Directory enumeration: raw entries, hosts and file infos

use std::sync::Arc;

use url::Url;

use super::{CifsClient, FileInfo, ServerAddress, SmbCredentials, TargetType};
use crate::engine::{DirEntry, DirEntryType, SmbEngine};
use crate::utils::smb as smb_utils;
use crate::CifsResult;

impl<E: SmbEngine> CifsClient<E> {
    /// List the raw entries at `address`, in the order the engine returns them
    pub fn list_dir_entries(
        &self,
        address: &ServerAddress,
        credentials: Arc<SmbCredentials>,
    ) -> CifsResult<Vec<DirEntry>> {
        trace!("listing entries at {}", address);
        let session = self.session(credentials)?;
        let entries = session
            .opendir(address.as_str())?
            .collect::<CifsResult<Vec<DirEntry>>>()?;
        debug!("found {} entries at {}", entries.len(), address);
        Ok(entries)
    }

    /// List the names of the servers reachable in the default workgroup
    pub fn get_hosts(&self) -> CifsResult<Vec<String>> {
        let hosts: Vec<String> = self
            .list_dir_entries(&ServerAddress::network_root(), SmbCredentials::guest())?
            .into_iter()
            .filter(|entry| entry.entry_type == DirEntryType::Server)
            .map(|entry| entry.name)
            .collect();
        debug!("found {} hosts", hosts.len());
        Ok(hosts)
    }

    /// List shares, directories and files at `url`, keeping those `target` asks for.
    ///
    /// Credentials embedded in `url` are used to authenticate and carried on to
    /// the returned addresses.
    pub fn get_file_info_list(&self, url: &Url, target: TargetType) -> CifsResult<Vec<FileInfo>> {
        let (address, credentials) = ServerAddress::extract(url)?;
        let files: Vec<FileInfo> = self
            .list_dir_entries(&address, Arc::new(credentials))?
            .iter()
            .filter_map(|entry| smb_utils::dirent_to_file_info(url, entry, target))
            .collect();
        debug!("{} entries at {} match {:?}", files.len(), address, target);
        Ok(files)
    }
}
