//! # smb utils
//!
//! SMB directory entry utilities

use url::Url;

use crate::client::{address, FileInfo, TargetType};
use crate::engine::{DirEntry, DirEntryType};

/// Convert a `DirEntry` listed under `parent` into a `FileInfo`.
///
/// Returns `None` for `.`/`..`, for kinds other than shares, directories and files,
/// for kinds `target` doesn't want and for names no address can be built for.
pub fn dirent_to_file_info(parent: &Url, entry: &DirEntry, target: TargetType) -> Option<FileInfo> {
    if entry.name == "." || entry.name == ".." {
        return None;
    }
    let is_directory = get_dir_flag_from_type(entry.entry_type)?;
    if (is_directory && !target.accepts_directories()) || (!is_directory && !target.accepts_files())
    {
        return None;
    }
    match address::child_url(parent, &entry.name, is_directory) {
        Some(url) => Some(FileInfo::new(url, is_directory)),
        None => {
            warn!("skipping entry '{}': cannot build its address", entry.name);
            None
        }
    }
}

fn get_dir_flag_from_type(entry_type: DirEntryType) -> Option<bool> {
    match entry_type {
        DirEntryType::FileShare | DirEntryType::Directory => Some(true),
        DirEntryType::File => Some(false),
        _ => None,
    }
}
