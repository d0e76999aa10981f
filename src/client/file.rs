use url::Url;

use super::address;

/// Which entries a listing keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    File,
    Directory,
    FileOrDirectory,
}

impl TargetType {
    pub fn accepts_files(self) -> bool {
        matches!(self, Self::File | Self::FileOrDirectory)
    }

    pub fn accepts_directories(self) -> bool {
        matches!(self, Self::Directory | Self::FileOrDirectory)
    }
}

/// A file or directory found on a SMB server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    url: Url,
    name: String,
    is_directory: bool,
}

impl FileInfo {
    pub(crate) fn new(url: Url, is_directory: bool) -> Self {
        let name = address::last_segment(&url);
        Self {
            url,
            name,
            is_directory,
        }
    }

    /// Full address; directories end with `/`
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory
    }
}
