//! # address
//!
//! SMB URL decomposition: credentials are split out of the URL, and only
//! the authentication-free address is handed to the engine.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use super::SmbCredentials;
use crate::{CifsError, CifsResult};

/// SMB URL scheme
pub const SMB_SCHEME: &str = "smb";

/// Characters escaped in a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Authentication-free SMB address (`smb://host[:port]/path`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress(String);

impl ServerAddress {
    /// Address browsing the servers of the engine's default workgroup
    pub fn network_root() -> Self {
        Self(format!("{}:///", SMB_SCHEME))
    }

    /// Split `url` into an address without user info and the credentials it carried.
    ///
    /// A `DOMAIN;user` username sets the workgroup.
    /// Fails with `InvalidArgument` unless `url` is a `smb://` URL with a host.
    pub fn extract(url: &Url) -> CifsResult<(Self, SmbCredentials)> {
        if url.scheme() != SMB_SCHEME {
            error!("not a smb url: {}", url.scheme());
            return Err(CifsError::InvalidArgument);
        }
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => {
                error!("smb url has no host");
                return Err(CifsError::InvalidArgument);
            }
        };
        let mut address = format!("{}://{}", SMB_SCHEME, host);
        if let Some(port) = url.port() {
            address.push_str(&format!(":{}", port));
        }
        address.push_str(url.path());

        let username = decode(url.username())?;
        let password = decode(url.password().unwrap_or_default())?;
        let credentials = match username.split_once(';') {
            Some((workgroup, username)) => {
                SmbCredentials::new(workgroup, username, password.as_str())
            }
            None => SmbCredentials::new("", username.as_str(), password.as_str()),
        };
        trace!("extracted address {} for user '{}'", address, credentials.username);
        Ok((Self(address), credentials))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn decode(s: &str) -> CifsResult<String> {
    percent_decode_str(s)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| CifsError::InvalidArgument)
}

/// Build the address of entry `name` under the directory `parent`.
///
/// Directories get a trailing separator. User info in `parent` is kept.
pub(crate) fn child_url(parent: &Url, name: &str, directory: bool) -> Option<Url> {
    let mut base = parent.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    // "./" keeps names with a colon from being read as a scheme
    let mut relative = format!("./{}", utf8_percent_encode(name, PATH_SEGMENT));
    if directory {
        relative.push('/');
    }
    base.join(&relative).ok()
}

/// Percent-decoded last path segment of `url`, or an empty string
pub(crate) fn last_segment(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .unwrap_or_default()
}
