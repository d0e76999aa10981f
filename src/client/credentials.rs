use std::fmt;
use std::sync::{Arc, OnceLock};

/// Identity used to authenticate against a SMB server.
///
/// Empty values are valid: they tell the authentication callback to fall back
/// to its defaults.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct SmbCredentials {
    pub(crate) workgroup: String,
    pub(crate) username: String,
    pub(crate) password: String,
}

impl SmbCredentials {
    pub fn new<S: AsRef<str>>(workgroup: S, username: S, password: S) -> Self {
        Self {
            workgroup: workgroup.as_ref().to_string(),
            username: username.as_ref().to_string(),
            password: password.as_ref().to_string(),
        }
    }

    /// Shared guest identity: empty workgroup, username `guest`, empty password
    pub fn guest() -> Arc<Self> {
        static GUEST: OnceLock<Arc<SmbCredentials>> = OnceLock::new();
        GUEST
            .get_or_init(|| Arc::new(Self::default().username("guest")))
            .clone()
    }

    /// Construct SmbCredentials with the provided workgroup
    pub fn workgroup<S: AsRef<str>>(mut self, workgroup: S) -> Self {
        self.workgroup = workgroup.as_ref().to_string();
        self
    }

    /// Construct SmbCredentials with the provided username
    pub fn username<S: AsRef<str>>(mut self, username: S) -> Self {
        self.username = username.as_ref().to_string();
        self
    }

    /// Construct SmbCredentials with the provided password
    pub fn password<S: AsRef<str>>(mut self, password: S) -> Self {
        self.password = password.as_ref().to_string();
        self
    }

    pub fn get_workgroup(&self) -> &str {
        &self.workgroup
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for SmbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmbCredentials")
            .field("workgroup", &self.workgroup)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
