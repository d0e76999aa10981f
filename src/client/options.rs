/// Options applied to every SMB context before it gets initialized.
///
/// Unset options keep the engine's defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SmbOptions {
    pub(crate) debug_level: Option<u8>,
    pub(crate) one_share_per_server: Option<bool>,
    pub(crate) case_sensitive: Option<bool>,
    pub(crate) use_kerberos: Option<bool>,
    pub(crate) fallback_after_kerberos: Option<bool>,
    pub(crate) no_auto_anonymous_login: Option<bool>,
}

impl SmbOptions {
    /// Set the engine debug level (0 to 10)
    pub fn debug_level(mut self, level: u8) -> Self {
        self.debug_level = Some(level.min(10));
        self
    }

    /// Use a single connection per server, switching share on demand
    pub fn one_share_per_server(mut self, value: bool) -> Self {
        self.one_share_per_server = Some(value);
        self
    }

    /// Treat paths as case sensitive
    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = Some(value);
        self
    }

    /// Authenticate with kerberos
    pub fn use_kerberos(mut self, value: bool) -> Self {
        self.use_kerberos = Some(value);
        self
    }

    /// Fall back to NTLM if kerberos authentication fails
    pub fn fallback_after_kerberos(mut self, value: bool) -> Self {
        self.fallback_after_kerberos = Some(value);
        self
    }

    /// Don't retry anonymously when authentication fails
    pub fn no_auto_anonymous_login(mut self, value: bool) -> Self {
        self.no_auto_anonymous_login = Some(value);
        self
    }
}
