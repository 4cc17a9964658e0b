use super::Credentials;

use std::collections::BTreeMap;
use std::fmt;

/// Overrides applied on top of the credentials parsed from the uri when
/// connecting.
///
/// Every field set here takes precedence over the uri. Settings added with
/// [`ConnectKwargs::set`] are handed verbatim to the [`Connector`] in
/// [`ConnectParams::extra`].
///
/// [`Connector`]: crate::Connector
#[derive(Default, Clone, PartialEq, Eq)]
pub struct ConnectKwargs {
    username: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    extra: BTreeMap<String, String>,
}

impl ConnectKwargs {
    /// Create a new [`ConnectKwargs`] that overrides nothing.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Add a transport specific setting, e.g. `key_filename`.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get_username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn get_password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn get_host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn get_port(&self) -> Option<u16> {
        self.port
    }

    pub fn get_extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Merge the overrides into `credentials`.
    pub(crate) fn apply(&self, credentials: Credentials) -> Credentials {
        Credentials {
            host: self.host.clone().unwrap_or(credentials.host),
            port: self.port.unwrap_or(credentials.port),
            username: self.username.clone().or(credentials.username),
            password: self.password.clone().or(credentials.password),
        }
    }
}

impl fmt::Debug for ConnectKwargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectKwargs")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Caller supplied options for [`open`](crate::open).
#[derive(Debug, Clone, Default)]
pub struct TransportParams {
    connect_kwargs: ConnectKwargs,
    write_pipelining: Option<bool>,
}

impl TransportParams {
    /// Create a new [`TransportParams`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the credential overrides and extra connect settings.
    #[must_use]
    pub fn connect_kwargs(mut self, connect_kwargs: ConnectKwargs) -> Self {
        self.connect_kwargs = connect_kwargs;
        self
    }

    /// Enable or disable pipelined writes.
    ///
    /// Pipelining lets a write be sent before the previous one is
    /// acknowledged, deferring error reporting to a later write or to
    /// the final flush. It is never enabled for files opened for reading.
    ///
    /// Default is `true`.
    #[must_use]
    pub fn write_pipelining(mut self, write_pipelining: bool) -> Self {
        self.write_pipelining = Some(write_pipelining);
        self
    }

    pub fn get_connect_kwargs(&self) -> &ConnectKwargs {
        &self.connect_kwargs
    }

    pub const fn get_write_pipelining(&self) -> bool {
        match self.write_pipelining {
            Some(write_pipelining) => write_pipelining,
            None => true,
        }
    }
}

/// Everything a [`Connector`](crate::Connector) needs to establish and
/// authenticate a transport.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Settings from [`ConnectKwargs::set`], passed through untouched.
    pub extra: BTreeMap<String, String>,
}

impl ConnectParams {
    pub(crate) fn new(credentials: Credentials, kwargs: &ConnectKwargs) -> Self {
        let Credentials {
            host,
            port,
            username,
            password,
        } = kwargs.apply(credentials);

        Self {
            host,
            port,
            username,
            password,
            extra: kwargs.extra.clone(),
        }
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("extra", &self.extra)
            .finish()
    }
}
