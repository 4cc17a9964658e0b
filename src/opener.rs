use super::{
    configure, open_session, parse, ConnectionIdentity, Connector, Error, OpenMode, RemoteFileOf,
    SftpStream, TransportCache, TransportParams,
};

use std::fmt;
use std::sync::Arc;

/// Open the remote file named by `uri`.
///
/// `uri` has the form `ssh://[user[:password]@]host[:port]/remote/path`
/// (`scp://` and `sftp://` are accepted too) and `mode` is one of `"r"`,
/// `"rb"`, `"w"`, `"wb"`, `"a"` or `"ab"`.
///
/// The transport is taken from `cache` if one exists for the identity,
/// otherwise it is established through `connector` and cached.
///
/// # Errors
///
/// Fails without returning a stream if any step fails:
///  - [`Error::MalformedUri`], [`Error::UnsupportedScheme`] or
///    [`Error::InvalidMode`] before anything is contacted,
///  - [`Error::Authentication`] or [`Error::Connection`] if the transport
///    cannot be established, in which case nothing is cached,
///  - [`Error::RemoteFile`] if the file cannot be opened, in which case the
///    transport stays cached.
pub async fn open<C>(
    cache: &TransportCache<C::Transport>,
    connector: &C,
    uri: &str,
    mode: &str,
    params: &TransportParams,
) -> Result<SftpStream<RemoteFileOf<C>>, Error>
where
    C: Connector,
{
    let mode: OpenMode = mode.parse()?;
    let parsed = parse(uri)?;

    let transport = cache
        .get_or_create(
            connector,
            ConnectionIdentity::from(parsed.credentials),
            params.get_connect_kwargs(),
        )
        .await?;

    let file = open_session(&*transport, &parsed.path, mode).await?;

    Ok(configure(file, mode, params).with_transport(transport))
}

/// A [`Connector`] paired with the [`TransportCache`] its transports are
/// kept in.
pub struct SftpOpener<C: Connector> {
    connector: C,
    cache: Arc<TransportCache<C::Transport>>,
}

impl<C: Connector + fmt::Debug> fmt::Debug for SftpOpener<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpOpener")
            .field("connector", &self.connector)
            .field("cache", &self.cache)
            .finish()
    }
}

impl<C: Connector> SftpOpener<C> {
    /// Create an opener with a fresh cache.
    pub fn new(connector: C) -> Self {
        Self::with_cache(connector, Arc::default())
    }

    /// Create an opener sharing `cache` with others.
    pub fn with_cache(connector: C, cache: Arc<TransportCache<C::Transport>>) -> Self {
        Self { connector, cache }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn cache(&self) -> &Arc<TransportCache<C::Transport>> {
        &self.cache
    }

    /// See [`open`].
    pub async fn open(
        &self,
        uri: &str,
        mode: &str,
        params: &TransportParams,
    ) -> Result<SftpStream<RemoteFileOf<C>>, Error> {
        open(&*self.cache, &self.connector, uri, mode, params).await
    }
}
