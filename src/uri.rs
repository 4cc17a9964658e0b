use super::Error;

use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;
use url::{Host, Url};

/// Port used when the uri does not carry one.
pub const DEFAULT_PORT: u16 = 22;

/// Uri schemes served by this crate.
pub const SCHEMES: [&str; 3] = ["ssh", "scp", "sftp"];

/// Connection details extracted from a uri.
///
/// `username` and `password` are percent-decoded. An absent segment is
/// `None`; an empty one written out in the uri (`user:@host`) is an empty
/// string.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    /// One of [`SCHEMES`].
    pub scheme: String,
    pub credentials: Credentials,
    /// Percent-decoded remote path, passed to the sftp server untouched.
    pub path: String,
}

/// Parse `scheme://[user[:password]@]host[:port]/path`.
///
/// # Errors
///
/// [`Error::UnsupportedScheme`] if the scheme is not one of [`SCHEMES`],
/// [`Error::MalformedUri`] if the authority cannot be split into a valid
/// host and port or a component is not valid percent-encoded utf-8.
pub fn parse(uri: &str) -> Result<ParsedUri, Error> {
    let url = Url::parse(uri).map_err(|err| Error::MalformedUri(err.to_string()))?;

    let scheme = url.scheme();
    if !SCHEMES.contains(&scheme) {
        return Err(Error::UnsupportedScheme(scheme.to_owned()));
    }

    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => {
            decode(domain, "host")?.to_ascii_lowercase()
        }
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(Error::MalformedUri("missing host".into())),
    };

    // `Url` reports an empty password as missing, the raw userinfo keeps
    // `user:@host` apart from `user@host`.
    let has_password = userinfo(uri).map_or(false, |userinfo| userinfo.contains(':'));

    let username = match url.username() {
        "" if !has_password => None,
        username => Some(decode(username, "username")?.into_owned()),
    };

    let password = match url.password() {
        Some(password) => Some(decode(password, "password")?.into_owned()),
        None if has_password => Some(String::new()),
        None => None,
    };

    Ok(ParsedUri {
        scheme: scheme.to_owned(),
        credentials: Credentials {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            username,
            password,
        },
        path: decode(url.path(), "path")?.into_owned(),
    })
}

/// The `user[:password]` part of the authority of `uri`, if there is one.
fn userinfo(uri: &str) -> Option<&str> {
    let (_, rest) = uri.split_once("://")?;
    let authority = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .map_or(rest, |end| &rest[..end]);
    authority.rfind('@').map(|at| &authority[..at])
}

fn decode<'a>(input: &'a str, component: &str) -> Result<Cow<'a, str>, Error> {
    percent_decode_str(input).decode_utf8().map_err(|_| {
        Error::MalformedUri(format!(
            "{component} is not valid utf-8 after percent-decoding"
        ))
    })
}
