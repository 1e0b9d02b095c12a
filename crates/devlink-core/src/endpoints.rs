//! Endpoint resolution.
//!
//! Every URL the link talks to is derived from a single root: the device's
//! page location, or the origin named by its `host` query parameter.

use std::fmt;

use url::{Position, Url};

use crate::error::LinkError;

/// The four endpoints of a device, resolved against one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    auth: Url,
    config: Url,
    upgrade: Url,
    socket: Url,
}

impl EndpointSet {
    /// Resolve the endpoint set for `root`.
    ///
    /// `auth`, `config` and `upgrade` keep the root's scheme. The socket
    /// endpoint is `wss` for `https` roots and `ws` for everything else.
    pub fn resolve(root: &Url) -> Result<Self, LinkError> {
        if root.cannot_be_a_base() {
            return Err(LinkError::InvalidRoot(root.to_string()));
        }

        let socket_scheme = if root.scheme() == "https" { "wss" } else { "ws" };

        Ok(Self {
            auth: resolve_path(root, "auth", root.scheme())?,
            config: resolve_path(root, "config", root.scheme())?,
            upgrade: resolve_path(root, "upgrade", root.scheme())?,
            socket: resolve_path(root, "ws", socket_scheme)?,
        })
    }

    /// Handshake endpoint.
    pub fn auth(&self) -> &Url {
        &self.auth
    }

    /// Settings download endpoint.
    pub fn config(&self) -> &Url {
        &self.config
    }

    /// Firmware upload endpoint.
    pub fn upgrade(&self) -> &Url {
        &self.upgrade
    }

    /// Session socket endpoint.
    pub fn socket(&self) -> &Url {
        &self.socket
    }
}

impl fmt::Display for EndpointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "auth:    {}", self.auth)?;
        writeln!(f, "config:  {}", self.config)?;
        writeln!(f, "upgrade: {}", self.upgrade)?;
        write!(f, "socket:  {}", self.socket)
    }
}

fn resolve_path(root: &Url, path: &str, scheme: &str) -> Result<Url, LinkError> {
    let joined = root.join(path)?;
    with_scheme(joined, scheme)
}

/// Replace the scheme of `url`.
///
/// `Url::set_scheme` refuses to move between special and non-special
/// schemes, so fall back to rewriting the serialization in that case. The
/// rewrite must keep host, port and path; otherwise the URL has no
/// equivalent under `scheme`.
fn with_scheme(mut url: Url, scheme: &str) -> Result<Url, LinkError> {
    if url.scheme() == scheme || url.set_scheme(scheme).is_ok() {
        return Ok(url);
    }

    let rewritten = format!("{}{}", scheme, &url[Position::AfterScheme..]);
    match Url::parse(&rewritten) {
        Ok(candidate)
            if candidate.host_str().filter(|h| !h.is_empty()).is_some()
                && candidate.host_str() == url.host_str()
                && candidate.port_or_known_default() == url.port_or_known_default()
                && candidate.path() == url.path() =>
        {
            Ok(candidate)
        }
        _ => Err(LinkError::InvalidRoot(format!(
            "{} has no {} equivalent",
            url, scheme
        ))),
    }
}

/// Pick the session root for a page `location`.
///
/// A non-empty `host` query parameter overrides the location. Values that
/// do not start with `http:` or `https:` are taken as plain HTTP hosts.
pub fn resolve_root(location: &Url) -> Result<Url, LinkError> {
    let host = location
        .query_pairs()
        .find(|(key, _)| key == "host")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    match host {
        Some(host) if host.starts_with("http:") || host.starts_with("https:") => {
            Ok(Url::parse(&host)?)
        }
        Some(host) => Ok(Url::parse(&format!("http://{}", host))?),
        None => Ok(location.clone()),
    }
}
