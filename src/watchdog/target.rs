//! Probe destination.
//!
//! # Responsibilities
//! - Describe where the probe connects (TCP address or Unix socket)
//! - Describe what the probe asks for (path, Host header, credentials)
//!
//! # Design Decisions
//! - Built once, never mutated
//! - A host starting with the `unix` marker is a socket path; the scheme and
//!   Host header are then cosmetic

use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use url::{Host, Url};

use crate::watchdog::error::WatchdogError;

/// Host prefix selecting Unix-domain-socket transport.
pub const UNIX_SOCKET_MARKER: &str = "unix";

/// Host header sent when probing over a Unix socket.
const UNIX_SOCKET_AUTHORITY: &str = "localhost";

/// How the probe reaches the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Plain TCP connection to `host:port`.
    Tcp { host: String, port: u16 },
    /// Connection to a Unix-domain socket.
    Unix(PathBuf),
}

/// Basic-auth credentials attached to every probe.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An immutable probe destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
    transport: Transport,
    path: String,
    credentials: Option<Credentials>,
}

impl EndpointTarget {
    /// Parse a target from a URL string such as `http://127.0.0.1:8080/healthz`.
    pub fn parse(input: &str) -> Result<Self, WatchdogError> {
        let url = Url::parse(input)?;
        Self::from_url(&url)
    }

    /// Build a target from an already parsed URL.
    pub fn from_url(url: &Url) -> Result<Self, WatchdogError> {
        if url.scheme() != "http" {
            return Err(WatchdogError::InvalidTarget(format!(
                "unsupported scheme '{}' (only http is supported)",
                url.scheme()
            )));
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => {
                return Err(WatchdogError::InvalidTarget(format!(
                    "missing host in '{}'",
                    url
                )))
            }
        };
        let port = url.port_or_known_default().unwrap_or(80);

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        let credentials = (!url.username().is_empty()).then(|| Credentials {
            user: url.username().to_string(),
            password: url.password().unwrap_or_default().to_string(),
        });

        Self::from_parts(&host, port, &path, credentials)
    }

    /// Build a target from its individual parts.
    ///
    /// A `host` beginning with [`UNIX_SOCKET_MARKER`] followed by an absolute
    /// path (`unix/var/run/app.sock`) selects the Unix socket transport and the
    /// port is ignored. The marker alone is not enough: hosts such as
    /// `unixbox.internal` or `unix` stay on TCP.
    pub fn from_parts(
        host: &str,
        port: u16,
        path: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, WatchdogError> {
        let transport = match host.strip_prefix(UNIX_SOCKET_MARKER) {
            Some(socket) if socket.starts_with('/') => Transport::Unix(PathBuf::from(socket)),
            _ => {
                let host = host.trim_start_matches('[').trim_end_matches(']');
                if host.is_empty() {
                    return Err(WatchdogError::InvalidTarget("empty host".into()));
                }
                if port == 0 {
                    return Err(WatchdogError::InvalidTarget(format!(
                        "port 0 is not a valid port for host '{}'",
                        host
                    )));
                }
                Transport::Tcp {
                    host: host.to_string(),
                    port,
                }
            }
        };

        let path = match path {
            "" => "/".to_string(),
            p if p.starts_with('/') => p.to_string(),
            p => {
                return Err(WatchdogError::InvalidTarget(format!(
                    "path '{}' must start with '/'",
                    p
                )))
            }
        };

        Ok(Self {
            transport,
            path,
            credentials,
        })
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Request path (and query) sent on the request line.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Socket path when probing over a Unix socket.
    pub fn socket_path(&self) -> Option<&Path> {
        match &self.transport {
            Transport::Unix(path) => Some(path),
            Transport::Tcp { .. } => None,
        }
    }

    /// Value of the Host header.
    pub fn authority(&self) -> String {
        match &self.transport {
            Transport::Tcp { host, port } => {
                let host = match host.parse::<IpAddr>() {
                    Ok(IpAddr::V6(_)) => format!("[{}]", host),
                    _ => host.clone(),
                };
                if *port == 80 {
                    host
                } else {
                    format!("{}:{}", host, port)
                }
            }
            Transport::Unix(_) => UNIX_SOCKET_AUTHORITY.to_string(),
        }
    }
}

impl fmt::Display for EndpointTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.transport {
            Transport::Tcp { .. } => write!(f, "http://{}{}", self.authority(), self.path),
            Transport::Unix(socket) => write!(f, "http+unix://{}:{}", socket.display(), self.path),
        }
    }
}
