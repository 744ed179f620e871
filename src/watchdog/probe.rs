//! HTTP health probe.
//!
//! # Responsibilities
//! - Send one `GET` to the configured target per call
//! - Bound the exchange by the probe timeout
//! - Classify the result: exactly 200 is success, everything else is failure
//!
//! # Design Decisions
//! - A fresh connection per probe (`Connection: close`), nothing pooled
//! - No retries here; retry policy belongs to the watch loop
//! - The whole exchange, connect included, lives inside the timeout future so
//!   nothing outlives a timed-out probe

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::header::{HeaderValue, AUTHORIZATION, CONNECTION, HOST, USER_AGENT};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time;

use crate::watchdog::error::ProbeError;
use crate::watchdog::target::{EndpointTarget, Transport};

const PROBE_USER_AGENT: &str = concat!("healthchecker/", env!("CARGO_PKG_VERSION"));

/// Result of a single probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    Success,
    Failure(ProbeError),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

/// Something the watch loop can probe once per tick.
pub trait Probe: Send + Sync {
    fn probe(&self) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Probe that issues an HTTP `GET` against an [`EndpointTarget`].
#[derive(Debug, Clone)]
pub struct HttpProbe {
    target: EndpointTarget,
    timeout: Duration,
    authorization: Option<HeaderValue>,
}

impl HttpProbe {
    pub fn new(target: EndpointTarget, timeout: Duration) -> Self {
        let authorization = target.credentials().and_then(|creds| {
            let token = STANDARD.encode(format!("{}:{}", creds.user, creds.password));
            HeaderValue::from_str(&format!("Basic {}", token)).ok()
        });

        Self {
            target,
            timeout,
            authorization,
        }
    }

    pub fn target(&self) -> &EndpointTarget {
        &self.target
    }

    /// Probe the endpoint once.
    pub async fn hit_endpoint(&self) -> ProbeOutcome {
        match time::timeout(self.timeout, self.exchange()).await {
            Ok(Ok(status)) if status == StatusCode::OK => ProbeOutcome::Success,
            Ok(Ok(status)) => ProbeOutcome::Failure(ProbeError::Status(status)),
            Ok(Err(e)) => ProbeOutcome::Failure(e),
            Err(_) => ProbeOutcome::Failure(ProbeError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self) -> Result<StatusCode, ProbeError> {
        let request = self.build_request()?;

        match self.target.transport() {
            Transport::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(ProbeError::Connect)?;
                send_request(stream, request).await
            }
            #[cfg(unix)]
            Transport::Unix(socket) => {
                let stream = tokio::net::UnixStream::connect(socket)
                    .await
                    .map_err(ProbeError::Connect)?;
                send_request(stream, request).await
            }
            #[cfg(not(unix))]
            Transport::Unix(_) => Err(ProbeError::Connect(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix sockets are not supported on this platform",
            ))),
        }
    }

    fn build_request(&self) -> Result<Request<Empty<Bytes>>, ProbeError> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(self.target.path())
            .header(HOST, self.target.authority())
            .header(USER_AGENT, PROBE_USER_AGENT)
            .header(CONNECTION, "close");

        if let Some(authorization) = &self.authorization {
            builder = builder.header(AUTHORIZATION, authorization.clone());
        }

        Ok(builder.body(Empty::new())?)
    }
}

impl Probe for HttpProbe {
    fn probe(&self) -> impl Future<Output = ProbeOutcome> + Send {
        self.hit_endpoint()
    }
}

/// Run one HTTP/1.1 exchange over an established stream and return the status.
async fn send_request<S>(stream: S, request: Request<Empty<Bytes>>) -> Result<StatusCode, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    let response = sender.send_request(request);
    tokio::pin!(conn);
    tokio::pin!(response);

    tokio::select! {
        biased;
        response = &mut response => return Ok(response?.status()),
        closed = &mut conn => closed?,
    }

    // With `Connection: close` the connection can finish in the same poll that
    // hands over the response; it is already queued on the response future.
    Ok(response.await?.status())
}
