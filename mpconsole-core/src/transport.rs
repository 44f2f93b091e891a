//! Byte-level HTTP boundary.
//!
//! The transport runs a request through its pre-dispatch stages, sends it and
//! hands back the status and body untouched. It never retries and never looks
//! inside the body. The only failures it reports are the ones where no
//! response arrived at all.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, trace};

use crate::request::{Body, Method, RequestSpec};
use crate::session::SharedSessionStore;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Why a request produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS failure, refused connection, TLS failure and the like.
    Connect,
    /// The request deadline passed.
    Timeout,
    /// The response started but its body could not be read.
    Aborted,
    /// The request could not be built (bad URL, bad header).
    InvalidRequest,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connect => "connection failed",
            Self::Timeout => "timed out",
            Self::Aborted => "aborted",
            Self::InvalidRequest => "invalid request",
        };
        f.write_str(name)
    }
}

/// A request that never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            format!("no response within {} ms", after.as_millis()),
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_builder() {
            TransportErrorKind::InvalidRequest
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Aborted
        } else {
            TransportErrorKind::Connect
        };
        Self::new(kind, e.to_string())
    }
}

/// What came back over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body bytes, possibly empty.
    pub body: Vec<u8>,
    /// Whether the request carried an `Authorization` header.
    pub authenticated: bool,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            authenticated: false,
        }
    }

    /// Mark the response as belonging to a credentialed request.
    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A pure pre-dispatch transformation of a request.
pub type RequestStage = Arc<dyn Fn(RequestSpec) -> RequestSpec + Send + Sync>;

/// Stage attaching `Authorization: Bearer <token>` when the session holds a
/// credential.
///
/// A per-call `Authorization` override already present on the request is
/// left alone. Anonymous requests never get the credential.
pub fn attach_credential(session: SharedSessionStore) -> RequestStage {
    Arc::new(move |spec: RequestSpec| {
        if spec.is_anonymous() || spec.header_value("Authorization").is_some() {
            return spec;
        }
        match session.get() {
            Some(credential) => spec.header("Authorization", credential.bearer_header()),
            None => spec,
        }
    })
}

/// Run a request through stages in order.
pub fn apply_stages(stages: &[RequestStage], spec: RequestSpec) -> RequestSpec {
    stages.iter().fold(spec, |spec, stage| stage(spec))
}

/// Sends a request and returns whatever came back.
///
/// Implemented by [`HttpTransport`] and by scripted doubles in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestSpec) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport with a fixed timeout and pre-dispatch stages.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    stages: Vec<RequestStage>,
}

impl HttpTransport {
    /// Create a transport for `base_url` whose only stage attaches the
    /// session credential.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SharedSessionStore,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            stages: vec![attach_credential(session)],
        })
    }

    /// Append a pre-dispatch stage. Stages run in insertion order.
    pub fn with_stage(mut self, stage: RequestStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url_for(&self, path: &str) -> Result<url::Url, TransportError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        url::Url::parse(&joined).map_err(|e| {
            TransportError::new(
                TransportErrorKind::InvalidRequest,
                format!("invalid URL {}: {}", joined, e),
            )
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("stages", &self.stages.len())
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RequestSpec) -> Result<RawResponse, TransportError> {
        let request = apply_stages(&self.stages, request);
        let url = self.url_for(request.path())?;
        let authenticated = request.header_value("Authorization").is_some();

        debug!(
            method = %request.method(),
            path = request.path(),
            authenticated,
            "dispatching request"
        );

        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        builder = match request.body() {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Form(fields) => builder.form(fields),
        };
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        trace!(status, bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            body,
            authenticated,
        })
    }
}
