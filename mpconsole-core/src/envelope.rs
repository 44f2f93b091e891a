//! Envelope protocol interpretation.
//!
//! Every backend response body is wrapped in an envelope:
//!
//! ```json
//! { "code": 0, "data": { ... }, "message": "success" }
//! ```
//!
//! `code == 0` is success regardless of the HTTP status, `code == 401` means
//! the session has expired, and any other code is an application error. Two
//! backend generations disagree on where the success payload lives, so both
//! `data` and `detail` are accepted.
//!
//! Interpretation is split in two: [`decode`] is a pure function deciding what
//! a response means, and [`EnvelopeInterpreter`] applies the one mandated side
//! effect (clearing the session and announcing a redirect on expiry).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClassifiedError, ErrorKind, ErrorSource};
use crate::guard::{CurrentRoute, NavigationIntent, RedirectSender};
use crate::session::SharedSessionStore;
use crate::transport::RawResponse;

/// Envelope code for success.
pub const CODE_OK: i64 = 0;

/// Envelope code reserved for an expired or invalid session.
pub const CODE_SESSION_EXPIRED: i64 = 401;

/// The backend's response wrapper.
///
/// All fields are optional on the wire. A body without `code` is not a
/// success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl Envelope {
    /// Envelope with just a code.
    pub fn with_code(code: i64) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    /// Parse a body. Empty or non-JSON bodies, and JSON that is not an
    /// object, yield `None`.
    pub fn parse(body: &[u8]) -> Option<Self> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return None;
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(CODE_OK)
    }

    pub fn is_session_expired(&self) -> bool {
        self.code == Some(CODE_SESSION_EXPIRED)
    }

    /// Success payload: `data`, else `detail`, else `null`.
    pub fn into_payload(self) -> Value {
        self.data.or(self.detail).unwrap_or(Value::Null)
    }
}

/// Knobs for [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodePolicy {
    /// Treat an HTTP 401 answer to a credentialed request as session expiry.
    pub http_401_expires_session: bool,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        Self {
            http_401_expires_session: true,
        }
    }
}

/// What a response means, before any side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Logical success with its payload.
    Success(Value),
    /// The session is no longer valid.
    SessionExpired {
        status: u16,
        envelope: Option<Envelope>,
    },
    /// Any other failure.
    Failure {
        kind: ErrorKind,
        status: u16,
        source: ErrorSource,
    },
}

/// Decide what a raw response means.
pub fn decode(raw: &RawResponse, policy: DecodePolicy) -> Decoded {
    let envelope = Envelope::parse(&raw.body);

    if !raw.is_success() {
        if raw.status == 401 && raw.authenticated && policy.http_401_expires_session {
            return Decoded::SessionExpired {
                status: raw.status,
                envelope,
            };
        }
        return match envelope {
            Some(envelope) => Decoded::Failure {
                kind: ErrorKind::Application,
                status: raw.status,
                source: ErrorSource::Envelope(envelope),
            },
            None => Decoded::Failure {
                kind: ErrorKind::Network,
                status: raw.status,
                source: ErrorSource::NoEnvelope,
            },
        };
    }

    match envelope {
        Some(envelope) if envelope.is_success() => Decoded::Success(envelope.into_payload()),
        Some(envelope) if envelope.is_session_expired() => Decoded::SessionExpired {
            status: raw.status,
            envelope: Some(envelope),
        },
        Some(envelope) => Decoded::Failure {
            kind: ErrorKind::Application,
            status: raw.status,
            source: ErrorSource::Envelope(envelope),
        },
        None => Decoded::Failure {
            kind: ErrorKind::Application,
            status: raw.status,
            source: ErrorSource::NoEnvelope,
        },
    }
}

/// Whether a session expiry detected on a call is announced to the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryNotice {
    Emit,
    Suppress,
}

/// Applies [`decode`] and the session-expiry side effect.
///
/// Stateless across calls: every response is interpreted on its own.
#[derive(Clone)]
pub struct EnvelopeInterpreter {
    session: SharedSessionStore,
    redirects: RedirectSender,
    location: CurrentRoute,
    login_route: String,
    policy: DecodePolicy,
}

impl EnvelopeInterpreter {
    pub fn new(
        session: SharedSessionStore,
        redirects: RedirectSender,
        location: CurrentRoute,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            session,
            redirects,
            location,
            login_route: login_route.into(),
            policy: DecodePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn session(&self) -> &SharedSessionStore {
        &self.session
    }

    /// Interpret a response, announcing any session expiry.
    pub fn interpret(&self, raw: RawResponse) -> Result<Value, ClassifiedError> {
        self.interpret_with(raw, ExpiryNotice::Emit)
    }

    /// Interpret a response with explicit control over the expiry notice.
    pub fn interpret_with(
        &self,
        raw: RawResponse,
        notice: ExpiryNotice,
    ) -> Result<Value, ClassifiedError> {
        match decode(&raw, self.policy) {
            Decoded::Success(payload) => Ok(payload),
            Decoded::SessionExpired { status, envelope } => {
                self.expire_session(notice);
                Err(ClassifiedError::session_expired(
                    Some(status),
                    envelope.map(ErrorSource::Envelope),
                ))
            }
            Decoded::Failure {
                kind,
                status,
                source,
            } => {
                let error = ClassifiedError::new(kind, Some(status), source);
                debug!(status, kind = %error.kind(), message = error.message(), "request failed");
                Err(error)
            }
        }
    }

    fn expire_session(&self, notice: ExpiryNotice) {
        warn!("Session expired, clearing stored credential");
        self.session.clear();

        if notice == ExpiryNotice::Emit {
            let intent = NavigationIntent::session_expired(&self.login_route, self.location.get());
            self.redirects.emit(intent);
        }
    }
}

impl std::fmt::Debug for EnvelopeInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeInterpreter")
            .field("login_route", &self.login_route)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: Value) -> RawResponse {
        RawResponse::new(200, body.to_string())
    }

    #[test]
    fn test_decode_success_prefers_data() {
        let decoded = decode(
            &ok(json!({"code": 0, "data": {"a": 1}, "detail": {"b": 2}})),
            DecodePolicy::default(),
        );
        assert_eq!(decoded, Decoded::Success(json!({"a": 1})));
    }

    #[test]
    fn test_decode_success_falls_back_to_detail() {
        let decoded = decode(&ok(json!({"code": 0, "detail": [1, 2]})), DecodePolicy::default());
        assert_eq!(decoded, Decoded::Success(json!([1, 2])));
    }

    #[test]
    fn test_decode_success_null_data_falls_back_to_detail() {
        let decoded = decode(
            &ok(json!({"code": 0, "data": null, "detail": "x"})),
            DecodePolicy::default(),
        );
        assert_eq!(decoded, Decoded::Success(json!("x")));
    }

    #[test]
    fn test_decode_success_without_payload_is_null() {
        let decoded = decode(&ok(json!({"code": 0})), DecodePolicy::default());
        assert_eq!(decoded, Decoded::Success(Value::Null));
    }

    #[test]
    fn test_decode_envelope_401_under_http_200() {
        let decoded = decode(&ok(json!({"code": 401})), DecodePolicy::default());
        assert!(matches!(decoded, Decoded::SessionExpired { status: 200, .. }));
    }

    #[test]
    fn test_decode_nonzero_code_is_application_error() {
        let decoded = decode(
            &ok(json!({"code": 500, "message": "boom"})),
            DecodePolicy::default(),
        );
        assert!(matches!(
            decoded,
            Decoded::Failure {
                kind: ErrorKind::Application,
                status: 200,
                source: ErrorSource::Envelope(_)
            }
        ));
    }

    #[test]
    fn test_decode_missing_code_is_failure() {
        let decoded = decode(&ok(json!({"data": {"a": 1}})), DecodePolicy::default());
        assert!(matches!(
            decoded,
            Decoded::Failure {
                kind: ErrorKind::Application,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_http_failure_without_body_is_network() {
        let decoded = decode(&RawResponse::new(502, ""), DecodePolicy::default());
        assert_eq!(
            decoded,
            Decoded::Failure {
                kind: ErrorKind::Network,
                status: 502,
                source: ErrorSource::NoEnvelope,
            }
        );
    }

    #[test]
    fn test_decode_http_failure_with_html_body_is_network() {
        let decoded = decode(
            &RawResponse::new(504, "<html>Gateway Timeout</html>"),
            DecodePolicy::default(),
        );
        assert!(matches!(
            decoded,
            Decoded::Failure {
                kind: ErrorKind::Network,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_http_failure_with_body_is_application() {
        let decoded = decode(
            &RawResponse::new(400, json!({"detail": "bad input"}).to_string()),
            DecodePolicy::default(),
        );
        assert!(matches!(
            decoded,
            Decoded::Failure {
                kind: ErrorKind::Application,
                status: 400,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_http_401_on_credentialed_request() {
        let raw = RawResponse::new(401, json!({"detail": "Could not validate credentials"}).to_string())
            .authenticated();
        assert!(matches!(
            decode(&raw, DecodePolicy::default()),
            Decoded::SessionExpired { status: 401, .. }
        ));
    }

    #[test]
    fn test_decode_http_401_on_anonymous_request_is_application() {
        let raw = RawResponse::new(
            401,
            json!({"detail": {"code": 40101, "message": "wrong password"}}).to_string(),
        );
        assert!(matches!(
            decode(&raw, DecodePolicy::default()),
            Decoded::Failure {
                kind: ErrorKind::Application,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_http_401_policy_off() {
        let raw = RawResponse::new(401, "").authenticated();
        let policy = DecodePolicy {
            http_401_expires_session: false,
        };
        assert!(matches!(
            decode(&raw, policy),
            Decoded::Failure {
                kind: ErrorKind::Network,
                ..
            }
        ));
    }

    #[test]
    fn test_envelope_parse_rejects_non_objects() {
        assert!(Envelope::parse(b"").is_none());
        assert!(Envelope::parse(b"   ").is_none());
        assert!(Envelope::parse(b"[1,2]").is_none());
        assert!(Envelope::parse(b"\"text\"").is_none());
        assert!(Envelope::parse(b"{\"code\": \"zero\"}").is_none());
        assert!(Envelope::parse(b"{}").is_some());
    }
}
