//! Credentialed API client combining the transport and envelope interpretation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::envelope::{EnvelopeInterpreter, ExpiryNotice};
use crate::error::ClassifiedError;
use crate::guard::SessionVerifier;
use crate::request::RequestSpec;
use crate::session::SharedSessionStore;
use crate::transport::Transport;

/// Credentialed API client: transport followed by envelope interpretation.
///
/// Every call either yields the envelope payload or a [`ClassifiedError`];
/// callers never see transport and envelope failures separately.
///
/// # Example
///
/// ```no_run
/// use mpconsole_core::{Console, ConsoleConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let console = Console::from_config(ConsoleConfig::default())?;
/// let client = console.client();
///
/// client.login("admin", "secret").await?;
/// let user = client.current_user().await?;
/// println!("signed in as {}", user.username);
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    interpreter: EnvelopeInterpreter,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, interpreter: EnvelopeInterpreter) -> Self {
        Self {
            transport,
            interpreter,
        }
    }

    /// Session store shared with the transport and interpreter.
    pub fn session(&self) -> &SharedSessionStore {
        self.interpreter.session()
    }

    /// Send a request and interpret the response.
    ///
    /// A credentialed call whose response arrives after the session was
    /// cleared (by a concurrent expiry or a logout) fails with
    /// `SessionExpired`, even if the backend reported success.
    pub async fn call(&self, request: RequestSpec) -> Result<Value, ClassifiedError> {
        let notice = if request.notify_expiry() {
            ExpiryNotice::Emit
        } else {
            ExpiryNotice::Suppress
        };

        let raw = self.transport.send(request).await?;
        let authenticated = raw.authenticated;
        let status = raw.status;
        let payload = self.interpreter.interpret_with(raw, notice)?;

        if authenticated && !self.session().is_authenticated() {
            debug!(status, "response arrived after the session ended");
            return Err(ClassifiedError::session_expired(Some(status), None));
        }

        Ok(payload)
    }

    /// Send a request and deserialize the payload.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        request: RequestSpec,
    ) -> Result<T, ClassifiedError> {
        let payload = self.call(request).await?;
        serde_json::from_value(payload).map_err(ClassifiedError::payload)
    }

    /// Send a request whose payload is irrelevant.
    pub async fn call_unit(&self, request: RequestSpec) -> Result<(), ClassifiedError> {
        self.call(request).await.map(|_| ())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("interpreter", &self.interpreter)
            .finish()
    }
}

#[async_trait]
impl SessionVerifier for ApiClient {
    async fn verify_session(&self) -> Result<(), ClassifiedError> {
        self.verify().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::guard::{redirect_channel, CurrentRoute, RedirectReceiver};
    use crate::session::{Credential, MemorySessionStore, SessionStore};
    use crate::transport::{RawResponse, TransportError, TransportErrorKind};
    use serde_json::json;

    /// Transport returning a fixed answer and recording whether the request
    /// carried a credential.
    struct FixedTransport {
        session: SharedSessionStore,
        answer: Result<(u16, Value), TransportError>,
        clear_before_answer: bool,
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn send(&self, _request: RequestSpec) -> Result<RawResponse, TransportError> {
            let authenticated = self.session.is_authenticated();
            if self.clear_before_answer {
                self.session.clear();
            }
            let (status, body) = self.answer.clone()?;
            let mut raw = RawResponse::new(status, body.to_string());
            raw.authenticated = authenticated;
            Ok(raw)
        }
    }

    fn client(
        answer: Result<(u16, Value), TransportError>,
        clear_before_answer: bool,
    ) -> (ApiClient, SharedSessionStore, RedirectReceiver) {
        let session: SharedSessionStore =
            Arc::new(MemorySessionStore::with_credential(Credential::new("T")));
        let (tx, rx) = redirect_channel();
        let interpreter =
            EnvelopeInterpreter::new(session.clone(), tx, CurrentRoute::new("/configs"), "/login");
        let transport = FixedTransport {
            session: session.clone(),
            answer,
            clear_before_answer,
        };
        (ApiClient::new(Arc::new(transport), interpreter), session, rx)
    }

    #[tokio::test]
    async fn test_call_returns_payload() {
        let (client, _, _) = client(Ok((200, json!({"code": 0, "data": [1]}))), false);
        assert_eq!(client.call(RequestSpec::get("/x")).await.unwrap(), json!([1]));
    }

    #[tokio::test]
    async fn test_call_as_reports_payload_mismatch() {
        let (client, _, _) = client(Ok((200, json!({"code": 0, "data": "text"}))), false);
        let err = client
            .call_as::<Vec<u32>>(RequestSpec::get("/x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert!(err.message().starts_with("unexpected response payload"));
    }

    #[tokio::test]
    async fn test_transport_timeout_is_classified() {
        let (client, _, _) = client(
            Err(TransportError::new(TransportErrorKind::Timeout, "no response within 10000 ms")),
            false,
        );
        let err = client.call(RequestSpec::get("/x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.message(), "no response within 10000 ms");
    }

    #[tokio::test]
    async fn test_success_after_session_cleared_is_session_expired() {
        let (client, _, mut rx) = client(Ok((200, json!({"code": 0, "data": 1}))), true);
        let err = client.call(RequestSpec::get("/x")).await.unwrap_err();

        assert!(err.is_session_expired());
        // The expiry was announced by whoever cleared the session, not here.
        assert!(rx.try_next().is_none());
    }

    #[tokio::test]
    async fn test_expiry_notice_suppressed_per_request() {
        let (client, session, mut rx) = client(Ok((200, json!({"code": 401}))), false);
        let err = client
            .call(RequestSpec::get("/x").without_expiry_notice())
            .await
            .unwrap_err();

        assert!(err.is_session_expired());
        assert!(session.get().is_none());
        assert!(rx.try_next().is_none());
    }
}
