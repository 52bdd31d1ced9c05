//! The single path every backend call takes.
//!
//! # Design
//! `Dispatcher` reads the token from the `SessionStore` it was handed,
//! attaches it as a bearer credential, executes the request exactly once and
//! classifies the outcome. It never modifies the session: reacting to an
//! `ApiError::Auth` (clearing the session, asking for a new login) is the
//! caller's decision.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ApiError, ErrorDetail};
use crate::http::{HttpRequest, HttpResponse, RequestScope};
use crate::session::SessionStore;
use crate::transport::{Transport, TransportError};

pub const AUTHORIZATION: &str = "authorization";

/// Sort a response into success or an `ApiError`.
///
/// 2xx passes through unchanged. 401/403 become `Auth` only when the request
/// needed a session; on credential endpoints they are ordinary `Client`
/// rejections.
pub fn classify(scope: RequestScope, response: HttpResponse) -> Result<HttpResponse, ApiError> {
    let status = response.status;
    match status {
        200..=299 => Ok(response),
        401 | 403 if scope == RequestScope::Resource => Err(ApiError::Auth {
            status,
            detail: ErrorDetail::from_body(&response.body),
        }),
        404 => Err(ApiError::NotFound),
        400..=499 => Err(ApiError::Client {
            status,
            detail: ErrorDetail::from_body(&response.body),
        }),
        500..=599 => Err(ApiError::Server {
            status,
            detail: ErrorDetail::from_body(&response.body),
        }),
        _ => Err(ApiError::UnexpectedStatus {
            status,
            body: response.body,
        }),
    }
}

/// Issues authenticated requests through a `Transport`.
///
/// Cheap to clone; clones share the transport and the session.
#[derive(Debug)]
pub struct Dispatcher<T> {
    transport: Arc<T>,
    session: SessionStore,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            session: self.session.clone(),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, session: SessionStore) -> Self {
        Self {
            transport: Arc::new(transport),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attach `Authorization: Bearer <token>` when a token is stored.
    /// Without a token the header is left out entirely.
    pub fn authorize(&self, mut request: HttpRequest) -> HttpRequest {
        request
            .headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION));
        match self.session.token() {
            Some(token) => {
                debug!(method = %request.method, path = %request.path, "attaching bearer token");
                request
                    .headers
                    .push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
            }
            None => {
                debug!(method = %request.method, path = %request.path, "no token stored; sending unauthenticated");
            }
        }
        request
    }

    /// Authorize, execute once, classify.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let scope = request.scope;
        let method = request.method;
        let path = request.path.clone();
        let request = self.authorize(request);

        let response = self.transport.execute(request).await.map_err(|e| {
            warn!(%method, %path, error = %e, "request failed before a response arrived");
            match e {
                TransportError::Unreachable { .. } => ApiError::Network(e.to_string()),
                TransportError::InvalidRequest(reason) => ApiError::Serialization(reason),
            }
        })?;

        debug!(%method, %path, status = response.status, "response classified");
        classify(scope, response).inspect_err(|e| {
            if e.requires_login() {
                warn!(%method, %path, "session rejected by server; token may be invalid or expired");
            } else {
                warn!(%method, %path, error = %e, "request failed");
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording transport shared by unit tests.

    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct FakeTransport {
        pub sent: Mutex<Vec<HttpRequest>>,
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    }

    impl FakeTransport {
        pub fn reply(self, status: u16, body: &str) -> Self {
            self.replies.lock().push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
            self
        }

        pub fn fail(self) -> Self {
            self.replies.lock().push_back(Err(TransportError::Unreachable {
                url: "http://localhost".to_string(),
                reason: "connection refused".to_string(),
            }));
            self
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().len()
        }

        pub fn last_sent(&self) -> Option<HttpRequest> {
            self.sent.lock().last().cloned()
        }
    }

    impl Transport for FakeTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.lock().push(request);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("FakeTransport has no reply queued"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;
    use crate::http::HttpMethod;
    use crate::types::UserProfile;

    fn request(scope: RequestScope) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: "http://localhost:5000/api/contacts/1".to_string(),
            headers: Vec::new(),
            body: None,
            scope,
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn profile() -> UserProfile {
        serde_json::from_str(r#"{"first_name":"Ann","last_name":"Lee","email":"ann@example.com"}"#)
            .unwrap()
    }

    #[test]
    fn authorize_attaches_bearer_when_token_present() {
        let session = SessionStore::in_memory();
        session.save("abc123", &profile()).unwrap();
        let dispatcher = Dispatcher::new(FakeTransport::default(), session);

        let req = dispatcher.authorize(request(RequestScope::Resource));
        assert_eq!(req.header("Authorization"), Some("Bearer abc123"));
    }

    #[test]
    fn authorize_omits_header_without_token() {
        let dispatcher = Dispatcher::new(FakeTransport::default(), SessionStore::in_memory());
        let mut req = request(RequestScope::Resource);
        req.headers
            .push(("Authorization".to_string(), "Bearer stale".to_string()));

        let req = dispatcher.authorize(req);
        assert!(req.header("authorization").is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn classify_buckets() {
        use RequestScope::{Auth, Resource};

        assert!(classify(Resource, response(201, "{}")).is_ok());
        assert!(matches!(
            classify(Resource, response(401, "")),
            Err(ApiError::Auth { status: 401, .. })
        ));
        assert!(matches!(
            classify(Resource, response(403, "")),
            Err(ApiError::Auth { status: 403, .. })
        ));
        assert!(matches!(
            classify(Auth, response(401, r#"{"error":"Invalid email or password"}"#)),
            Err(ApiError::Client { status: 401, .. })
        ));
        assert!(matches!(
            classify(Resource, response(404, "")),
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            classify(Auth, response(400, r#"{"error":{"email":["taken"]}}"#)),
            Err(ApiError::Client { status: 400, detail: ErrorDetail::Fields(_) })
        ));
        assert!(matches!(
            classify(Resource, response(503, "down")),
            Err(ApiError::Server { status: 503, .. })
        ));
        assert!(matches!(
            classify(Resource, response(302, "")),
            Err(ApiError::UnexpectedStatus { status: 302, .. })
        ));
    }

    #[test]
    fn success_body_passes_through_unchanged() {
        let body = r#"{"id":1,"odd":"shape"}"#;
        let passed = classify(RequestScope::Resource, response(200, body)).unwrap();
        assert_eq!(passed.body, body);
    }

    #[tokio::test]
    async fn send_executes_once_and_classifies() {
        let transport = FakeTransport::default().reply(500, r#"{"error":"boom"}"#);
        let dispatcher = Dispatcher::new(transport, SessionStore::in_memory());

        let err = dispatcher
            .send(request(RequestScope::Resource))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
        assert_eq!(dispatcher.transport().sent_count(), 1);
    }

    #[tokio::test]
    async fn send_reports_network_failure_without_retry() {
        let transport = FakeTransport::default().fail();
        let dispatcher = Dispatcher::new(transport, SessionStore::in_memory());

        let err = dispatcher
            .send(request(RequestScope::Resource))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(dispatcher.transport().sent_count(), 1);
    }

    #[tokio::test]
    async fn auth_error_leaves_session_untouched() {
        let session = SessionStore::in_memory();
        session.save("expired", &profile()).unwrap();
        let transport = FakeTransport::default().reply(401, r#"{"error":"Token expired"}"#);
        let dispatcher = Dispatcher::new(transport, session.clone());

        let err = dispatcher
            .send(request(RequestScope::Resource))
            .await
            .unwrap_err();
        assert!(err.requires_login());
        assert_eq!(session.token().as_deref(), Some("expired"));
        let sent = dispatcher.transport().last_sent().unwrap();
        assert_eq!(sent.header("authorization"), Some("Bearer expired"));
    }
}
