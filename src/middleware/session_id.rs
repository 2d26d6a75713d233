use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// HTTP header carrying the client's session id
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Extension type for storing the session id in request extensions
///
/// All pagination state is partitioned by this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the UUID as a string
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reads the session id from the `x-session-id` header, or starts a new
/// session when the header is missing or not a UUID.
///
/// The id is stored in the request extensions and echoed back in the response
/// header so the client can keep paging within the same session.
pub async fn session_id_middleware(mut request: Request, next: Next) -> Response {
    let session_id = request
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(SessionId)
        .unwrap_or_else(SessionId::new);

    request.extensions_mut().insert(session_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&session_id.as_str()) {
        response
            .headers_mut()
            .insert(SESSION_ID_HEADER, header_value);
    }

    response
}

/// Creates the per-request tracing span, tagged with the session id
pub fn make_span_with_session_id(request: &Request<Body>) -> tracing::Span {
    let session_id = request
        .extensions()
        .get::<SessionId>()
        .map(|id| id.as_str())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        session_id = %session_id,
    )
}
