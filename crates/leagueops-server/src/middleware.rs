use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Client name used when neither a key nor a forwarded address identifies the caller.
const ANONYMOUS_CLIENT: &str = "anonymous";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Name of the caller behind a protected request, stored as a request extension.
///
/// Authenticated callers are named after their API key entry; with auth
/// disabled the first `x-forwarded-for` hop is used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient(pub String);

/// Bearer keys accepted by the protected routes, mapped to client names.
#[derive(Debug, Clone)]
pub struct AuthState {
    clients: Arc<HashMap<String, String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `LEAGUEOPS_API_KEYS`.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("LEAGUEOPS_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// Builds auth config from a comma-separated list of `name=token` entries.
    ///
    /// A bare `token` is named `client-<n>` after its position in the list.
    /// An empty list disables auth in development and fails startup elsewhere.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let mut clients = HashMap::new();
        for (position, entry) in raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .enumerate()
        {
            let (name, token) = match entry.split_once('=') {
                Some((name, token)) => (name.trim().to_string(), token.trim()),
                None => (format!("client-{}", position + 1), entry),
            };
            if name.is_empty() || token.is_empty() {
                anyhow::bail!(
                    "LEAGUEOPS_API_KEYS entry {} is missing a name or token",
                    position + 1
                );
            }
            if let Some(previous) = clients.insert(token.to_string(), name) {
                anyhow::bail!(
                    "LEAGUEOPS_API_KEYS lists the token for '{previous}' more than once"
                );
            }
        }

        if clients.is_empty() {
            if is_development {
                tracing::warn!(
                    "LEAGUEOPS_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    clients: Arc::new(HashMap::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "LEAGUEOPS_API_KEYS is required outside development; provide comma-separated name=token entries"
            );
        }

        Ok(Self {
            clients: Arc::new(clients),
            enabled: true,
        })
    }

    fn client_for(&self, token: &str) -> Option<&str> {
        self.clients.get(token).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter with one window per [`ApiClient`].
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, ClientWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request for `client` at `now`.
    ///
    /// Returns how long the client must wait when its window is already full.
    async fn admit(&self, client: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;

        if !windows.contains_key(client) {
            windows.retain(|_, w| now.saturating_duration_since(w.started_at) < self.window);
        }
        let entry = windows.entry(client.to_string()).or_insert(ClientWindow {
            started_at: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started_at);
        if elapsed >= self.window {
            *entry = ClientWindow {
                started_at: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            return Err(self.window.saturating_sub(elapsed));
        }
        entry.count += 1;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn middleware_error(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused; otherwise a `UUIDv4` is
/// generated. The ID is stored as a [`RequestId`] extension and echoed on
/// the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware that resolves the caller into an [`ApiClient`], rejecting
/// unknown bearer tokens when auth is enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let client = if auth.enabled {
        let Some(name) = extract_bearer_token(req.headers().get(AUTHORIZATION))
            .and_then(|token| auth.client_for(token))
        else {
            return middleware_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or invalid bearer token",
            );
        };
        name.to_string()
    } else {
        forwarded_client(req.headers()).unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
    };

    req.extensions_mut().insert(ApiClient(client));
    next.run(req).await
}

/// Middleware enforcing the per-client request limit. Runs after
/// [`require_bearer_auth`] so the caller is already named.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ApiClient>()
        .map_or_else(|| ANONYMOUS_CLIENT.to_string(), |c| c.0.clone());

    if let Err(retry_after) = rate_limit.admit(&client, Instant::now()).await {
        tracing::warn!(
            %client,
            limit = rate_limit.max_requests,
            retry_after_secs = retry_after.as_secs(),
            "rate limit exceeded"
        );
        let mut res = middleware_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        res.headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(secs.max(1)));
        return res;
    }

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn forwarded_client_uses_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(forwarded_client(&headers).as_deref(), Some("203.0.113.7"));
        assert_eq!(forwarded_client(&HeaderMap::new()), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_keys("", true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_keys(" , ", false).is_err());
    }

    #[test]
    fn auth_state_names_clients_by_entry() {
        let state =
            AuthState::from_keys("front-desk=alpha, beta ,", false).expect("keys provided");
        assert!(state.enabled);
        assert_eq!(state.client_for("alpha"), Some("front-desk"));
        assert_eq!(state.client_for("beta"), Some("client-2"));
        assert_eq!(state.client_for("gamma"), None);
    }

    #[test]
    fn auth_state_rejects_duplicate_tokens_and_blank_names() {
        assert!(AuthState::from_keys("a=same,b=same", false).is_err());
        assert!(AuthState::from_keys("=token", false).is_err());
    }

    #[tokio::test]
    async fn rate_limit_windows_are_tracked_per_client() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.admit("front-desk", now).await.is_ok());
        assert!(limiter.admit("front-desk", now).await.is_ok());
        let wait = limiter
            .admit("front-desk", now + Duration::from_secs(15))
            .await
            .expect_err("third request in window is limited");
        assert_eq!(wait, Duration::from_secs(45));

        assert!(limiter.admit("ops", now + Duration::from_secs(15)).await.is_ok());
    }

    #[tokio::test]
    async fn rate_limit_window_resets_after_it_elapses() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.admit("front-desk", now).await.is_ok());
        assert!(limiter.admit("front-desk", now).await.is_err());
        assert!(limiter
            .admit("front-desk", now + Duration::from_secs(60))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rate_limit_drops_expired_windows_for_other_clients() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.admit("front-desk", now).await.is_ok());
        assert!(limiter
            .admit("ops", now + Duration::from_secs(90))
            .await
            .is_ok());
        assert!(!limiter.windows.lock().await.contains_key("front-desk"));
    }
}
