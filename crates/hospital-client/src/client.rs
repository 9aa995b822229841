//! Authenticated HTTP client
//!
//! Every request goes through the same pipeline:
//!
//! 1. **authenticate** - if an access token is stored, set `Authorization: Bearer <token>`
//! 2. **dispatch** - send the request
//! 3. **recover** - on the first 401, refresh the access token once and re-run the pipeline
//!
//! Per logical request the phases are:
//!
//! ```text
//! Sent -> Success
//!      -> UnauthorizedFirst -> Refreshing -> RetriedSuccess | RetriedFailure
//!      -> UnauthorizedSecond
//! ```
//!
//! A request is retried at most once (`ApiRequest::is_retried`). When recovery is not
//! possible (no refresh token, or the refresh call fails) the session store is cleared and
//! the registered [`SessionExpiredHandler`] is notified with the login entry point.

use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{ClientError, Result, extract_detail};
use crate::session::{SessionKey, SessionStore, read_token};
use crate::token::BearerToken;

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://hospital-backend-app.vercel.app";

/// Where the user is sent when the session cannot be recovered
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const REFRESH_PATH: &str = "/api/auth/token/refresh/";

// ============================================================================
// Configuration
// ============================================================================

/// How concurrent 401s coordinate their refresh calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Refreshes are serialized. A request that waited behind another refresh reuses the
    /// token that refresh stored instead of refreshing again.
    #[default]
    SingleFlight,

    /// Every unauthorized request refreshes on its own. Concurrent 401s each issue a
    /// refresh call and the last stored access token wins.
    PerRequest,
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshPolicy::SingleFlight => f.write_str("single-flight"),
            RefreshPolicy::PerRequest => f.write_str("per-request"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    pub timeout: Duration,
    pub login_path: String,
    pub refresh_policy: RefreshPolicy,
}

impl ClientConfig {
    /// Create a config for the given API root (scheme and host, optional path prefix).
    pub fn new(base_url: &str) -> Result<Self> {
        url::Url::parse(base_url).map_err(|source| ClientError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_policy: RefreshPolicy::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join an API path onto the base URL. Paths are appended, so a base path prefix is kept.
    pub fn url_for(&self, path: &str) -> Result<String> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        url::Url::parse(&joined)
            .map(|url| url.to_string())
            .map_err(|source| ClientError::InvalidUrl {
                url: joined,
                source,
            })
    }
}

// ============================================================================
// Request descriptor
// ============================================================================

/// Outbound request as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body).map_err(ClientError::Encode)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Whether this request has already been re-sent after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    fn set_bearer(&mut self, token: &BearerToken) -> Result<()> {
        self.headers.insert(AUTHORIZATION, token.as_header_value()?);
        Ok(())
    }
}

/// Phase of a logical request, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Sent,
    Success,
    UnauthorizedFirst,
    Refreshing,
    RetriedSuccess,
    RetriedFailure,
    UnauthorizedSecond,
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestPhase::Sent => "sent",
            RequestPhase::Success => "success",
            RequestPhase::UnauthorizedFirst => "unauthorized-first",
            RequestPhase::Refreshing => "refreshing",
            RequestPhase::RetriedSuccess => "retried-success",
            RequestPhase::RetriedFailure => "retried-failure",
            RequestPhase::UnauthorizedSecond => "unauthorized-second",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Session expiry hook
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// A 401 arrived and no refresh token was stored
    MissingRefreshToken,
    /// The refresh endpoint rejected the refresh token or could not be reached
    RefreshFailed,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryReason::MissingRefreshToken => f.write_str("no refresh token available"),
            ExpiryReason::RefreshFailed => f.write_str("token refresh failed"),
        }
    }
}

/// Emitted after the session store has been cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpired {
    pub login_path: String,
    pub reason: ExpiryReason,
}

/// Host hook for an unrecoverable authorization failure.
///
/// This is where a front end sends the user back to the login entry point. It is fire and
/// forget: the failing request still returns its error to the caller.
pub trait SessionExpiredHandler: Send + Sync {
    fn on_session_expired(&self, event: &SessionExpired);
}

impl<F> SessionExpiredHandler for F
where
    F: Fn(&SessionExpired) + Send + Sync,
{
    fn on_session_expired(&self, event: &SessionExpired) {
        self(event)
    }
}

// ============================================================================
// Client
// ============================================================================

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    on_expired: Option<Arc<dyn SessionExpiredHandler>>,
    refresh_gate: Mutex<()>,
}

/// HTTP client that authenticates requests from the session store and recovers from an
/// expired access token. Cheap to clone.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<Inner>,
}

pub struct AuthenticatedClientBuilder {
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    on_expired: Option<Arc<dyn SessionExpiredHandler>>,
}

impl AuthenticatedClientBuilder {
    pub fn on_session_expired(mut self, handler: impl SessionExpiredHandler + 'static) -> Self {
        self.on_expired = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<AuthenticatedClient> {
        let http = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(concat!("hospital-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Build)?;

        Ok(AuthenticatedClient {
            inner: Arc::new(Inner {
                http,
                config: self.config,
                store: self.store,
                on_expired: self.on_expired,
                refresh_gate: Mutex::new(()),
            }),
        })
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient {
    pub fn builder(config: ClientConfig, store: Arc<dyn SessionStore>) -> AuthenticatedClientBuilder {
        AuthenticatedClientBuilder {
            config,
            store,
            on_expired: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.inner.store.as_ref()
    }

    /// Send a request through the pipeline.
    ///
    /// Returns the response for 2xx statuses and [`ClientError::Status`] otherwise.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<Response> {
        loop {
            let sent_with = self.authenticate(&mut request)?;
            let response = self.dispatch(&request).await?;
            let status = response.status();

            if status.is_success() {
                let phase = if request.retried {
                    RequestPhase::RetriedSuccess
                } else {
                    RequestPhase::Success
                };
                debug!(%status, %phase, "request completed");
                return Ok(response);
            }

            let failure = self.failure_from(&request, response).await;

            if status != StatusCode::UNAUTHORIZED {
                if request.retried {
                    debug!(%status, phase = %RequestPhase::RetriedFailure, "retried request failed");
                }
                return Err(failure);
            }

            if request.retried {
                warn!(phase = %RequestPhase::UnauthorizedSecond, "still unauthorized after refresh");
                return Err(failure);
            }

            debug!(phase = %RequestPhase::UnauthorizedFirst, "access token rejected");
            request.retried = true;
            let access = self.recover(sent_with.as_ref(), failure).await?;
            request.set_bearer(&access)?;
        }
    }

    /// Send a request and decode a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let method = request.method.clone();
        let response = self.send(request).await?;
        decode_json(&method, response).await
    }

    /// Send a request and discard the body (e.g. DELETE returning 204).
    pub async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await?;
        Ok(())
    }

    /// Pre-send hook. Returns the token the request is sent with.
    fn authenticate(&self, request: &mut ApiRequest) -> Result<Option<BearerToken>> {
        match read_token(self.store(), SessionKey::AccessToken)? {
            Some(token) => {
                request.set_bearer(&token)?;
                debug!("authorization header set");
                Ok(Some(token))
            }
            None => {
                debug!("no access token stored, sending unauthenticated");
                Ok(None)
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Response> {
        let url = self.inner.config.url_for(&request.path)?;
        debug!(phase = %RequestPhase::Sent, retried = request.retried, "dispatching");

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: request.method.clone(),
                url,
                source,
            })
    }

    async fn failure_from(&self, request: &ApiRequest, response: Response) -> ClientError {
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();

        ClientError::Status {
            method: request.method.clone(),
            url,
            status,
            detail: extract_detail(&body),
            body,
        }
    }

    /// Obtain a fresh access token after a 401, or expire the session.
    ///
    /// `failure` is returned unchanged when there is no refresh token to try. The session
    /// expired hook fires once per expiry under `SingleFlight`; under `PerRequest` every
    /// request that fails to recover fires it.
    async fn recover(
        &self,
        sent_with: Option<&BearerToken>,
        failure: ClientError,
    ) -> Result<BearerToken> {
        let _gate = match self.inner.config.refresh_policy {
            RefreshPolicy::SingleFlight => Some(self.inner.refresh_gate.lock().await),
            RefreshPolicy::PerRequest => None,
        };

        if self.inner.config.refresh_policy == RefreshPolicy::SingleFlight {
            match read_token(self.store(), SessionKey::AccessToken)? {
                Some(current) if sent_with != Some(&current) => {
                    debug!("access token already refreshed by a concurrent request");
                    return Ok(current);
                }
                // A concurrent request expired the session and already notified the host
                None if sent_with.is_some() => {
                    debug!("session already expired by a concurrent request");
                    return Err(failure);
                }
                _ => {}
            }
        }

        let Some(refresh) = read_token(self.store(), SessionKey::RefreshToken)? else {
            self.expire_session(ExpiryReason::MissingRefreshToken);
            return Err(failure);
        };

        debug!(phase = %RequestPhase::Refreshing, "refreshing access token");
        match self.refresh_access_token(&refresh).await {
            Ok(access) => {
                self.store().set(SessionKey::AccessToken, access.as_str())?;
                info!("access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                self.expire_session(ExpiryReason::RefreshFailed);
                Err(ClientError::RefreshFailed {
                    source: Box::new(e),
                })
            }
        }
    }

    /// Call the refresh endpoint directly, outside the pipeline.
    async fn refresh_access_token(&self, refresh: &BearerToken) -> Result<BearerToken> {
        let url = self.inner.config.url_for(REFRESH_PATH)?;

        let response = self
            .inner
            .http
            .post(&url)
            .json(&RefreshRequest {
                refresh: refresh.as_str(),
            })
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: Method::POST,
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                method: Method::POST,
                url,
                status,
                detail: extract_detail(&body),
                body,
            });
        }

        let RefreshResponse { access } = decode_json(&Method::POST, response).await?;
        Ok(BearerToken::try_from(access)?)
    }

    fn expire_session(&self, reason: ExpiryReason) {
        warn!(%reason, "session expired, clearing stored credentials");
        if let Err(e) = self.store().clear() {
            warn!(error = %e, "failed to clear session store");
        }

        if let Some(handler) = &self.inner.on_expired {
            handler.on_session_expired(&SessionExpired {
                login_path: self.inner.config.login_path.clone(),
                reason,
            });
        }
    }
}

async fn decode_json<T: DeserializeOwned>(method: &Method, response: Response) -> Result<T> {
    let url = response.url().to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ClientError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;

    serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { url, source })
}
