//! Firebase Realtime Database over its REST interface, authenticated as an
//! anonymous user.

pub mod auth;
pub mod database;
pub mod transport;

use alloc::string::String;

use log::{debug, warn};

use crate::TimeProvider;
use crate::models::RemotePath;
use crate::store::{AnonymousAuth, RealtimeStore, StoreError, StoreResult};

pub use auth::{
    AuthToken, REFRESH_MARGIN_MS, REFRESH_RETRY_INITIAL_MS, REFRESH_RETRY_MAX_MS, RefreshBackoff,
    TokenInfo, TokenStatus, TokenStatusCallback, log_token_status,
};
pub use database::normalize_database_url;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

use transport::{CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    /// Web API key of the project
    pub api_key: String,
    /// Database root, with or without scheme
    pub database_url: String,
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            database_url: database_url.into(),
        }
    }
}

pub struct FirebaseClient<T, P>
where
    T: HttpTransport,
    P: TimeProvider,
{
    transport: T,
    clock: P,
    api_key: String,
    database_url: String,
    token: Option<AuthToken>,
    status: TokenStatus,
    backoff: RefreshBackoff,
    callback: Option<TokenStatusCallback>,
}

impl<T, P> FirebaseClient<T, P>
where
    T: HttpTransport,
    P: TimeProvider,
{
    pub fn new(config: FirebaseConfig, transport: T, clock: P) -> Self {
        Self {
            transport,
            clock,
            api_key: config.api_key,
            database_url: normalize_database_url(&config.database_url),
            token: None,
            status: TokenStatus::Uninitialized,
            backoff: RefreshBackoff::default(),
            callback: None,
        }
    }

    /// Invoked on every token status transition.
    pub fn with_token_callback(mut self, callback: TokenStatusCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn token_status(&self) -> TokenStatus {
        self.status
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn refresh_backoff(&self) -> RefreshBackoff {
        self.backoff
    }

    /// Exchanges the refresh token for a new ID token.
    pub fn refresh_token(&mut self) -> StoreResult<()> {
        let refresh_token = match &self.token {
            Some(token) => token.refresh_token.clone(),
            None => return Err(StoreError::local("not signed in")),
        };

        self.transition(TokenStatus::OnRefresh, None);

        let body = auth::refresh_body(&refresh_token);
        let url = auth::refresh_url(&self.api_key);
        let result = self
            .send(HttpMethod::Post, &url, Some(CONTENT_TYPE_FORM), body.as_bytes())
            .and_then(|response| auth::parse_refresh(&response, self.clock.uptime_ms()));

        match result {
            Ok(token) => {
                self.token = Some(token);
                self.backoff.reset();
                self.transition(TokenStatus::Ready, None);
                Ok(())
            }
            Err(err) => {
                // The refresh token is kept for the next attempt
                let wait_ms = self.backoff.record_failure(self.clock.uptime_ms());
                debug!("Next token refresh attempt in {} ms", wait_ms);
                self.transition(TokenStatus::Error, Some(err.clone()));
                Err(err)
            }
        }
    }

    fn request_sign_up(&mut self) -> StoreResult<AuthToken> {
        let body = auth::sign_up_body()?;
        let url = auth::sign_up_url(&self.api_key);
        let response = self.send(HttpMethod::Post, &url, Some(CONTENT_TYPE_JSON), &body)?;

        auth::parse_sign_up(&response, self.clock.uptime_ms())
    }

    fn id_token(&mut self) -> StoreResult<String> {
        if !self.is_ready() {
            return Err(StoreError::local("token is not ready"));
        }

        self.token
            .as_ref()
            .map(|token| token.id_token.clone())
            .ok_or_else(|| StoreError::local("not signed in"))
    }

    fn send(
        &mut self,
        method: HttpMethod,
        url: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> StoreResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url,
            content_type,
            body,
        };

        self.transport
            .send(&request)
            .map_err(StoreError::connection)
    }

    fn transition(&mut self, status: TokenStatus, error: Option<StoreError>) {
        if self.status == status && error.is_none() {
            return;
        }
        self.status = status;

        if let Some(callback) = self.callback {
            callback(&TokenInfo { status, error });
        }
    }
}

impl<T, P> AnonymousAuth for FirebaseClient<T, P>
where
    T: HttpTransport,
    P: TimeProvider,
{
    /// Registers a fresh anonymous user and keeps its tokens.
    fn sign_up(&mut self) -> StoreResult<()> {
        self.transition(TokenStatus::OnSigning, None);

        let result = self.request_sign_up();
        match result {
            Ok(token) => {
                self.token = Some(token);
                self.backoff.reset();
                self.transition(TokenStatus::Ready, None);
                Ok(())
            }
            Err(err) => {
                self.token = None;
                self.transition(TokenStatus::Error, Some(err.clone()));
                Err(err)
            }
        }
    }
}

impl<T, P> RealtimeStore for FirebaseClient<T, P>
where
    T: HttpTransport,
    P: TimeProvider,
{
    fn is_ready(&mut self) -> bool {
        let now = self.clock.uptime_ms();

        let (needs_refresh, still_valid) = match &self.token {
            None => return false,
            Some(token) => (
                token.expires_within(now, REFRESH_MARGIN_MS),
                now < token.expires_at_ms,
            ),
        };

        if !needs_refresh {
            return self.status == TokenStatus::Ready;
        }

        // An unexpired token stays usable while failed refreshes are waited out
        if self.backoff.is_waiting(now) {
            return still_valid;
        }

        debug!("ID token expires soon, refreshing");
        match self.refresh_token() {
            Ok(()) => true,
            Err(err) => {
                warn!("Token refresh failed: {}", err);
                still_valid
            }
        }
    }

    fn set_float(&mut self, path: &RemotePath, value: f32) -> StoreResult<()> {
        let body = database::float_body(value)?;
        let id_token = self.id_token()?;
        let url = database::node_url(&self.database_url, path, &id_token);

        let response = self.send(HttpMethod::Put, &url, Some(CONTENT_TYPE_JSON), &body)?;
        database::check_write(&response)
    }

    fn get_bool(&mut self, path: &RemotePath) -> StoreResult<bool> {
        let id_token = self.id_token()?;
        let url = database::node_url(&self.database_url, path, &id_token);

        let response = self.send(HttpMethod::Get, &url, None, &[])?;
        database::parse_bool(&response)
    }
}
