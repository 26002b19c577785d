use core::fmt::Write as _;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::store::{StoreError, StoreResult};

use super::transport::HttpResponse;

pub const SIGN_UP_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";
pub const TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1/token";

/// Refresh the ID token when it expires within this window.
pub const REFRESH_MARGIN_MS: u64 = 5 * 60 * 1000;

/// Lifetime assumed when the service omits or garbles `expiresIn`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Wait after the first failed refresh, doubled on every further failure.
pub const REFRESH_RETRY_INITIAL_MS: u64 = 2_000;

pub const REFRESH_RETRY_MAX_MS: u64 = 60_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest {
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    error: IdentityErrorDetail,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorDetail {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub id_token: String,
    pub refresh_token: String,
    /// Uptime at which the ID token stops being accepted
    pub expires_at_ms: u64,
}

impl AuthToken {
    pub fn expires_within(&self, now_ms: u64, margin_ms: u64) -> bool {
        now_ms.saturating_add(margin_ms) >= self.expires_at_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Uninitialized,
    OnSigning,
    OnRefresh,
    Ready,
    Error,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Uninitialized => "uninitialized",
            TokenStatus::OnSigning => "on signing",
            TokenStatus::OnRefresh => "on refreshing",
            TokenStatus::Ready => "ready",
            TokenStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub status: TokenStatus,
    pub error: Option<StoreError>,
}

pub type TokenStatusCallback = fn(&TokenInfo);

/// Default token status callback: one log line per transition.
pub fn log_token_status(info: &TokenInfo) {
    match &info.error {
        Some(err) => error!("Token info: status = {}, error = {}", info.status.as_str(), err),
        None => info!("Token info: status = {}", info.status.as_str()),
    }
}

/// Spacing of token refresh attempts after failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshBackoff {
    failures: u32,
    retry_at_ms: Option<u64>,
}

impl RefreshBackoff {
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// True while a failed refresh is still being waited out.
    pub fn is_waiting(&self, now_ms: u64) -> bool {
        self.retry_at_ms.is_some_and(|at| now_ms < at)
    }

    /// Records a failed attempt at `now_ms` and returns the wait before the next one.
    pub fn record_failure(&mut self, now_ms: u64) -> u64 {
        let shift = self.failures.min(16);
        let wait_ms = REFRESH_RETRY_INITIAL_MS
            .saturating_mul(1u64 << shift)
            .min(REFRESH_RETRY_MAX_MS);

        self.failures = self.failures.saturating_add(1);
        self.retry_at_ms = Some(now_ms.saturating_add(wait_ms));
        wait_ms
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub(crate) fn sign_up_url(api_key: &str) -> String {
    format!("{}?key={}", SIGN_UP_ENDPOINT, api_key)
}

/// Anonymous sign-up: no email, no password.
pub(crate) fn sign_up_body() -> StoreResult<Vec<u8>> {
    serde_json::to_vec(&SignUpRequest {
        return_secure_token: true,
    })
    .map_err(|e| StoreError::local(format!("failed to encode sign-up request: {}", e)))
}

pub(crate) fn parse_sign_up(response: &HttpResponse, now_ms: u64) -> StoreResult<AuthToken> {
    if !response.is_success() {
        return Err(identity_error(response));
    }

    let body: SignUpResponse = serde_json::from_slice(&response.body).map_err(|e| {
        StoreError::new(
            format!("invalid sign-up response: {}", e),
            response.status as i32,
        )
    })?;

    Ok(AuthToken {
        id_token: body.id_token,
        refresh_token: body.refresh_token,
        expires_at_ms: expiry(now_ms, body.expires_in.as_deref()),
    })
}

pub(crate) fn refresh_url(api_key: &str) -> String {
    format!("{}?key={}", TOKEN_ENDPOINT, api_key)
}

pub(crate) fn refresh_body(refresh_token: &str) -> String {
    let mut body = String::from("grant_type=refresh_token&refresh_token=");
    encode_component(&mut body, refresh_token);
    body
}

pub(crate) fn parse_refresh(response: &HttpResponse, now_ms: u64) -> StoreResult<AuthToken> {
    if !response.is_success() {
        return Err(identity_error(response));
    }

    let body: RefreshResponse = serde_json::from_slice(&response.body).map_err(|e| {
        StoreError::new(
            format!("invalid token refresh response: {}", e),
            response.status as i32,
        )
    })?;

    Ok(AuthToken {
        id_token: body.id_token,
        refresh_token: body.refresh_token,
        expires_at_ms: expiry(now_ms, body.expires_in.as_deref()),
    })
}

/// `{"error":{"code":400,"message":"ADMIN_ONLY_OPERATION"}}` -> reason `ADMIN_ONLY_OPERATION`
fn identity_error(response: &HttpResponse) -> StoreError {
    let reason = serde_json::from_slice::<IdentityErrorBody>(&response.body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).into_owned());

    StoreError::new(reason, response.status as i32)
}

fn expiry(now_ms: u64, expires_in: Option<&str>) -> u64 {
    let lifetime_secs = expires_in
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

    now_ms.saturating_add(lifetime_secs.saturating_mul(1000))
}

// RFC 3986 unreserved characters pass through, everything else is %XX.
fn encode_component(out: &mut String, input: &str) {
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{:02X}", byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_sign_up_body_is_anonymous() {
        let body = sign_up_body().unwrap();
        assert_eq!(body, br#"{"returnSecureToken":true}"#);
    }

    #[test]
    fn test_parse_sign_up() {
        let token = parse_sign_up(
            &response(
                200,
                r#"{"kind":"identitytoolkit#SignupNewUserResponse","idToken":"id-1","refreshToken":"refresh-1","expiresIn":"3600","localId":"abc"}"#,
            ),
            1_000,
        )
        .unwrap();

        assert_eq!(token.id_token, "id-1");
        assert_eq!(token.refresh_token, "refresh-1");
        assert_eq!(token.expires_at_ms, 1_000 + 3_600_000);
    }

    #[test]
    fn test_parse_sign_up_error() {
        let err = parse_sign_up(
            &response(
                400,
                r#"{"error":{"code":400,"message":"ADMIN_ONLY_OPERATION","errors":[]}}"#,
            ),
            0,
        )
        .unwrap_err();

        assert_eq!(err.reason, "ADMIN_ONLY_OPERATION");
        assert_eq!(err.http_code, 400);
    }

    #[test]
    fn test_parse_refresh() {
        let token = parse_refresh(
            &response(
                200,
                r#"{"access_token":"a","expires_in":"1800","token_type":"Bearer","refresh_token":"refresh-2","id_token":"id-2","user_id":"abc"}"#,
            ),
            500,
        )
        .unwrap();

        assert_eq!(token.id_token, "id-2");
        assert_eq!(token.refresh_token, "refresh-2");
        assert_eq!(token.expires_at_ms, 500 + 1_800_000);
    }

    #[test]
    fn test_non_json_error_body() {
        let err = parse_refresh(&response(503, "Service Unavailable"), 0).unwrap_err();
        assert_eq!(err.reason, "Service Unavailable");
        assert_eq!(err.http_code, 503);
    }

    #[test]
    fn test_refresh_body_encoding() {
        assert_eq!(
            refresh_body("AMf-vB/x+y="),
            "grant_type=refresh_token&refresh_token=AMf-vB%2Fx%2By%3D"
        );
    }

    #[test]
    fn test_token_expiry_window() {
        let token = AuthToken {
            id_token: String::from("id"),
            refresh_token: String::from("refresh"),
            expires_at_ms: 3_600_000,
        };

        assert!(!token.expires_within(0, REFRESH_MARGIN_MS));
        assert!(token.expires_within(3_600_000 - REFRESH_MARGIN_MS, REFRESH_MARGIN_MS));
    }

    #[test]
    fn test_refresh_backoff_doubles_up_to_cap() {
        let mut backoff = RefreshBackoff::default();
        assert!(!backoff.is_waiting(0));

        let waits: Vec<u64> = (0..7).map(|_| backoff.record_failure(0)).collect();
        assert_eq!(waits, [2_000, 4_000, 8_000, 16_000, 32_000, 60_000, 60_000]);
        assert_eq!(backoff.failures(), 7);

        backoff.reset();
        assert_eq!(backoff.record_failure(10_000), REFRESH_RETRY_INITIAL_MS);
        assert!(backoff.is_waiting(11_999));
        assert!(!backoff.is_waiting(12_000));
    }
}
