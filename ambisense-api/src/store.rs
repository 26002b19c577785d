use core::fmt;

use alloc::string::{String, ToString};

use crate::models::RemotePath;

/// Reported when the request never produced an HTTP response.
pub const HTTP_CODE_CONNECTION_FAILED: i32 = -1;

/// Reported for failures detected locally before any request was made.
pub const HTTP_CODE_NONE: i32 = 0;

/// Diagnostic carried by every failed store call: the service's reason and
/// its HTTP-style status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub reason: String,
    pub http_code: i32,
}

impl StoreError {
    pub fn new(reason: impl Into<String>, http_code: i32) -> Self {
        Self {
            reason: reason.into(),
            http_code,
        }
    }

    pub fn connection(reason: impl fmt::Display) -> Self {
        Self::new(reason.to_string(), HTTP_CODE_CONNECTION_FAILED)
    }

    pub fn local(reason: impl Into<String>) -> Self {
        Self::new(reason, HTTP_CODE_NONE)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (HTTP response code: {})", self.reason, self.http_code)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

pub type StoreResult<T> = core::result::Result<T, StoreError>;

/// Remote key-value tree with realtime semantics.
///
/// Calls block until the transport answers or gives up.
pub trait RealtimeStore {
    /// True once authenticated with a usable token. May refresh the token.
    fn is_ready(&mut self) -> bool;

    fn set_float(&mut self, path: &RemotePath, value: f32) -> StoreResult<()>;

    fn get_bool(&mut self, path: &RemotePath) -> StoreResult<bool>;
}

/// Stores that authenticate by registering an anonymous user.
pub trait AnonymousAuth {
    fn sign_up(&mut self) -> StoreResult<()>;
}

impl<S: RealtimeStore + ?Sized> RealtimeStore for &mut S {
    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }

    fn set_float(&mut self, path: &RemotePath, value: f32) -> StoreResult<()> {
        (**self).set_float(path, value)
    }

    fn get_bool(&mut self, path: &RemotePath) -> StoreResult<bool> {
        (**self).get_bool(path)
    }
}
