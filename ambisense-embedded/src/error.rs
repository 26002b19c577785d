use core::fmt;

use ambisense_api::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NetworkUnavailable,
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
    },
    Store(StoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NetworkUnavailable => write!(f, "Network unavailable"),
            Error::RetriesExhausted {
                operation,
                attempts,
            } => write!(f, "{} gave up after {} attempts", operation, attempts),
            Error::Store(err) => write!(f, "Store error: {}", err),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
