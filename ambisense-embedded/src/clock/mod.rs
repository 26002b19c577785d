mod stamper;

#[cfg(feature = "std")]
mod provider;

pub use stamper::TimeStamper;

#[cfg(feature = "std")]
pub use provider::{StdDelay, SystemClock, SystemTimeProvider};
