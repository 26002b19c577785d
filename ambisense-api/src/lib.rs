#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod firebase;
pub mod models;
pub mod store;
pub mod timestamp;

pub use models::*;
pub use store::*;
pub use timestamp::*;

/// Monotonic milliseconds since boot, used for pacing and token expiry.
pub trait TimeProvider {
    fn uptime_ms(&self) -> u64;
}

impl<T: TimeProvider + ?Sized> TimeProvider for &T {
    fn uptime_ms(&self) -> u64 {
        (**self).uptime_ms()
    }
}
