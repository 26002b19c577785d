#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod actuator;
pub mod clock;
pub mod config;
pub mod error;
pub mod publisher;
pub mod scheduler;
pub mod sensor;
pub mod startup;

#[cfg(test)]
pub mod mock;

pub use actuator::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use publisher::*;
pub use scheduler::*;
pub use sensor::*;
pub use startup::*;
