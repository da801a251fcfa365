//! Tracing setup shared by the fleet binaries and tests.

mod tracing;

pub use self::tracing::*;
