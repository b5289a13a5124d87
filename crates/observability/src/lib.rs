//! Tracing/logging setup shared by every PointSwap host.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::{LogFormat, init, init_with};
