//! `pointswap-app` — session facade used by UI shells.
//!
//! Wires configuration, logging and storage around the pure ledger. The UI
//! (views, forms, theming) lives elsewhere and only talks to [`PointSwap`].

pub mod config;
pub mod error;
pub mod session;

pub use config::PointSwapConfig;
pub use error::{AppError, AppResult};
pub use session::{Confirmation, Outcome, PointSwap};
