//! Points ledger (accounts, transactions, transfer engine).
//!
//! Pure domain logic only: no IO, no UI, no persistence concerns.

pub mod transaction;
pub mod transfer;
pub mod user;
pub mod views;

pub use transaction::{SYSTEM_LABEL, Transaction, TransactionKind};
pub use transfer::{
    BalanceAdjustment, ForcedTransfer, LedgerCommand, LedgerUpdate, PeerTransfer, adjust_balance,
    forced_transfer, handle, peer_transfer,
};
pub use user::{
    ADMIN_USERNAME, DEFAULT_WELCOME_BONUS, Points, RegisterUser, Registration, User,
    authenticate, is_admin_username, register, remove_user,
};
