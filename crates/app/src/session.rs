//! Session facade: the single object a UI shell drives.
//!
//! The session keeps the in-memory collections, the signed-in member and the
//! injected [`LedgerStore`]. Every mutating call runs the pure ledger function
//! first, persists the result, and only then swaps the in-memory state, so a
//! failed call leaves both memory and storage as they were.

use std::path::{Path, PathBuf};

use chrono::Utc;

use pointswap_core::{DomainError, UserId, find_by_id};
use pointswap_ledger::{
    BalanceAdjustment, ForcedTransfer, LedgerCommand, LedgerUpdate, PeerTransfer, RegisterUser,
    Transaction, User, authenticate, handle, register, remove_user, views,
};
use pointswap_store::{BackupDocument, FileStorage, KeyValueStorage, LedgerSnapshot, LedgerStore};

use crate::config::PointSwapConfig;
use crate::error::{AppError, AppResult};

/// Answer to the "are you sure?" prompt guarding destructive actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Result of a confirmable action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }
}

pub struct PointSwap<S> {
    store: LedgerStore<S>,
    config: PointSwapConfig,
    users: Vec<User>,
    transactions: Vec<Transaction>,
    current: Option<UserId>,
}

impl PointSwap<FileStorage> {
    /// Production entry point: logging, env config, file storage.
    pub fn bootstrap() -> anyhow::Result<Self> {
        let config = PointSwapConfig::from_env();
        pointswap_observability::init_with(config.log_format, "info");

        let dir = config.resolve_data_dir()?;
        let storage = FileStorage::open(&dir)?;
        tracing::info!(data_dir = %dir.display(), "pointswap storage opened");

        Ok(Self::open(LedgerStore::new(storage), config))
    }
}

impl<S> PointSwap<S>
where
    S: KeyValueStorage,
{
    /// Load both collections from the store. Nobody is signed in.
    pub fn open(store: LedgerStore<S>, config: PointSwapConfig) -> Self {
        let LedgerSnapshot { users, transactions } = store.load();
        tracing::debug!(users = users.len(), transactions = transactions.len(), "session opened");

        Self {
            store,
            config,
            users,
            transactions,
            current: None,
        }
    }

    pub fn store(&self) -> &LedgerStore<S> {
        &self.store
    }

    pub fn config(&self) -> &PointSwapConfig {
        &self.config
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref().and_then(|id| find_by_id(&self.users, id))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accounts
    // ─────────────────────────────────────────────────────────────────────

    /// Create an account and sign in as it.
    pub fn register(&mut self, username: &str, password: &str) -> AppResult<User> {
        let cmd = RegisterUser::now(username, password, self.config.welcome_bonus);
        let registration = register(&self.users, &cmd)?;

        self.store.save_users(&registration.users)?;
        self.users = registration.users;
        self.current = Some(registration.user.id.clone());

        tracing::info!(
            user_id = %registration.user.id,
            is_admin = registration.user.is_admin,
            "member registered"
        );
        Ok(registration.user)
    }

    pub fn login(&mut self, username: &str, password: &str) -> AppResult<User> {
        let user = authenticate(&self.users, username, password).map_err(|err| {
            if err == DomainError::Unauthorized {
                tracing::warn!("failed login attempt");
            }
            err
        })?;

        self.current = Some(user.id.clone());
        Ok(user.clone())
    }

    pub fn logout(&mut self) {
        self.current = None;
    }

    /// Delete the signed-in member's account and sign out.
    pub fn delete_account(&mut self, confirmation: Confirmation) -> AppResult<Outcome<()>> {
        let me = self.signed_in()?.id.clone();
        if confirmation == Confirmation::Declined {
            return Ok(Outcome::Cancelled);
        }
        self.delete(&me)?;
        Ok(Outcome::Applied(()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Member operations
    // ─────────────────────────────────────────────────────────────────────

    pub fn send_points(&mut self, receiver_id: &UserId, amount: i64) -> AppResult<Transaction> {
        let me = self.signed_in()?.id.clone();
        self.execute(LedgerCommand::Transfer(PeerTransfer::now(me, receiver_id.clone(), amount)))
    }

    /// Members ranked by balance.
    pub fn members(&self) -> Vec<User> {
        views::members(&self.users)
    }

    /// Members the signed-in user can send points to.
    pub fn recipients(&self) -> AppResult<Vec<&User>> {
        let me = self.signed_in()?;
        Ok(views::recipients(&self.users, &me.id))
    }

    /// The signed-in member's transactions, newest first.
    pub fn my_history(&self) -> AppResult<Vec<Transaction>> {
        let me = self.signed_in()?;
        Ok(views::history_for(&self.transactions, &me.id))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Admin operations
    // ─────────────────────────────────────────────────────────────────────

    pub fn adjust_points(&mut self, user_id: &UserId, delta: i64) -> AppResult<Transaction> {
        self.require_admin()?;
        self.execute(LedgerCommand::Adjust(BalanceAdjustment::now(user_id.clone(), delta)))
    }

    pub fn force_transfer(&mut self, from_id: &UserId, to_id: &UserId, amount: i64) -> AppResult<Transaction> {
        self.require_admin()?;
        self.execute(LedgerCommand::ForcedTransfer(ForcedTransfer::now(
            from_id.clone(),
            to_id.clone(),
            amount,
        )))
    }

    pub fn delete_member(&mut self, user_id: &UserId, confirmation: Confirmation) -> AppResult<Outcome<()>> {
        self.require_admin()?;
        if confirmation == Confirmation::Declined {
            return Ok(Outcome::Cancelled);
        }
        self.delete(user_id)?;
        Ok(Outcome::Applied(()))
    }

    /// Latest transactions across all members (admin overview).
    pub fn recent_activity(&self) -> AppResult<Vec<Transaction>> {
        self.require_admin()?;
        Ok(views::recent_activity(&self.transactions, self.config.activity_limit))
    }

    pub fn export_backup(&self) -> AppResult<BackupDocument> {
        self.require_admin()?;
        Ok(self.store.export(Utc::now()))
    }

    /// Write `pointswap_backup_<date>.json` into `dir`.
    pub fn export_backup_to(&self, dir: &Path) -> AppResult<PathBuf> {
        self.require_admin()?;
        Ok(self.store.export_to_dir(dir, Utc::now())?)
    }

    /// Replace every user and transaction with the content of a backup.
    ///
    /// The signed-in admin stays signed in only if their id exists in the
    /// imported data.
    pub fn import_backup(&mut self, document: &str, confirmation: Confirmation) -> AppResult<Outcome<LedgerSnapshot>> {
        self.require_admin()?;
        if confirmation == Confirmation::Declined {
            return Ok(Outcome::Cancelled);
        }

        let snapshot = self.store.import(document)?;
        self.users = snapshot.users.clone();
        self.transactions = snapshot.transactions.clone();
        self.refresh_current();

        Ok(Outcome::Applied(snapshot))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn signed_in(&self) -> AppResult<&User> {
        self.current_user().ok_or(AppError::NotSignedIn)
    }

    fn require_admin(&self) -> AppResult<&User> {
        let me = self.signed_in()?;
        if !me.is_admin {
            return Err(DomainError::Unauthorized.into());
        }
        Ok(me)
    }

    fn execute(&mut self, command: LedgerCommand) -> AppResult<Transaction> {
        let update = handle(&self.users, &command)?;
        self.commit(update)
    }

    fn commit(&mut self, update: LedgerUpdate) -> AppResult<Transaction> {
        let history = self.store.record(&update, &self.transactions)?;
        let transaction = update.transaction;

        tracing::info!(
            transaction_id = %transaction.id,
            receiver_id = %transaction.receiver_id,
            amount = transaction.signed_amount(),
            system = transaction.is_system(),
            "points moved"
        );

        self.users = update.users;
        self.transactions = history;
        self.refresh_current();
        Ok(transaction)
    }

    fn delete(&mut self, user_id: &UserId) -> AppResult<()> {
        let remaining = remove_user(&self.users, user_id)?;
        self.store.save_users(&remaining)?;
        self.users = remaining;
        self.refresh_current();

        tracing::info!(user_id = %user_id, "member deleted");
        Ok(())
    }

    /// Drop the session if the signed-in member no longer exists.
    fn refresh_current(&mut self) {
        let gone = self
            .current
            .as_ref()
            .is_some_and(|id| find_by_id(&self.users, id).is_none());
        if gone {
            self.current = None;
        }
    }
}
