//! Transfer engine: pure balance updates.
//!
//! Every operation takes the current user collection plus a command and
//! returns the next collection together with the transaction to record. No IO
//! happens here; the command carries the transaction id and timestamp so the
//! result is fully determined by the inputs.

use chrono::{DateTime, Utc};

use pointswap_core::{DomainError, DomainResult, TransactionId, UserId, find_by_id};

use crate::transaction::{SYSTEM_LABEL, Transaction, TransactionKind};
use crate::user::{Points, User, set_balance};

/// Next state of the user collection plus the transaction that explains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerUpdate {
    pub users: Vec<User>,
    pub transaction: Transaction,
}

/// Command: a member sends points to another member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerTransfer {
    pub transaction_id: TransactionId,
    pub sender_id: UserId,
    /// Blank when the member has not picked a recipient yet.
    pub receiver_id: UserId,
    pub amount: i64,
    pub occurred_at: DateTime<Utc>,
}

impl PeerTransfer {
    pub fn now(sender_id: UserId, receiver_id: UserId, amount: i64) -> Self {
        Self {
            transaction_id: TransactionId::generate("tx"),
            sender_id,
            receiver_id,
            amount,
            occurred_at: Utc::now(),
        }
    }
}

/// Command: an admin moves points between two other members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedTransfer {
    pub transaction_id: TransactionId,
    pub from_id: UserId,
    pub to_id: UserId,
    pub amount: i64,
    pub occurred_at: DateTime<Utc>,
}

impl ForcedTransfer {
    pub fn now(from_id: UserId, to_id: UserId, amount: i64) -> Self {
        Self {
            transaction_id: TransactionId::generate("admin-xfer"),
            from_id,
            to_id,
            amount,
            occurred_at: Utc::now(),
        }
    }
}

/// Command: an admin credits or debits a member out of thin air.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceAdjustment {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

impl BalanceAdjustment {
    pub fn now(user_id: UserId, delta: i64) -> Self {
        Self {
            transaction_id: TransactionId::generate("admin-adj"),
            user_id,
            delta,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    Transfer(PeerTransfer),
    ForcedTransfer(ForcedTransfer),
    Adjust(BalanceAdjustment),
}

/// Dispatch any ledger command.
pub fn handle(users: &[User], command: &LedgerCommand) -> DomainResult<LedgerUpdate> {
    match command {
        LedgerCommand::Transfer(cmd) => peer_transfer(users, cmd),
        LedgerCommand::ForcedTransfer(cmd) => forced_transfer(users, cmd),
        LedgerCommand::Adjust(cmd) => adjust_balance(users, cmd),
    }
}

/// Move `amount` from the sender to the receiver.
pub fn peer_transfer(users: &[User], cmd: &PeerTransfer) -> DomainResult<LedgerUpdate> {
    if is_blank(&cmd.receiver_id) {
        return Err(DomainError::validation("choose a recipient"));
    }

    let amount = positive_amount(cmd.amount)?;

    let sender = find_by_id(users, &cmd.sender_id)
        .ok_or_else(|| DomainError::validation("unknown sender"))?;

    if amount > sender.balance {
        return Err(DomainError::validation("insufficient balance"));
    }

    let receiver = find_by_id(users, &cmd.receiver_id)
        .filter(|r| r.id != sender.id)
        .ok_or_else(|| DomainError::validation("invalid recipient"))?;

    move_points(
        users,
        sender,
        receiver,
        amount,
        sender.username.clone(),
        &cmd.transaction_id,
        cmd.occurred_at,
    )
}

/// Same contract as [`peer_transfer`], initiated by an admin on behalf of `from_id`.
pub fn forced_transfer(users: &[User], cmd: &ForcedTransfer) -> DomainResult<LedgerUpdate> {
    if is_blank(&cmd.from_id) || is_blank(&cmd.to_id) {
        return Err(DomainError::validation("choose both members"));
    }
    if cmd.from_id == cmd.to_id {
        return Err(DomainError::validation("cannot transfer to the same member"));
    }

    let amount = positive_amount(cmd.amount)?;

    let from = find_by_id(users, &cmd.from_id)
        .ok_or_else(|| DomainError::validation("unknown source member"))?;
    let to = find_by_id(users, &cmd.to_id)
        .ok_or_else(|| DomainError::validation("unknown target member"))?;

    if amount > from.balance {
        return Err(DomainError::validation("insufficient balance"));
    }

    move_points(
        users,
        from,
        to,
        amount,
        format!("{} (Admin)", from.username),
        &cmd.transaction_id,
        cmd.occurred_at,
    )
}

/// Apply a signed delta, clamping the result at zero.
///
/// The recorded transaction carries the requested delta, not the effective
/// change after clamping.
pub fn adjust_balance(users: &[User], cmd: &BalanceAdjustment) -> DomainResult<LedgerUpdate> {
    let user = find_by_id(users, &cmd.user_id)
        .ok_or_else(|| DomainError::validation("choose a member"))?;

    let balance = if cmd.delta >= 0 {
        user.balance
            .checked_add(cmd.delta.unsigned_abs())
            .ok_or_else(|| DomainError::validation("balance overflow"))?
    } else {
        user.balance.saturating_sub(cmd.delta.unsigned_abs())
    };

    Ok(LedgerUpdate {
        users: set_balance(users, &user.id, balance),
        transaction: Transaction {
            id: cmd.transaction_id.clone(),
            kind: TransactionKind::SystemAdjustment {
                label: SYSTEM_LABEL.to_string(),
                delta: cmd.delta,
            },
            receiver_id: user.id.clone(),
            receiver_name: user.username.clone(),
            timestamp: cmd.occurred_at,
        },
    })
}

fn is_blank(id: &UserId) -> bool {
    id.as_str().trim().is_empty()
}

fn positive_amount(amount: i64) -> DomainResult<Points> {
    if amount <= 0 {
        return Err(DomainError::validation("amount must be positive"));
    }
    Ok(amount.unsigned_abs())
}

fn move_points(
    users: &[User],
    from: &User,
    to: &User,
    amount: Points,
    sender_name: String,
    transaction_id: &TransactionId,
    occurred_at: DateTime<Utc>,
) -> DomainResult<LedgerUpdate> {
    let debited = from.balance - amount;
    let credited = to
        .balance
        .checked_add(amount)
        .ok_or_else(|| DomainError::validation("balance overflow"))?;

    let next = set_balance(users, &from.id, debited);
    let next = set_balance(&next, &to.id, credited);

    Ok(LedgerUpdate {
        users: next,
        transaction: Transaction {
            id: transaction_id.clone(),
            kind: TransactionKind::Transfer {
                sender_id: from.id.clone(),
                sender_name,
                amount,
            },
            receiver_id: to.id.clone(),
            receiver_name: to.username.clone(),
            timestamp: occurred_at,
        },
    })
}
