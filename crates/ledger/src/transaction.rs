use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pointswap_core::{DomainError, Entity, TransactionId, UserId};

use crate::user::Points;

/// Sender name recorded on system adjustments.
pub const SYSTEM_LABEL: &str = "ADMINISTRATION";

/// What moved, and who it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// Points moved from one member to another (peer or admin-forced).
    Transfer {
        sender_id: UserId,
        sender_name: String,
        /// Always > 0.
        amount: Points,
    },
    /// Admin-issued change with no debited member. `delta` keeps its sign.
    SystemAdjustment { label: String, delta: i64 },
}

/// Immutable record of one balance movement (append-only).
///
/// Serialized as the flat `{id, senderId, senderName, receiverId,
/// receiverName, amount, timestamp}` record; a `senderId` of `"SYSTEM"` marks
/// a system adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord", into = "TransactionRecord")]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub receiver_id: UserId,
    pub receiver_name: String,
    pub timestamp: DateTime<Utc>,
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Transaction {
    /// The debited member, or `None` for system adjustments.
    pub fn sender_id(&self) -> Option<&UserId> {
        match &self.kind {
            TransactionKind::Transfer { sender_id, .. } => Some(sender_id),
            TransactionKind::SystemAdjustment { .. } => None,
        }
    }

    pub fn sender_name(&self) -> &str {
        match &self.kind {
            TransactionKind::Transfer { sender_name, .. } => sender_name,
            TransactionKind::SystemAdjustment { label, .. } => label,
        }
    }

    /// Amount as stored on the wire: positive for transfers, signed for adjustments.
    pub fn signed_amount(&self) -> i64 {
        match &self.kind {
            TransactionKind::Transfer { amount, .. } => i64::try_from(*amount).unwrap_or(i64::MAX),
            TransactionKind::SystemAdjustment { delta, .. } => *delta,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self.kind, TransactionKind::SystemAdjustment { .. })
    }

    /// True if `user_id` sent or received this transaction.
    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.receiver_id == user_id || self.sender_id() == Some(user_id)
    }
}

/// Flat wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord {
    id: TransactionId,
    sender_id: UserId,
    sender_name: String,
    receiver_id: UserId,
    receiver_name: String,
    amount: i64,
    timestamp: DateTime<Utc>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = DomainError;

    fn try_from(r: TransactionRecord) -> Result<Self, Self::Error> {
        let kind = if r.sender_id.is_system() {
            TransactionKind::SystemAdjustment {
                label: r.sender_name,
                delta: r.amount,
            }
        } else {
            let amount = Points::try_from(r.amount)
                .ok()
                .filter(|a| *a > 0)
                .ok_or_else(|| {
                    DomainError::validation(format!("transaction {}: amount must be positive", r.id))
                })?;
            TransactionKind::Transfer {
                sender_id: r.sender_id,
                sender_name: r.sender_name,
                amount,
            }
        };

        Ok(Self {
            id: r.id,
            kind,
            receiver_id: r.receiver_id,
            receiver_name: r.receiver_name,
            timestamp: r.timestamp,
        })
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(t: Transaction) -> Self {
        let amount = t.signed_amount();
        let (sender_id, sender_name) = match t.kind {
            TransactionKind::Transfer { sender_id, sender_name, .. } => (sender_id, sender_name),
            TransactionKind::SystemAdjustment { label, .. } => (UserId::system(), label),
        };

        Self {
            id: t.id,
            sender_id,
            sender_name,
            receiver_id: t.receiver_id,
            receiver_name: t.receiver_name,
            amount,
            timestamp: t.timestamp,
        }
    }
}
