//! Read-side views over the collections (member list, histories).

use std::cmp::Reverse;

use pointswap_core::UserId;

use crate::transaction::Transaction;
use crate::user::{Points, User};

/// Members ranked by balance (highest first), ties broken by username.
pub fn members(users: &[User]) -> Vec<User> {
    let mut sorted = users.to_vec();
    sorted.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then_with(|| a.username.to_lowercase().cmp(&b.username.to_lowercase()))
    });
    sorted
}

/// Everyone a member can send points to.
pub fn recipients<'a>(users: &'a [User], current: &UserId) -> Vec<&'a User> {
    users.iter().filter(|u| &u.id != current).collect()
}

/// Exact username lookup (used to preselect a recipient from the member list).
pub fn find_by_username<'a>(users: &'a [User], username: &str) -> Option<&'a User> {
    users.iter().find(|u| u.username == username)
}

/// Transactions a member sent or received, newest first.
pub fn history_for(transactions: &[Transaction], user_id: &UserId) -> Vec<Transaction> {
    let mut mine: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.involves(user_id))
        .cloned()
        .collect();
    mine.sort_by_key(|t| Reverse(t.timestamp));
    mine
}

/// The `limit` most recent transactions across all members.
pub fn recent_activity(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut all = transactions.to_vec();
    all.sort_by_key(|t| Reverse(t.timestamp));
    all.truncate(limit);
    all
}

/// Sum of all balances.
pub fn total_points(users: &[User]) -> u128 {
    users.iter().map(|u| u128::from(u.balance)).sum()
}

/// Net points issued (positive) or withdrawn (negative) by system adjustments
/// as requested, before clamping.
pub fn requested_adjustments(transactions: &[Transaction]) -> i128 {
    transactions
        .iter()
        .filter(|t| t.is_system())
        .map(|t| i128::from(t.signed_amount()))
        .sum()
}

/// Balance of one member, if they exist.
pub fn balance_of(users: &[User], user_id: &UserId) -> Option<Points> {
    users.iter().find(|u| &u.id == user_id).map(|u| u.balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pointswap_core::TransactionId;

    use crate::transaction::TransactionKind;

    fn user(id: &str, name: &str, balance: Points) -> User {
        User {
            id: UserId::from(id),
            username: name.to_string(),
            password: None,
            balance,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    fn tx(id: &str, from: &str, to: &str, minutes: i64) -> Transaction {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Transaction {
            id: TransactionId::from(id),
            kind: TransactionKind::Transfer {
                sender_id: UserId::from(from),
                sender_name: from.to_string(),
                amount: 1,
            },
            receiver_id: UserId::from(to),
            receiver_name: to.to_string(),
            timestamp: base + Duration::minutes(minutes),
        }
    }

    #[test]
    fn members_sorted_by_balance_then_name() {
        let users = vec![user("1", "zoe", 10), user("2", "amy", 10), user("3", "bob", 99)];
        let names: Vec<_> = members(&users).into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["bob", "amy", "zoe"]);
    }

    #[test]
    fn recipients_exclude_current_member() {
        let users = vec![user("1", "a", 1), user("2", "b", 1)];
        let others = recipients(&users, &UserId::from("1"));
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].username, "b");
        assert_eq!(find_by_username(&users, "b").map(|u| u.id.clone()), Some(UserId::from("2")));
    }

    #[test]
    fn history_is_filtered_and_newest_first() {
        let txs = vec![tx("t1", "1", "2", 0), tx("t2", "3", "1", 5), tx("t3", "2", "3", 9)];
        let ids: Vec<_> = history_for(&txs, &UserId::from("1"))
            .into_iter()
            .map(|t| t.id.into_inner())
            .collect();
        assert_eq!(ids, vec!["t2", "t1"]);
    }

    #[test]
    fn recent_activity_truncates() {
        let txs: Vec<_> = (0..60).map(|i| tx(&format!("t{i}"), "1", "2", i)).collect();
        let recent = recent_activity(&txs, 50);
        assert_eq!(recent.len(), 50);
        assert_eq!(recent[0].id, TransactionId::from("t59"));
    }

    #[test]
    fn totals() {
        let users = vec![user("1", "a", 3), user("2", "b", 4)];
        assert_eq!(total_points(&users), 7);
        assert_eq!(balance_of(&users, &UserId::from("2")), Some(4));
        assert_eq!(balance_of(&users, &UserId::from("9")), None);
        assert_eq!(requested_adjustments(&[tx("t", "1", "2", 0)]), 0);
    }
}
