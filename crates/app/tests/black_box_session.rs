use std::collections::HashSet;
use std::sync::Arc;

use pointswap_app::{AppError, Confirmation, Outcome, PointSwap, PointSwapConfig};
use pointswap_core::UserId;
use pointswap_ledger::views;
use pointswap_store::{FileStorage, ImportError, InMemoryStorage, KeyValueStorage, LedgerStore};

fn in_memory() -> PointSwap<Arc<InMemoryStorage>> {
    PointSwap::open(
        LedgerStore::new(Arc::new(InMemoryStorage::new())),
        PointSwapConfig::default(),
    )
}

/// Registers admin, alice and bob; leaves admin signed in.
fn seeded<S: KeyValueStorage>(app: &mut PointSwap<S>) -> (UserId, UserId) {
    let alice = app.register("alice", "pw").unwrap().id;
    let bob = app.register("bob", "pw").unwrap().id;
    let admin = app.register("Admin", "root").unwrap();
    assert!(admin.is_admin);
    (alice, bob)
}

fn ids<T: serde::Serialize>(items: &[T]) -> HashSet<String> {
    items
        .iter()
        .map(|item| serde_json::to_string(item).unwrap())
        .collect()
}

#[test]
fn member_flow_transfer_and_history() {
    let mut app = in_memory();
    let (alice, bob) = seeded(&mut app);
    app.logout();

    app.login("alice", "pw").unwrap();
    let recipients: Vec<_> = app.recipients().unwrap().into_iter().map(|u| u.id.clone()).collect();
    assert!(!recipients.contains(&alice));
    assert!(recipients.contains(&bob));

    let before = views::total_points(app.users());
    let tx = app.send_points(&bob, 30).unwrap();
    assert_eq!(tx.signed_amount(), 30);
    assert_eq!(views::total_points(app.users()), before);

    assert_eq!(views::balance_of(app.users(), &alice), Some(70));
    assert_eq!(views::balance_of(app.users(), &bob), Some(130));

    let history = app.my_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, tx.id);

    let ranking: Vec<_> = app.members().into_iter().map(|u| u.username).collect();
    assert_eq!(ranking, vec!["bob", "Admin", "alice"]);
}

#[test]
fn rejected_transfers_leave_balances_unchanged() {
    let mut app = in_memory();
    let (alice, bob) = seeded(&mut app);
    app.logout();
    app.login("alice", "pw").unwrap();

    for (to, amount) in [(&bob, 0), (&bob, -3), (&bob, 101), (&alice, 5), (&UserId::from("ghost"), 5)] {
        let err = app.send_points(to, amount).unwrap_err();
        assert_eq!(err.code(), "validation_error", "{to} {amount}");
    }

    assert!(app.transactions().is_empty());
    assert!(app.users().iter().all(|u| u.balance == 100));
}

#[test]
fn admin_adjustments_and_forced_transfers() {
    let mut app = in_memory();
    let (alice, bob) = seeded(&mut app);

    let tx = app.adjust_points(&alice, -500).unwrap();
    assert!(tx.is_system());
    assert_eq!(tx.signed_amount(), -500);
    assert_eq!(views::balance_of(app.users(), &alice), Some(0));

    app.adjust_points(&bob, 500).unwrap();
    assert_eq!(views::balance_of(app.users(), &bob), Some(600));

    let tx = app.force_transfer(&bob, &alice, 250).unwrap();
    assert_eq!(tx.sender_name(), "bob (Admin)");
    assert_eq!(views::balance_of(app.users(), &alice), Some(250));
    assert_eq!(views::balance_of(app.users(), &bob), Some(350));

    assert!(app.force_transfer(&bob, &bob, 1).is_err());
    assert!(app.force_transfer(&alice, &bob, 251).is_err());

    let activity = app.recent_activity().unwrap();
    assert_eq!(activity.len(), 3);
    assert_eq!(activity[0].id, tx.id);
}

#[test]
fn admin_deletes_member_with_confirmation() {
    let mut app = in_memory();
    let (alice, _bob) = seeded(&mut app);

    assert_eq!(
        app.delete_member(&alice, Confirmation::Declined).unwrap(),
        Outcome::Cancelled
    );
    assert!(app.delete_member(&alice, Confirmation::Confirmed).unwrap().is_applied());
    assert_eq!(views::balance_of(app.users(), &alice), None);
    assert!(app.store().load_users().iter().all(|u| u.id != alice));

    let err = app.delete_member(&alice, Confirmation::Confirmed).unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn export_import_round_trip_across_stores() {
    let mut source = in_memory();
    let (alice, bob) = seeded(&mut source);
    source.adjust_points(&alice, 40).unwrap();
    source.force_transfer(&alice, &bob, 15).unwrap();

    let document = source.export_backup().unwrap();
    assert_eq!(document.version, "1.1");
    let json = document.to_json_pretty().unwrap();

    let mut target = in_memory();
    target.register("admin", "other").unwrap();
    let outcome = target.import_backup(&json, Confirmation::Confirmed).unwrap();
    assert!(outcome.is_applied());

    assert_eq!(ids(target.users()), ids(source.users()));
    assert_eq!(ids(target.transactions()), ids(source.transactions()));
    // The importing admin's own account was replaced by the backup's.
    assert!(target.current_user().is_none());
}

#[test]
fn invalid_import_is_rejected_without_side_effects() {
    let mut app = in_memory();
    seeded(&mut app);
    let users_before = app.store().load_users();

    for document in ["{]", r#"{"users": "nope"}"#, r#"{"transactions": []}"#] {
        let err = app.import_backup(document, Confirmation::Confirmed).unwrap_err();
        assert!(matches!(err, AppError::Import(_)), "{document}: {err:?}");
    }
    assert!(matches!(
        app.import_backup(r#"{"users": []}"#, Confirmation::Declined),
        Ok(Outcome::Cancelled)
    ));

    assert_eq!(app.store().load_users(), users_before);
    assert_eq!(app.users(), users_before.as_slice());
    assert!(app.current_user().is_some());

    assert!(matches!(
        app.import_backup("[]", Confirmation::Confirmed),
        Err(AppError::Import(ImportError::MissingUsers))
    ));
}

#[test]
fn file_backed_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = PointSwapConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..PointSwapConfig::default()
    };

    let (alice, bob) = {
        let storage = FileStorage::open(config.resolve_data_dir().unwrap()).unwrap();
        let mut app = PointSwap::open(LedgerStore::new(storage), config.clone());
        let ids = seeded(&mut app);
        app.force_transfer(&ids.0, &ids.1, 60).unwrap();

        let backup = app.export_backup_to(dir.path()).unwrap();
        assert!(backup.file_name().unwrap().to_string_lossy().starts_with("pointswap_backup_"));
        ids
    };

    let storage = FileStorage::open(dir.path()).unwrap();
    let mut app = PointSwap::open(LedgerStore::new(storage), config);
    assert_eq!(app.users().len(), 3);
    assert_eq!(app.transactions().len(), 1);
    assert!(app.current_user().is_none());

    app.login("bob", "pw").unwrap();
    assert_eq!(views::balance_of(app.users(), &bob), Some(160));
    assert_eq!(views::balance_of(app.users(), &alice), Some(40));
}

#[test]
fn corrupt_storage_starts_empty() {
    let storage = InMemoryStorage::new()
        .with_entry("pointswap_users", "{{{")
        .with_entry("pointswap_transactions", "null");
    let mut app = PointSwap::open(LedgerStore::new(storage), PointSwapConfig::default());

    assert!(app.users().is_empty());
    assert!(app.transactions().is_empty());

    // Still usable: the first write replaces the corrupt payload.
    app.register("admin", "pw").unwrap();
    assert_eq!(app.store().load_users().len(), 1);
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut app = in_memory();
    app.register("Zed", "pw").unwrap();
    let err = app.register("zED", "pw2").unwrap_err();
    assert_eq!(err.code(), "validation_error");
    assert_eq!(app.users().len(), 1);
}
