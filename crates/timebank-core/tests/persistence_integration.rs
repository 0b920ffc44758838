//! Integration tests for persisting and reloading a bank.

use timebank_core::storage::snapshot;
use timebank_core::{
    BankPolicy, BankSession, CountdownPhase, Database, MemoryStore, OverdraftPolicy,
    PersistenceStore, TimeUnit,
};

const T: u64 = 1_700_000_000_000;

#[test]
fn reload_from_disk_preserves_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timebank.db");

    let expected = {
        let db = Database::open_at(&path).unwrap();
        let mut session = BankSession::open(db, BankPolicy::default(), T).unwrap();
        session.add_time(3_600, T).unwrap();
        session.subtract_time(600, T + 1_000).unwrap();
        session.add_time(60, T + 2_000).unwrap();
        session.undo(T + 3_000).unwrap();
        session.engine().state().clone()
    };

    let db = Database::open_at(&path).unwrap();
    let session = BankSession::open(db, BankPolicy::default(), T + 10_000).unwrap();
    assert_eq!(session.engine().state(), &expected);
    assert_eq!(session.engine().balance(), 3_000);
    assert!(session.engine().can_undo());
}

#[test]
fn reload_long_after_start_lands_in_alarm() {
    let mut store = MemoryStore::new();
    store.set(snapshot::BALANCE, "10").unwrap();
    store.set(snapshot::COUNTDOWN_RUNNING, "true").unwrap();
    store.set(snapshot::COUNTDOWN_STARTED_AT, &T.to_string()).unwrap();

    let session = BankSession::open(store, BankPolicy::default(), T + 30_000).unwrap();
    assert_eq!(session.engine().balance(), 0);
    assert_eq!(session.engine().countdown_phase(), CountdownPhase::Alarming);
}

#[test]
fn reload_does_not_count_elapsed_time_twice() {
    let mut session = BankSession::open(MemoryStore::new(), BankPolicy::default(), T).unwrap();
    session.add_time(100, T).unwrap();
    session.start_countdown(T).unwrap();
    let run_id = session.engine().ticker().unwrap().run_id;
    session.tick(run_id, T + 20_000).unwrap();

    // Balance is persisted as 80 by the tick; the anchor still says 100 at T.
    let store = session.into_store();
    let session = BankSession::open(store, BankPolicy::default(), T + 30_000).unwrap();
    assert_eq!(session.engine().balance(), 70);
}

#[test]
fn strict_policy_rejects_without_writing() {
    let policy = BankPolicy {
        overdraft: OverdraftPolicy::Reject,
        ..BankPolicy::default()
    };
    let mut session = BankSession::open(MemoryStore::new(), policy, T).unwrap();
    session.add_time(5, T).unwrap();
    assert!(session.subtract_time(6, T).is_err());

    let session = BankSession::open(session.into_store(), policy, T).unwrap();
    assert_eq!(session.engine().balance(), 5);
    assert_eq!(session.engine().history().len(), 1);
}

#[test]
fn minute_bank_counts_down_in_minutes() {
    let policy = BankPolicy {
        unit: TimeUnit::Minutes,
        ..BankPolicy::default()
    };
    let mut session = BankSession::open(MemoryStore::new(), policy, T).unwrap();
    session.add_time(3, T).unwrap();
    session.start_countdown(T).unwrap();
    let run_id = session.engine().ticker().unwrap().run_id;

    session.tick(run_id, T + 59_000).unwrap();
    assert_eq!(session.engine().balance(), 3);
    session.tick(run_id, T + 61_000).unwrap();
    assert_eq!(session.engine().balance(), 2);
    session.stop_countdown(T + 125_000).unwrap();
    assert_eq!(session.engine().balance(), 1);
    assert_eq!(session.engine().history().last().unwrap().amount, 2);
}

#[test]
fn second_writer_stopping_countdown_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timebank.db");

    let db = Database::open_at(&path).unwrap();
    let mut watcher = BankSession::open(db, BankPolicy::default(), T).unwrap();
    watcher.add_time(100, T).unwrap();
    watcher.start_countdown(T).unwrap();
    assert!(!watcher.countdown_superseded().unwrap());

    let db = Database::open_at(&path).unwrap();
    let mut other = BankSession::open(db, BankPolicy::default(), T + 10_000).unwrap();
    other.stop_countdown(T + 10_000).unwrap().unwrap();

    assert!(watcher.countdown_superseded().unwrap());
    assert_eq!(
        watcher.store().get(snapshot::BALANCE).unwrap().as_deref(),
        Some("90")
    );
}

#[test]
fn restarted_countdown_supersedes_old_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timebank.db");

    let db = Database::open_at(&path).unwrap();
    let mut watcher = BankSession::open(db, BankPolicy::default(), T).unwrap();
    watcher.add_time(100, T).unwrap();
    watcher.start_countdown(T).unwrap();

    let db = Database::open_at(&path).unwrap();
    let mut other = BankSession::open(db, BankPolicy::default(), T + 5_000).unwrap();
    other.stop_countdown(T + 5_000).unwrap();
    other.start_countdown(T + 6_000).unwrap();

    assert!(watcher.countdown_superseded().unwrap());
    assert!(!other.countdown_superseded().unwrap());
}
