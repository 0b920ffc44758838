//! Bank state <-> key-value records.
//!
//! Scalars are stored as their text form, lists as JSON. Anything absent or
//! unreadable loads as its zero value so a damaged record never blocks startup.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use tracing::warn;

use super::PersistenceStore;
use crate::bank::{BankState, CountdownPhase, CountdownState, HistoryEntry, Ledger};
use crate::error::StoreError;

pub const BALANCE: &str = "balance";
pub const HISTORY: &str = "history";
pub const UNDO_STACK: &str = "undo_stack";
pub const NEXT_ID: &str = "next_id";
pub const COUNTDOWN_RUNNING: &str = "countdown.is_running";
pub const COUNTDOWN_STARTED_AT: &str = "countdown.started_at";
pub const COUNTDOWN_INITIAL: &str = "countdown.initial_remaining";
pub const COUNTDOWN_RUN_ID: &str = "countdown.run_id";

const ALL_KEYS: [&str; 8] = [
    BALANCE,
    HISTORY,
    UNDO_STACK,
    NEXT_ID,
    COUNTDOWN_RUNNING,
    COUNTDOWN_STARTED_AT,
    COUNTDOWN_INITIAL,
    COUNTDOWN_RUN_ID,
];

/// Write every key of `state`.
pub fn save<S: PersistenceStore + ?Sized>(store: &mut S, state: &BankState) -> Result<(), StoreError> {
    store.set(BALANCE, &state.balance.to_string())?;
    store.set(HISTORY, &encode(HISTORY, state.ledger.history())?)?;
    store.set(UNDO_STACK, &encode(UNDO_STACK, state.ledger.undo_stack())?)?;
    store.set(NEXT_ID, &state.ledger.next_id().to_string())?;
    save_countdown(store, &state.countdown)
}

/// Write only the balance. Used on countdown ticks.
pub fn save_balance<S: PersistenceStore + ?Sized>(store: &mut S, balance: u64) -> Result<(), StoreError> {
    store.set(BALANCE, &balance.to_string())
}

fn save_countdown<S: PersistenceStore + ?Sized>(
    store: &mut S,
    countdown: &CountdownState,
) -> Result<(), StoreError> {
    let running = countdown.phase != CountdownPhase::Idle;
    store.set(COUNTDOWN_RUNNING, if running { "true" } else { "false" })?;
    store.set(COUNTDOWN_STARTED_AT, &countdown.started_at_ms.to_string())?;
    store.set(COUNTDOWN_INITIAL, &countdown.initial_remaining.to_string())?;
    store.set(COUNTDOWN_RUN_ID, &countdown.run_id.to_string())
}

/// Read the persisted state, defaulting anything missing or corrupt.
///
/// A persisted running countdown comes back as `Running`; the engine decides
/// on restore whether it has since run out.
pub fn load<S: PersistenceStore + ?Sized>(store: &S) -> Result<BankState, StoreError> {
    let balance = read_scalar::<u64, _>(store, BALANCE)?.unwrap_or(0);
    let history: Vec<HistoryEntry> = read_json(store, HISTORY)?.unwrap_or_default();
    let undo_stack: Vec<HistoryEntry> = read_json(store, UNDO_STACK)?.unwrap_or_default();
    let next_id = read_scalar::<u64, _>(store, NEXT_ID)?;

    let running = read_scalar::<bool, _>(store, COUNTDOWN_RUNNING)?.unwrap_or(false);
    let countdown = CountdownState {
        phase: if running {
            CountdownPhase::Running
        } else {
            CountdownPhase::Idle
        },
        started_at_ms: read_scalar(store, COUNTDOWN_STARTED_AT)?.unwrap_or(0),
        initial_remaining: read_scalar(store, COUNTDOWN_INITIAL)?.unwrap_or(balance),
        run_id: read_scalar(store, COUNTDOWN_RUN_ID)?.unwrap_or(0),
    };

    Ok(BankState {
        balance,
        ledger: Ledger::from_parts(history, undo_stack, next_id),
        countdown,
    })
}

/// Run id of the persisted countdown while one is running or alarming.
pub fn active_run<S: PersistenceStore + ?Sized>(store: &S) -> Result<Option<u64>, StoreError> {
    if !read_scalar::<bool, _>(store, COUNTDOWN_RUNNING)?.unwrap_or(false) {
        return Ok(None);
    }
    Ok(Some(read_scalar(store, COUNTDOWN_RUN_ID)?.unwrap_or(0)))
}

/// Remove every persisted key.
pub fn clear<S: PersistenceStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    for key in ALL_KEYS {
        store.remove(key)?;
    }
    Ok(())
}

fn encode(key: &str, entries: &[HistoryEntry]) -> Result<String, StoreError> {
    serde_json::to_string(entries).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn read_scalar<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: FromStr,
    S: PersistenceStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(v) => Ok(Some(v)),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unreadable persisted value");
            Ok(None)
        }
    }
}

fn read_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: PersistenceStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!(key, error = %e, "ignoring unreadable persisted value");
            Ok(None)
        }
    }
}
