//! # Timebank Core Library
//!
//! This library provides the core logic for Timebank: a balance of time that
//! the user adds to or spends, with a history log, single-step undo and an
//! optional countdown that sounds an alarm when the balance runs out.
//!
//! ## Architecture
//!
//! - **Bank Engine**: A wall-clock-based state machine. Commands take the
//!   current time explicitly and the caller periodically invokes `tick()`
//!   while a countdown runs
//! - **Storage**: Key-value persistence (SQLite or in-memory) and TOML-based
//!   configuration
//! - **Session**: Applies commands, persists afterwards, and drives the
//!   rendering and alarm collaborators
//!
//! ## Key Components
//!
//! - [`TimeBankEngine`]: Core balance/history/countdown state machine
//! - [`BankSession`]: Engine bound to a [`PersistenceStore`]
//! - [`Database`]: SQLite key-value store
//! - [`Config`]: Application configuration management

pub mod bank;
pub mod error;
pub mod events;
pub mod format;
pub mod session;
pub mod storage;

pub use bank::{
    BankPolicy, BankState, BankView, CountdownPhase, EntryKind, HistoryEntry, OverdraftPolicy,
    StopPolicy, TimeBankEngine, TimeUnit,
};
pub use error::{BankError, ConfigError, CoreError, StoreError};
pub use events::Event;
pub use format::{describe_entry, format_balance, format_hhmmss, DurationInput};
pub use session::{now_ms, AlarmSignal, BankSession, DisplayRenderer};
pub use storage::{Config, Database, MemoryStore, PersistenceStore};
