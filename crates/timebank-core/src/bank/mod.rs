mod countdown;
mod engine;
mod history;
mod policy;

pub use countdown::{remaining_at, CountdownPhase, CountdownState, Ticker};
pub use engine::{BankState, BankView, TimeBankEngine};
pub use history::{EntryKind, HistoryEntry, Ledger};
pub use policy::{BankPolicy, OverdraftPolicy, StopPolicy, TimeUnit};
