//! Countdown bookkeeping.
//!
//! Remaining time is never decremented in place. It is derived from the
//! anchor (`started_at_ms`, `initial_remaining`) and the current wall clock,
//! so missed ticks and reloads cannot skew it.

use serde::{Deserialize, Serialize};

use super::policy::TimeUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownPhase {
    #[default]
    Idle,
    Running,
    /// Balance reached zero; the alarm loops until acknowledged.
    Alarming,
}

/// Token handed out on every start. Ticks carrying an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub run_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountdownState {
    pub phase: CountdownPhase,
    /// Anchor timestamp (epoch milliseconds) of the current run.
    pub started_at_ms: u64,
    /// Balance at the anchor.
    pub initial_remaining: u64,
    pub run_id: u64,
}

/// `max(0, initial_remaining - floor((now - started_at) / unit))`.
pub fn remaining_at(initial_remaining: u64, started_at_ms: u64, now_ms: u64, unit: TimeUnit) -> u64 {
    initial_remaining.saturating_sub(unit.elapsed_units(started_at_ms, now_ms))
}

impl CountdownState {
    pub fn is_active(&self) -> bool {
        self.phase != CountdownPhase::Idle
    }

    pub fn ticker(&self) -> Option<Ticker> {
        (self.phase == CountdownPhase::Running).then_some(Ticker {
            run_id: self.run_id,
        })
    }

    /// Anchor a new run at `now_ms` with `balance` remaining.
    pub(crate) fn anchor(&mut self, balance: u64, now_ms: u64) -> Ticker {
        self.run_id += 1;
        self.phase = CountdownPhase::Running;
        self.started_at_ms = now_ms;
        self.initial_remaining = balance;
        Ticker {
            run_id: self.run_id,
        }
    }

    pub fn elapsed_units(&self, now_ms: u64, unit: TimeUnit) -> u64 {
        unit.elapsed_units(self.started_at_ms, now_ms)
    }

    pub fn remaining(&self, now_ms: u64, unit: TimeUnit) -> u64 {
        remaining_at(self.initial_remaining, self.started_at_ms, now_ms, unit)
    }
}
