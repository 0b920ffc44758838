//! Time bank engine.
//!
//! The engine is a wall-clock-based state machine over a balance, a history
//! log and an undo stack. It does not use internal threads or read the clock:
//! every command takes `now_ms` and the caller drives `tick()` periodically.
//!
//! ## Countdown Transitions
//!
//! ```text
//! Idle -> Running -> Alarming -> Idle
//!            \-------------------^ (manual stop)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimeBankEngine::new(BankPolicy::default());
//! engine.add_time(600, now_ms())?;
//! engine.start_countdown(now_ms())?;
//! // Once per second:
//! engine.tick(ticker.run_id, now_ms()); // Some(Event::AlarmRaised { .. }) at zero
//! ```

use serde::Serialize;
use tracing::{debug, info};

use super::countdown::{CountdownPhase, CountdownState, Ticker};
use super::history::{EntryKind, HistoryEntry, Ledger};
use super::policy::{BankPolicy, OverdraftPolicy, StopPolicy, TimeUnit};
use crate::error::BankError;
use crate::events::{at, Event};

/// Everything that survives a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BankState {
    pub balance: u64,
    #[serde(flatten)]
    pub ledger: Ledger,
    pub countdown: CountdownState,
}

/// What a renderer needs after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankView {
    pub balance: u64,
    pub unit: TimeUnit,
    /// Insertion order; renderers choose their own display order.
    pub history: Vec<HistoryEntry>,
    pub can_undo: bool,
    pub countdown: CountdownPhase,
}

/// Core time bank engine.
#[derive(Debug, Clone)]
pub struct TimeBankEngine {
    state: BankState,
    policy: BankPolicy,
}

impl TimeBankEngine {
    /// Empty bank: zero balance, no history, countdown idle.
    pub fn new(policy: BankPolicy) -> Self {
        Self {
            state: BankState::default(),
            policy,
        }
    }

    /// Rebuild an engine from persisted state.
    ///
    /// A countdown that was running is re-evaluated against `now_ms`
    /// straight away; if it ran out while nobody was watching it comes back
    /// as `Alarming`.
    pub fn restore(state: BankState, policy: BankPolicy, now_ms: u64) -> Self {
        let mut engine = Self { state, policy };
        if engine.state.countdown.phase == CountdownPhase::Running {
            let remaining = engine.state.countdown.remaining(now_ms, policy.unit);
            engine.state.balance = remaining;
            if remaining == 0 {
                engine.state.countdown.phase = CountdownPhase::Alarming;
                info!(run_id = engine.state.countdown.run_id, "countdown exhausted while away");
            } else {
                info!(remaining, "resuming countdown after reload");
            }
        }
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn balance(&self) -> u64 {
        self.state.balance
    }

    pub fn policy(&self) -> BankPolicy {
        self.policy
    }

    pub fn state(&self) -> &BankState {
        &self.state
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.state.ledger.history()
    }

    pub fn can_undo(&self) -> bool {
        self.state.ledger.can_undo()
    }

    pub fn countdown_phase(&self) -> CountdownPhase {
        self.state.countdown.phase
    }

    /// Token for the running countdown, if any.
    pub fn ticker(&self) -> Option<Ticker> {
        self.state.countdown.ticker()
    }

    pub fn view(&self) -> BankView {
        BankView {
            balance: self.state.balance,
            unit: self.policy.unit,
            history: self.state.ledger.history().to_vec(),
            can_undo: self.can_undo(),
            countdown: self.state.countdown.phase,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now_ms: u64) -> Event {
        Event::StateSnapshot {
            balance: self.state.balance,
            unit: self.policy.unit,
            phase: self.state.countdown.phase,
            can_undo: self.can_undo(),
            history_len: self.history().len(),
            at: at(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add_time(&mut self, amount: i64, now_ms: u64) -> Result<Event, BankError> {
        let amount = self.admit(amount)?;
        self.state.balance = self.state.balance.saturating_add(amount);
        let entry = self.state.ledger.record(EntryKind::Add, amount, amount, now_ms);
        debug!(amount, balance = self.state.balance, "time added");
        Ok(Event::TimeAdded {
            entry,
            balance: self.state.balance,
            at: at(now_ms),
        })
    }

    pub fn subtract_time(&mut self, amount: i64, now_ms: u64) -> Result<Event, BankError> {
        let amount = self.admit(amount)?;
        let balance = self.state.balance;
        if amount > balance && self.policy.overdraft == OverdraftPolicy::Reject {
            return Err(BankError::InsufficientBalance {
                requested: amount,
                balance,
            });
        }
        let applied = amount.min(balance);
        self.state.balance = balance - applied;
        let entry = self
            .state
            .ledger
            .record(EntryKind::Subtract, amount, applied, now_ms);
        debug!(amount, applied, balance = self.state.balance, "time subtracted");
        Ok(Event::TimeSubtracted {
            entry,
            balance: self.state.balance,
            clamped: applied < amount,
            at: at(now_ms),
        })
    }

    /// Reverse the most recent mutation. `None` when there is nothing to undo.
    pub fn undo(&mut self, now_ms: u64) -> Result<Option<Event>, BankError> {
        if self.state.countdown.is_active() {
            return Err(BankError::CountdownActive);
        }
        let Some(entry) = self.state.ledger.pop_undo() else {
            return Ok(None);
        };
        self.state.balance = entry.revert(self.state.balance);
        debug!(id = entry.id, balance = self.state.balance, "undone");
        Ok(Some(Event::Undone {
            entry,
            balance: self.state.balance,
            at: at(now_ms),
        }))
    }

    /// Anchor a countdown at `now_ms` with the current balance.
    ///
    /// An empty balance goes straight to `Alarming`.
    pub fn start_countdown(&mut self, now_ms: u64) -> Result<Event, BankError> {
        if self.state.countdown.is_active() {
            return Err(BankError::CountdownActive);
        }
        let ticker = self.state.countdown.anchor(self.state.balance, now_ms);
        info!(run_id = ticker.run_id, balance = self.state.balance, "countdown started");
        if self.state.balance == 0 {
            return Ok(self.raise_alarm(now_ms));
        }
        Ok(Event::CountdownStarted {
            run_id: ticker.run_id,
            initial_remaining: self.state.balance,
            at: at(now_ms),
        })
    }

    /// Call periodically with the token from `start_countdown`.
    ///
    /// Recomputes the balance from the anchor; the number of ticks that
    /// actually fired does not matter. Stale tokens and non-running phases
    /// are ignored.
    pub fn tick(&mut self, run_id: u64, now_ms: u64) -> Option<Event> {
        let countdown = self.state.countdown;
        if countdown.phase != CountdownPhase::Running || countdown.run_id != run_id {
            debug!(run_id, current = countdown.run_id, "ignoring stale tick");
            return None;
        }
        let remaining = countdown.remaining(now_ms, self.policy.unit);
        self.state.balance = remaining;
        if remaining == 0 {
            return Some(self.raise_alarm(now_ms));
        }
        Some(Event::CountdownTick {
            run_id,
            remaining,
            at: at(now_ms),
        })
    }

    /// Stop the countdown or acknowledge the alarm. `None` when idle.
    pub fn stop_countdown(&mut self, now_ms: u64) -> Option<Event> {
        match self.state.countdown.phase {
            CountdownPhase::Idle => None,
            CountdownPhase::Alarming => Some(self.silence(now_ms)),
            CountdownPhase::Running => {
                let unit = self.policy.unit;
                let remaining = self.state.countdown.remaining(now_ms, unit);
                if remaining == 0 {
                    return Some(self.silence(now_ms));
                }
                let elapsed = self.state.countdown.elapsed_units(now_ms, unit);
                self.state.balance = remaining;
                self.state.countdown.phase = CountdownPhase::Idle;
                let consumed = match self.policy.stop {
                    StopPolicy::RecordConsumed if elapsed > 0 => Some(self.state.ledger.record(
                        EntryKind::CountdownConsumed,
                        elapsed,
                        elapsed,
                        now_ms,
                    )),
                    _ => None,
                };
                info!(elapsed, balance = remaining, "countdown stopped");
                Some(Event::CountdownStopped {
                    consumed,
                    balance: remaining,
                    at: at(now_ms),
                })
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Validate a manual mutation request.
    fn admit(&self, amount: i64) -> Result<u64, BankError> {
        if self.state.countdown.is_active() {
            return Err(BankError::CountdownActive);
        }
        match u64::try_from(amount) {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(BankError::invalid_amount(amount)),
        }
    }

    fn raise_alarm(&mut self, now_ms: u64) -> Event {
        self.state.balance = 0;
        self.state.countdown.phase = CountdownPhase::Alarming;
        info!(run_id = self.state.countdown.run_id, "countdown exhausted");
        Event::AlarmRaised {
            run_id: self.state.countdown.run_id,
            at: at(now_ms),
        }
    }

    fn silence(&mut self, now_ms: u64) -> Event {
        self.state.balance = 0;
        self.state.countdown.phase = CountdownPhase::Idle;
        info!("alarm silenced");
        Event::AlarmSilenced { at: at(now_ms) }
    }
}
