//! Engine + persistence wiring.
//!
//! A [`BankSession`] applies each command to the in-memory engine first and
//! only then writes the new state to its store. Rendering and the alarm are
//! external collaborators reached through [`DisplayRenderer`] and
//! [`AlarmSignal`].

use tracing::debug;

use crate::bank::{BankPolicy, BankView, CountdownPhase, TimeBankEngine};
use crate::error::Result;
use crate::events::Event;
use crate::storage::{snapshot, PersistenceStore};

/// Draws the balance and history somewhere.
pub trait DisplayRenderer {
    fn render(&mut self, view: &BankView);
}

/// A looping audible alert.
pub trait AlarmSignal {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

pub struct BankSession<S: PersistenceStore> {
    engine: TimeBankEngine,
    store: S,
}

impl<S: PersistenceStore> BankSession<S> {
    /// Load the bank from `store` and reconcile any running countdown.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the reconciled
    /// balance cannot be written back.
    pub fn open(store: S, policy: BankPolicy, now_ms: u64) -> Result<Self> {
        let state = snapshot::load(&store)?;
        let was_running = state.countdown.phase == CountdownPhase::Running;
        let engine = TimeBankEngine::restore(state, policy, now_ms);
        let mut session = Self { engine, store };
        if was_running {
            snapshot::save_balance(&mut session.store, session.engine.balance())?;
        }
        Ok(session)
    }

    pub fn engine(&self) -> &TimeBankEngine {
        &self.engine
    }

    pub fn view(&self) -> BankView {
        self.engine.view()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add_time(&mut self, amount: i64, now_ms: u64) -> Result<Event> {
        let event = self.engine.add_time(amount, now_ms)?;
        self.persist()?;
        Ok(event)
    }

    pub fn subtract_time(&mut self, amount: i64, now_ms: u64) -> Result<Event> {
        let event = self.engine.subtract_time(amount, now_ms)?;
        self.persist()?;
        Ok(event)
    }

    pub fn undo(&mut self, now_ms: u64) -> Result<Option<Event>> {
        let event = self.engine.undo(now_ms)?;
        if event.is_some() {
            self.persist()?;
        }
        Ok(event)
    }

    pub fn start_countdown(&mut self, now_ms: u64) -> Result<Event> {
        let event = self.engine.start_countdown(now_ms)?;
        self.persist()?;
        Ok(event)
    }

    pub fn stop_countdown(&mut self, now_ms: u64) -> Result<Option<Event>> {
        let event = self.engine.stop_countdown(now_ms);
        if event.is_some() {
            self.persist()?;
        }
        Ok(event)
    }

    /// Forward a periodic tick. Only the balance is rewritten.
    pub fn tick(&mut self, run_id: u64, now_ms: u64) -> Result<Option<Event>> {
        let event = self.engine.tick(run_id, now_ms);
        if event.is_some() {
            snapshot::save_balance(&mut self.store, self.engine.balance())?;
        }
        Ok(event)
    }

    /// True when the store no longer records the countdown this session is
    /// driving, i.e. another process stopped or restarted it since loading.
    pub fn countdown_superseded(&self) -> Result<bool> {
        if self.engine.countdown_phase() == CountdownPhase::Idle {
            return Ok(false);
        }
        let persisted = snapshot::active_run(&self.store)?;
        Ok(persisted != Some(self.engine.state().countdown.run_id))
    }

    /// Forget everything: wipe the store and start from an empty bank.
    pub fn clear(&mut self) -> Result<()> {
        self.engine = TimeBankEngine::new(self.engine.policy());
        snapshot::clear(&mut self.store)?;
        debug!("bank cleared");
        Ok(())
    }

    // ── Collaborators ────────────────────────────────────────────────

    /// Drive the alarm for `event`, then redraw.
    pub fn dispatch(
        &self,
        event: &Event,
        renderer: &mut dyn DisplayRenderer,
        alarm: &mut dyn AlarmSignal,
    ) {
        if event.starts_alarm() && !alarm.is_active() {
            alarm.start();
        }
        if event.stops_alarm() && alarm.is_active() {
            alarm.stop();
        }
        renderer.render(&self.engine.view());
    }

    /// Bring the alarm in line with the current phase, e.g. after a reload
    /// found the countdown already exhausted.
    pub fn sync_alarm(&self, alarm: &mut dyn AlarmSignal) {
        let alarming = self.engine.countdown_phase() == CountdownPhase::Alarming;
        if alarming && !alarm.is_active() {
            alarm.start();
        } else if !alarming && alarm.is_active() {
            alarm.stop();
        }
    }

    fn persist(&mut self) -> Result<()> {
        snapshot::save(&mut self.store, self.engine.state())?;
        Ok(())
    }
}

/// Wall clock in epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
