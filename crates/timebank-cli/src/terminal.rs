//! Terminal stand-ins for the display and the alarm.

use std::io::Write;

use timebank_core::{
    describe_entry, format_balance, AlarmSignal, BankView, CountdownPhase, DisplayRenderer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Balance, undo availability and the history, newest first.
    Full,
    /// A single self-overwriting balance line, for the countdown loop.
    Ticker,
    /// Nothing; the caller prints JSON.
    Quiet,
}

pub struct TerminalRenderer {
    mode: RenderMode,
}

impl TerminalRenderer {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode }
    }
}

impl DisplayRenderer for TerminalRenderer {
    fn render(&mut self, view: &BankView) {
        match self.mode {
            RenderMode::Quiet => {}
            RenderMode::Ticker => {
                let phase = match view.countdown {
                    CountdownPhase::Idle => "stopped",
                    CountdownPhase::Running => "running",
                    CountdownPhase::Alarming => "TIME'S UP",
                };
                let mut out = std::io::stdout().lock();
                let _ = write!(out, "\r{}  {phase:<10}", format_balance(view.balance, view.unit));
                let _ = out.flush();
            }
            RenderMode::Full => {
                println!("{}", format_balance(view.balance, view.unit));
                if view.can_undo {
                    println!("(undo available)");
                }
                for entry in view.history.iter().rev() {
                    println!("  {}", describe_entry(entry, view.unit));
                }
            }
        }
    }
}

/// Rings the terminal bell on a fixed period while active.
pub struct TerminalBell {
    enabled: bool,
    interval_ms: u64,
    active: bool,
    last_ring_ms: Option<u64>,
}

impl TerminalBell {
    pub fn new(enabled: bool, interval_ms: u64) -> Self {
        Self {
            enabled,
            interval_ms: interval_ms.max(1),
            active: false,
            last_ring_ms: None,
        }
    }

    /// Ring again if a full interval has passed since the last ring.
    pub fn ring_if_due(&mut self, now_ms: u64) {
        if !self.active {
            return;
        }
        let due = self
            .last_ring_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.interval_ms);
        if due {
            self.ring();
            self.last_ring_ms = Some(now_ms);
        }
    }

    fn ring(&self) {
        if self.enabled {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "\x07");
            let _ = err.flush();
        }
    }
}

impl AlarmSignal for TerminalBell {
    fn start(&mut self) {
        self.active = true;
        self.last_ring_ms = None;
        if self.enabled {
            eprintln!("\nTime's up! Press Ctrl-C to acknowledge.");
        }
        self.ring();
    }

    fn stop(&mut self) {
        self.active = false;
        self.last_ring_ms = None;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
