use serde::{Deserialize, Serialize};

/// Unit the balance is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
}

impl TimeUnit {
    /// Milliseconds in one unit.
    pub fn unit_ms(self) -> u64 {
        match self {
            TimeUnit::Seconds => 1_000,
            TimeUnit::Minutes => 60_000,
        }
    }

    /// Seconds in one unit.
    pub fn unit_secs(self) -> u64 {
        self.unit_ms() / 1_000
    }

    /// Whole units elapsed between two epoch-millisecond timestamps.
    ///
    /// A clock that moved backwards yields zero.
    pub fn elapsed_units(self, from_ms: u64, to_ms: u64) -> u64 {
        to_ms.saturating_sub(from_ms) / self.unit_ms()
    }
}

/// What to do when a subtraction exceeds the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdraftPolicy {
    /// Accept the subtraction and clamp the balance at zero.
    #[default]
    Clamp,
    /// Reject the subtraction with no state change.
    Reject,
}

/// What a manual stop of a running countdown records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// Log the elapsed time as a `CountdownConsumed` entry (undoable).
    #[default]
    RecordConsumed,
    /// Keep the reduced balance but log nothing.
    Silent,
}

/// Behavior switches for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BankPolicy {
    #[serde(default)]
    pub unit: TimeUnit,
    #[serde(default)]
    pub overdraft: OverdraftPolicy,
    #[serde(default)]
    pub stop: StopPolicy,
}
