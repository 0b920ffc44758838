use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::{CountdownPhase, HistoryEntry, TimeUnit};

/// Every state change in the bank produces an Event.
/// Front ends render from them and drive the alarm with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimeAdded {
        entry: HistoryEntry,
        balance: u64,
        at: DateTime<Utc>,
    },
    TimeSubtracted {
        entry: HistoryEntry,
        balance: u64,
        /// True when the balance was clamped at zero.
        clamped: bool,
        at: DateTime<Utc>,
    },
    Undone {
        entry: HistoryEntry,
        balance: u64,
        at: DateTime<Utc>,
    },
    CountdownStarted {
        run_id: u64,
        initial_remaining: u64,
        at: DateTime<Utc>,
    },
    CountdownTick {
        run_id: u64,
        remaining: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. The alarm should start looping.
    AlarmRaised {
        run_id: u64,
        at: DateTime<Utc>,
    },
    CountdownStopped {
        consumed: Option<HistoryEntry>,
        balance: u64,
        at: DateTime<Utc>,
    },
    /// Alarm acknowledged; balance forced to zero.
    AlarmSilenced {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        balance: u64,
        unit: TimeUnit,
        phase: CountdownPhase,
        can_undo: bool,
        history_len: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn starts_alarm(&self) -> bool {
        matches!(self, Event::AlarmRaised { .. })
    }

    pub fn stops_alarm(&self) -> bool {
        matches!(self, Event::AlarmSilenced { .. })
    }

    /// Balance after the event, where the event carries one.
    pub fn balance(&self) -> Option<u64> {
        match self {
            Event::TimeAdded { balance, .. }
            | Event::TimeSubtracted { balance, .. }
            | Event::Undone { balance, .. }
            | Event::CountdownStopped { balance, .. }
            | Event::StateSnapshot { balance, .. } => Some(*balance),
            Event::CountdownStarted {
                initial_remaining, ..
            } => Some(*initial_remaining),
            Event::CountdownTick { remaining, .. } => Some(*remaining),
            Event::AlarmRaised { .. } | Event::AlarmSilenced { .. } => Some(0),
        }
    }
}

/// Convert an epoch-millisecond timestamp for event payloads.
pub(crate) fn at(now_ms: u64) -> DateTime<Utc> {
    i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::AlarmRaised {
            run_id: 3,
            at: at(0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AlarmRaised");
        assert_eq!(json["run_id"], 3);
        assert!(event.starts_alarm());
        assert!(!event.stops_alarm());
    }

    #[test]
    fn at_converts_epoch_millis() {
        assert_eq!(at(1_500).timestamp_millis(), 1_500);
    }
}
