//! Display formatting and the hours/minutes input form.

use chrono::{DateTime, Local, Utc};

use crate::bank::{HistoryEntry, TimeUnit};
use crate::error::BankError;

/// `HH:MM:SS`, zero padded. Hours grow past two digits as needed.
pub fn format_hhmmss(total_secs: u64) -> String {
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Format a balance counted in `unit`.
pub fn format_balance(amount: u64, unit: TimeUnit) -> String {
    format_hhmmss(amount.saturating_mul(unit.unit_secs()))
}

/// One history line: `<local time> → <sign><HH:MM:SS> [<tag>]`.
pub fn describe_entry(entry: &HistoryEntry, unit: TimeUnit) -> String {
    let when = i64::try_from(entry.occurred_at_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "{when} \u{2192} {}{} [{}]",
        entry.kind.sign(),
        format_balance(entry.amount, unit),
        entry.kind.tag()
    )
}

/// Validated hours/minutes pair from the add/subtract form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationInput {
    pub hours: u64,
    /// Always below 60 after parsing.
    pub minutes: u64,
}

impl DurationInput {
    /// Parse the two form fields.
    ///
    /// Each field may be blank or a non-negative integer, but not both blank.
    /// Minutes of 60 or more roll over into hours. A zero total is rejected.
    ///
    /// Parsing is strict: the whole field must be digits. Browser-style
    /// `parseInt` would read `"1.5"` as 1 and `"12abc"` as 12; here both are
    /// [`BankError::InvalidAmount`].
    pub fn parse(hours: &str, minutes: &str) -> Result<Self, BankError> {
        let (hours, minutes) = (hours.trim(), minutes.trim());
        if hours.is_empty() && minutes.is_empty() {
            return Err(BankError::invalid_amount("(empty)"));
        }
        let h = parse_field(hours)?;
        let m = parse_field(minutes)?;
        let input = Self {
            hours: h.saturating_add(m / 60),
            minutes: m % 60,
        };
        if input.total_secs() == 0 {
            return Err(BankError::invalid_amount(format!("{hours}h {minutes}m")));
        }
        Ok(input)
    }

    pub fn total_secs(&self) -> u64 {
        self.hours
            .saturating_mul(3600)
            .saturating_add(self.minutes * 60)
    }

    /// Amount in balance units, floored.
    pub fn to_units(&self, unit: TimeUnit) -> u64 {
        self.total_secs() / unit.unit_secs()
    }
}

fn parse_field(raw: &str) -> Result<u64, BankError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u64>()
        .map_err(|_| BankError::invalid_amount(raw))
}
