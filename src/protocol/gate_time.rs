//! Gate timestamps and their fixed textual encoding.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::{AppError, Result};

/// `strftime` pattern of field 0 of every reply: `month:day:year:hour:minute:second`.
pub const GATE_TIME_FORMAT: &str = "%m:%d:%Y:%H:%M:%S";

/// Digit count of each `:`-separated field, in wire order.
const FIELD_WIDTHS: [usize; 6] = [2, 2, 4, 2, 2, 2];

/// Earliest local wall-clock time at which the next cycle may start.
///
/// Held at whole-second precision; sub-second input is truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateTime(NaiveDateTime);

impl GateTime {
    /// Wrap a naive local timestamp, dropping any sub-second component.
    #[must_use]
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at.with_nanosecond(0).unwrap_or(at))
    }

    /// Current local wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Build from calendar fields; `None` if they do not name a real instant.
    #[must_use]
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(Self)
    }

    /// Parse a reply's leading field.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TimestampFormat` if `field` is not exactly six
    /// zero-padded digit groups matching [`GATE_TIME_FORMAT`] or names an
    /// impossible date.
    pub fn parse(field: &str) -> Result<Self> {
        check_shape(field)?;
        NaiveDateTime::parse_from_str(field, GATE_TIME_FORMAT)
            .map(Self::new)
            .map_err(|err| AppError::TimestampFormat(format!("'{field}': {err}")))
    }

    /// Render in [`GATE_TIME_FORMAT`].
    #[must_use]
    pub fn encode(&self) -> String {
        self.0.format(GATE_TIME_FORMAT).to_string()
    }

    /// This gate pushed `delay` into the future, saturating on overflow.
    #[must_use]
    pub fn after(self, delay: Duration) -> Self {
        TimeDelta::from_std(delay)
            .ok()
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map_or(self, Self::new)
    }

    /// The underlying naive timestamp.
    #[must_use]
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

/// chrono accepts padding, signs, and short fields; the wire format does not.
fn check_shape(field: &str) -> Result<()> {
    let widths: Vec<usize> = field
        .split(':')
        .map(|part| {
            if part.bytes().all(|b| b.is_ascii_digit()) {
                part.len()
            } else {
                0
            }
        })
        .collect();

    if widths == FIELD_WIDTHS {
        Ok(())
    } else {
        Err(AppError::TimestampFormat(format!(
            "'{field}': expected MM:DD:YYYY:HH:MM:SS"
        )))
    }
}

impl Display for GateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(GATE_TIME_FORMAT))
    }
}

impl FromStr for GateTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
