//! Report window math.
//!
//! Every report accepts entries falling inside a window anchored on the
//! configured day boundary (default 09:00 in the report time zone). A
//! business day runs from the boundary on one calendar date to the same
//! boundary on the next, so a window is NOT a contiguous interval: it is
//! two boundary-split sub-ranges plus (weekly only) the full days between
//! them. One parameterized calculator serves all six report variants.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Daily,
    Weekly,
}

/// Which part of a window a timestamp landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSlot {
    /// On the opening date, at or after the boundary.
    Opening,
    /// A full calendar day strictly between the opening and closing dates.
    Middle,
    /// On the closing date, at or before the boundary.
    Closing,
}

/// A computed report window. Value object, never persisted; built fresh
/// from the job's nominal fire time on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub kind: ReportKind,
    /// Calendar date carrying the boundary-to-midnight sub-range.
    pub start_date: NaiveDate,
    /// Calendar date carrying the midnight-to-boundary sub-range.
    pub end_date: NaiveDate,
    pub boundary: NaiveTime,
    pub tz: Tz,
}

impl Window {
    /// Classify a unix timestamp (UTC seconds) against this window.
    /// Returns `None` when the instant falls outside the window.
    ///
    /// Both boundary instants are inclusive: an entry stamped exactly at
    /// the boundary on the opening date belongs to the Opening sub-range,
    /// and one at the boundary on the closing date to the Closing one.
    /// The sub-ranges lie on different dates, so no instant can satisfy
    /// both within a single window.
    pub fn slot(&self, ts: i64) -> Option<WindowSlot> {
        let utc = Utc.timestamp_opt(ts, 0).single()?;
        let local: DateTime<Tz> = utc.with_timezone(&self.tz);
        let date = local.date_naive();
        let time = local.time();

        if date == self.start_date {
            (time >= self.boundary).then_some(WindowSlot::Opening)
        } else if date == self.end_date {
            (time <= self.boundary).then_some(WindowSlot::Closing)
        } else if self.start_date < date && date < self.end_date {
            Some(WindowSlot::Middle)
        } else {
            None
        }
    }

    pub fn contains(&self, ts: i64) -> bool {
        self.slot(ts).is_some()
    }

    /// Human-readable bounds for job logs.
    pub fn describe(&self) -> String {
        format!(
            "{} {} .. {} {} ({})",
            self.start_date,
            self.boundary.format("%H:%M:%S"),
            self.end_date,
            self.boundary.format("%H:%M:%S"),
            self.tz
        )
    }
}

/// Compute the window for a report fired at `reference`.
///
/// Daily: boundary on the previous calendar date through boundary on the
/// reference date. Weekly: boundary on the date seven days back, every
/// full day in between, then boundary on the reference date. Pure
/// function of the wall-clock reference and configuration.
pub fn compute_window(reference: DateTime<Tz>, kind: ReportKind, boundary: NaiveTime) -> Window {
    let end_date = reference.date_naive();
    let back = match kind {
        ReportKind::Daily => 1,
        ReportKind::Weekly => 7,
    };
    // NaiveDate covers a range these subtractions cannot leave.
    let start_date = end_date
        .checked_sub_days(Days::new(back))
        .unwrap_or(end_date);
    Window {
        kind,
        start_date,
        end_date,
        boundary,
        tz: reference.timezone(),
    }
}
