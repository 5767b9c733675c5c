use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A physical allocatable unit (an apartment), identified by a stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unit(pub u32);

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open date range `[check_in, check_out)`. The check-out day is free
/// for the next guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out, "Stay check-in must be before check-out");
        Self { check_in, check_out }
    }

    /// Like `new`, but returns `None` for zero-night or inverted ranges.
    pub fn try_new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_in < check_out).then_some(Self { check_in, check_out })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }

    /// Every occupied night, in order. Never yields the check-out day.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.check_out;
        self.check_in.iter_days().take_while(move |d| *d < end)
    }
}

impl fmt::Display for Stay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

/// A request to occupy one unit for a stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub guest: String,
    pub stay: Stay,
}

impl Reservation {
    pub fn new(guest: impl Into<String>, stay: Stay) -> Self {
        Self {
            guest: guest.into(),
            stay,
        }
    }
}

// ── Allocation result types ──────────────────────────────────────

/// Failure signal for a reservation no unit could take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub guest: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no unit available for {} between {} and {}",
            self.guest, self.check_in, self.check_out
        )
    }
}

/// Outcome of placing a single reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Assigned(Unit),
    Failed(Rejection),
}

impl Placement {
    pub fn unit(&self) -> Option<Unit> {
        match self {
            Placement::Assigned(unit) => Some(*unit),
            Placement::Failed(_) => None,
        }
    }
}

/// A ledger entry a returning guest took over from somebody else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overwrite {
    pub unit: Unit,
    pub date: NaiveDate,
    pub previous: String,
    pub guest: String,
}
