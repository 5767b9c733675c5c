use chrono::NaiveDate;

use crate::model::Unit;

/// Malformed input reaching the allocator. Unsatisfiable reservations are not
/// errors; they come back as `Placement::Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    NoUnits,
    DuplicateUnit(Unit),
    UnknownUnit(Unit),
    EmptyGuest,
    InvalidStay {
        guest: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    LimitExceeded(&'static str),
}

impl std::fmt::Display for AllocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocError::NoUnits => write!(f, "no units configured"),
            AllocError::DuplicateUnit(unit) => write!(f, "unit {unit} configured twice"),
            AllocError::UnknownUnit(unit) => write!(f, "unknown unit: {unit}"),
            AllocError::EmptyGuest => write!(f, "reservation has an empty guest identifier"),
            AllocError::InvalidStay {
                guest,
                check_in,
                check_out,
            } => write!(
                f,
                "stay for {guest} checks out on {check_out}, not after check-in {check_in}"
            ),
            AllocError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for AllocError {}
