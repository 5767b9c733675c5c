mod error;
mod ledger;
mod validate;

pub use error::AllocError;
pub use ledger::Ledger;

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::limits::MAX_RESERVATIONS;
use crate::model::*;
use crate::observability::*;

use validate::{validate_reservation, validate_units};

/// Everything one allocation run produced. Read-only once returned.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub ledger: Ledger,
    /// One entry per reservation, in input order.
    pub placements: Vec<Placement>,
    pub rejections: Vec<Rejection>,
    /// Nights a returning guest took from someone else on their home unit.
    pub overwrites: Vec<Overwrite>,
}

impl Allocation {
    pub fn assigned_count(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| matches!(p, Placement::Assigned(_)))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.rejections.is_empty()
    }
}

/// Sticky first-fit allocator over a fixed set of units.
///
/// Reservations are placed one at a time, in the order given:
/// - a guest already on the ledger goes back to their unit, unconditionally;
/// - anyone else gets the lowest unit free for every night of the stay;
/// - if no such unit exists the reservation is rejected and the ledger is left
///   untouched.
///
/// Order is the tie-break: earlier reservations claim units first.
pub struct Allocator {
    units: Vec<Unit>,
    ledger: Ledger,
    placements: Vec<Placement>,
    rejections: Vec<Rejection>,
    overwrites: Vec<Overwrite>,
}

impl Allocator {
    pub fn new(units: &[Unit]) -> Result<Self, AllocError> {
        let units = validate_units(units)?;
        metrics::gauge!(UNITS_CONFIGURED).set(units.len() as f64);
        Ok(Self {
            ledger: Ledger::new(&units),
            units,
            placements: Vec::new(),
            rejections: Vec::new(),
            overwrites: Vec::new(),
        })
    }

    /// Configured units, ascending.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Place a single reservation. `Err` only for malformed input; a full
    /// house is `Ok(Placement::Failed(..))`.
    pub fn place(&mut self, reservation: &Reservation) -> Result<Placement, AllocError> {
        validate_reservation(reservation)?;
        let guest = reservation.guest.as_str();
        let stay = &reservation.stay;

        let placement = if let Some(unit) = self.ledger.unit_of_guest(guest) {
            // Returning guests keep their unit even if someone else holds
            // some of these nights; those entries are overwritten.
            let overwrites = self.ledger.reserve(unit, stay, guest)?;
            for o in &overwrites {
                warn!(
                    "unit {} on {}: returning guest {} overwrote {}",
                    o.unit, o.date, o.guest, o.previous
                );
            }
            if !overwrites.is_empty() {
                metrics::counter!(OVERWRITTEN_NIGHTS_TOTAL).increment(overwrites.len() as u64);
            }
            self.overwrites.extend(overwrites);
            metrics::counter!(RESERVATIONS_TOTAL, "outcome" => OUTCOME_RETURNING).increment(1);
            debug!("{guest} {stay} -> unit {unit} (returning)");
            Placement::Assigned(unit)
        } else if let Some(unit) = self.first_free_unit(stay) {
            self.ledger.reserve(unit, stay, guest)?;
            metrics::counter!(RESERVATIONS_TOTAL, "outcome" => OUTCOME_ASSIGNED).increment(1);
            debug!("{guest} {stay} -> unit {unit}");
            Placement::Assigned(unit)
        } else {
            let rejection = Rejection {
                guest: guest.to_string(),
                check_in: stay.check_in,
                check_out: stay.check_out,
            };
            metrics::counter!(RESERVATIONS_TOTAL, "outcome" => OUTCOME_REJECTED).increment(1);
            warn!("{rejection}");
            self.rejections.push(rejection.clone());
            Placement::Failed(rejection)
        };

        self.placements.push(placement.clone());
        Ok(placement)
    }

    fn first_free_unit(&self, stay: &Stay) -> Option<Unit> {
        self.units
            .iter()
            .copied()
            .find(|unit| self.ledger.is_range_free(*unit, stay))
    }

    pub fn finish(self) -> Allocation {
        Allocation {
            ledger: self.ledger,
            placements: self.placements,
            rejections: self.rejections,
            overwrites: self.overwrites,
        }
    }
}

/// Run a full allocation from an empty ledger. Stops at the first malformed
/// reservation; rejections never stop the run.
pub fn allocate(units: &[Unit], reservations: &[Reservation]) -> Result<Allocation, AllocError> {
    if reservations.len() > MAX_RESERVATIONS {
        return Err(AllocError::LimitExceeded("too many reservations"));
    }
    let start = Instant::now();
    let mut allocator = Allocator::new(units)?;
    for reservation in reservations {
        allocator.place(reservation)?;
    }
    let allocation = allocator.finish();
    metrics::histogram!(ALLOCATION_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

    info!(
        reservations = reservations.len(),
        assigned = allocation.assigned_count(),
        rejected = allocation.rejections.len(),
        overwritten_nights = allocation.overwrites.len(),
        "allocation finished"
    );
    Ok(allocation)
}
