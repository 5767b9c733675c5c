use crate::limits::*;
use crate::model::*;

use super::AllocError;

pub(crate) fn validate_reservation(reservation: &Reservation) -> Result<(), AllocError> {
    if reservation.guest.trim().is_empty() {
        return Err(AllocError::EmptyGuest);
    }
    if reservation.guest.len() > MAX_GUEST_LEN {
        return Err(AllocError::LimitExceeded("guest identifier too long"));
    }
    let Stay { check_in, check_out } = reservation.stay;
    if check_out <= check_in {
        return Err(AllocError::InvalidStay {
            guest: reservation.guest.clone(),
            check_in,
            check_out,
        });
    }
    if reservation.stay.nights() > MAX_STAY_NIGHTS {
        return Err(AllocError::LimitExceeded("stay too long"));
    }
    Ok(())
}

/// Sorted, duplicate-free unit list.
pub(crate) fn validate_units(units: &[Unit]) -> Result<Vec<Unit>, AllocError> {
    if units.is_empty() {
        return Err(AllocError::NoUnits);
    }
    if units.len() > MAX_UNITS {
        return Err(AllocError::LimitExceeded("too many units"));
    }
    let mut sorted = units.to_vec();
    sorted.sort_unstable();
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(AllocError::DuplicateUnit(pair[0]));
    }
    Ok(sorted)
}
