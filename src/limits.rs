// Input guards. Allocation is in-memory and per-date, so every bound here
// caps ledger size.

pub const MAX_UNITS: usize = 1_024;
pub const MAX_STAY_NIGHTS: i64 = 3_660;
pub const MAX_GUEST_LEN: usize = 256;
pub const MAX_RESERVATIONS: usize = 100_000;
