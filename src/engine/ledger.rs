use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::model::*;

use super::AllocError;

/// Per-unit, per-date occupancy. Each (unit, date) holds at most one guest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    units: BTreeMap<Unit, BTreeMap<NaiveDate, String>>,
    /// Reverse index: guest → unit → number of dates held there.
    /// Kept in step with `units` so guest lookup never scans the calendar.
    holdings: HashMap<String, BTreeMap<Unit, usize>>,
}

impl Ledger {
    pub fn new(units: &[Unit]) -> Self {
        Self {
            units: units.iter().map(|u| (*u, BTreeMap::new())).collect(),
            holdings: HashMap::new(),
        }
    }

    /// Lowest unit on which `guest` holds any date.
    pub fn unit_of_guest(&self, guest: &str) -> Option<Unit> {
        self.holdings
            .get(guest)
            .and_then(|per_unit| per_unit.keys().next().copied())
    }

    /// True iff no night of `stay` is recorded on `unit`. Unknown units are
    /// never free.
    pub fn is_range_free(&self, unit: Unit, stay: &Stay) -> bool {
        if stay.check_out <= stay.check_in {
            return self.units.contains_key(&unit);
        }
        self.units
            .get(&unit)
            .is_some_and(|dates| dates.range(stay.check_in..stay.check_out).next().is_none())
    }

    /// Write `guest` into every night of `stay` on `unit`, replacing whatever
    /// was there. No conflict check: callers decide whether the range must be
    /// free. Returns the entries taken from other guests.
    pub fn reserve(
        &mut self,
        unit: Unit,
        stay: &Stay,
        guest: &str,
    ) -> Result<Vec<Overwrite>, AllocError> {
        let Self { units, holdings } = self;
        let dates = units.get_mut(&unit).ok_or(AllocError::UnknownUnit(unit))?;

        let mut overwrites = Vec::new();
        for date in stay.dates() {
            match dates.insert(date, guest.to_string()) {
                None => hold(holdings, guest, unit),
                Some(previous) if previous == guest => {}
                Some(previous) => {
                    hold(holdings, guest, unit);
                    release(holdings, &previous, unit);
                    overwrites.push(Overwrite {
                        unit,
                        date,
                        previous,
                        guest: guest.to_string(),
                    });
                }
            }
        }
        Ok(overwrites)
    }

    // ── Read access ──────────────────────────────────────────

    pub fn units(&self) -> impl Iterator<Item = Unit> + '_ {
        self.units.keys().copied()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn occupant(&self, unit: Unit, date: NaiveDate) -> Option<&str> {
        self.units
            .get(&unit)
            .and_then(|dates| dates.get(&date))
            .map(String::as_str)
    }

    /// Occupied nights of one unit, in date order.
    pub fn dates(&self, unit: Unit) -> impl Iterator<Item = (NaiveDate, &str)> + '_ {
        self.units
            .get(&unit)
            .into_iter()
            .flat_map(|dates| dates.iter().map(|(d, g)| (*d, g.as_str())))
    }

    /// Every occupied (unit, date, guest), ordered by unit then date.
    pub fn entries(&self) -> impl Iterator<Item = (Unit, NaiveDate, &str)> + '_ {
        self.units.iter().flat_map(|(unit, dates)| {
            dates.iter().map(move |(d, g)| (*unit, *d, g.as_str()))
        })
    }

    pub fn nights_on(&self, unit: Unit) -> usize {
        self.units.get(&unit).map_or(0, BTreeMap::len)
    }

    pub fn total_nights(&self) -> usize {
        self.units.values().map(BTreeMap::len).sum()
    }

    /// Guest → unit, as `unit_of_guest` would answer for each guest.
    pub fn assignments(&self) -> BTreeMap<&str, Unit> {
        self.holdings
            .iter()
            .filter_map(|(guest, per_unit)| {
                per_unit.keys().next().map(|unit| (guest.as_str(), *unit))
            })
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.units
            .values()
            .filter_map(|dates| dates.keys().next().copied())
            .min()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.units
            .values()
            .filter_map(|dates| dates.keys().next_back().copied())
            .max()
    }

    pub fn is_empty(&self) -> bool {
        self.units.values().all(BTreeMap::is_empty)
    }
}

fn hold(holdings: &mut HashMap<String, BTreeMap<Unit, usize>>, guest: &str, unit: Unit) {
    if let Some(per_unit) = holdings.get_mut(guest) {
        *per_unit.entry(unit).or_insert(0) += 1;
    } else {
        holdings.insert(guest.to_string(), BTreeMap::from([(unit, 1)]));
    }
}

fn release(holdings: &mut HashMap<String, BTreeMap<Unit, usize>>, guest: &str, unit: Unit) {
    let Some(per_unit) = holdings.get_mut(guest) else {
        return;
    };
    if let Some(count) = per_unit.get_mut(&unit) {
        *count -= 1;
        if *count == 0 {
            per_unit.remove(&unit);
        }
    }
    if per_unit.is_empty() {
        holdings.remove(guest);
    }
}

/// Serialized as `{ unit: { date: guest } }`.
impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.units.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn stay(from: u32, to: u32) -> Stay {
        Stay::new(d(from), d(to))
    }

    fn three_units() -> Ledger {
        Ledger::new(&[Unit(1), Unit(2), Unit(3)])
    }

    #[test]
    fn empty_ledger() {
        let ledger = three_units();
        assert!(ledger.is_empty());
        assert_eq!(ledger.unit_count(), 3);
        assert_eq!(ledger.unit_of_guest("Ana"), None);
        assert!(ledger.is_range_free(Unit(1), &stay(1, 10)));
        assert_eq!(ledger.first_date(), None);
    }

    #[test]
    fn reserve_fills_half_open_range() {
        let mut ledger = three_units();
        let overwrites = ledger.reserve(Unit(2), &stay(4, 7), "Ana").unwrap();
        assert!(overwrites.is_empty());

        assert_eq!(ledger.occupant(Unit(2), d(4)), Some("Ana"));
        assert_eq!(ledger.occupant(Unit(2), d(6)), Some("Ana"));
        assert_eq!(ledger.occupant(Unit(2), d(7)), None);
        assert_eq!(ledger.nights_on(Unit(2)), 3);
        assert_eq!(ledger.unit_of_guest("Ana"), Some(Unit(2)));
    }

    #[test]
    fn range_free_checks_every_night() {
        let mut ledger = three_units();
        ledger.reserve(Unit(1), &stay(10, 12), "Ana").unwrap();

        assert!(!ledger.is_range_free(Unit(1), &stay(5, 11)));
        assert!(!ledger.is_range_free(Unit(1), &stay(11, 20)));
        assert!(ledger.is_range_free(Unit(1), &stay(5, 10))); // ends on check-in
        assert!(ledger.is_range_free(Unit(1), &stay(12, 14))); // starts on check-out
        assert!(ledger.is_range_free(Unit(2), &stay(10, 12)));
    }

    #[test]
    fn unknown_unit() {
        let mut ledger = three_units();
        assert!(!ledger.is_range_free(Unit(9), &stay(1, 2)));
        assert_eq!(
            ledger.reserve(Unit(9), &stay(1, 2), "Ana"),
            Err(AllocError::UnknownUnit(Unit(9)))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn re_reserving_own_dates_is_idempotent() {
        let mut ledger = three_units();
        ledger.reserve(Unit(1), &stay(1, 5), "Ana").unwrap();
        let before = ledger.clone();
        let overwrites = ledger.reserve(Unit(1), &stay(2, 4), "Ana").unwrap();
        assert!(overwrites.is_empty());
        assert_eq!(ledger, before);
    }

    #[test]
    fn overwrite_reports_previous_guest() {
        let mut ledger = three_units();
        ledger.reserve(Unit(1), &stay(1, 4), "Bruno").unwrap();
        let overwrites = ledger.reserve(Unit(1), &stay(3, 5), "Ana").unwrap();

        assert_eq!(
            overwrites,
            vec![Overwrite {
                unit: Unit(1),
                date: d(3),
                previous: "Bruno".into(),
                guest: "Ana".into(),
            }]
        );
        assert_eq!(ledger.occupant(Unit(1), d(3)), Some("Ana"));
        assert_eq!(ledger.unit_of_guest("Bruno"), Some(Unit(1)));
    }

    #[test]
    fn fully_overwritten_guest_loses_unit() {
        let mut ledger = three_units();
        ledger.reserve(Unit(1), &stay(1, 3), "Bruno").unwrap();
        ledger.reserve(Unit(1), &stay(1, 3), "Ana").unwrap();
        assert_eq!(ledger.unit_of_guest("Bruno"), None);
        assert_eq!(ledger.unit_of_guest("Ana"), Some(Unit(1)));
    }

    #[test]
    fn guest_lookup_prefers_lowest_unit() {
        let mut ledger = three_units();
        ledger.reserve(Unit(3), &stay(1, 2), "Ana").unwrap();
        ledger.reserve(Unit(2), &stay(5, 6), "Ana").unwrap();
        assert_eq!(ledger.unit_of_guest("Ana"), Some(Unit(2)));
    }

    #[test]
    fn entries_and_assignments() {
        let mut ledger = three_units();
        ledger.reserve(Unit(2), &stay(1, 3), "Bruno").unwrap();
        ledger.reserve(Unit(1), &stay(2, 3), "Ana").unwrap();

        let entries: Vec<_> = ledger.entries().collect();
        assert_eq!(
            entries,
            vec![
                (Unit(1), d(2), "Ana"),
                (Unit(2), d(1), "Bruno"),
                (Unit(2), d(2), "Bruno"),
            ]
        );
        let assignments = ledger.assignments();
        assert_eq!(assignments.get("Ana"), Some(&Unit(1)));
        assert_eq!(assignments.get("Bruno"), Some(&Unit(2)));
        assert_eq!(ledger.first_date(), Some(d(1)));
        assert_eq!(ledger.last_date(), Some(d(2)));
        assert_eq!(ledger.total_nights(), 3);
    }

    #[test]
    fn serializes_as_nested_map() {
        let mut ledger = Ledger::new(&[Unit(1), Unit(2)]);
        ledger.reserve(Unit(1), &stay(1, 2), "Ana").unwrap();
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "1": { "2024-03-01": "Ana" }, "2": {} })
        );
    }
}
