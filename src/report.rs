//! Reporting over an allocation run: summary statistics, the occupancy
//! grid, and the text / JSON renderings of both.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

use crate::engine::{Allocation, Ledger};
use crate::ingest::Booking;
use crate::model::*;

pub const CURRENCY: &str = "EUR";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestValue {
    pub guest: String,
    pub net_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub bookings: usize,
    pub total_revenue: f64,
    /// Revenue minus commissions; only when the input carries commissions.
    pub net_revenue: Option<f64>,
    pub net_per_booking: Vec<GuestValue>,
    pub average_nights: f64,
    /// Requested nights over unit-nights available between the first
    /// check-in and the last check-out, in percent.
    pub occupancy_rate: f64,
    pub average_people: Option<f64>,
    pub purposes: Vec<(String, usize)>,
    pub payment_methods: Vec<(String, usize)>,
}

impl Summary {
    pub fn compute(bookings: &[Booking], unit_count: usize) -> Self {
        let total_revenue: f64 = bookings.iter().filter_map(|b| b.price).sum();
        let has_commission = bookings.iter().any(|b| b.commission.is_some());
        let net_revenue = has_commission.then(|| {
            total_revenue - bookings.iter().filter_map(|b| b.commission).sum::<f64>()
        });
        let net_per_booking = if has_commission {
            bookings
                .iter()
                .filter_map(|b| {
                    b.net_value().map(|net_value| GuestValue {
                        guest: b.guest().to_string(),
                        net_value,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let nights: i64 = bookings.iter().map(|b| b.stay().nights()).sum();
        let average_nights = mean(nights as f64, bookings.len());

        let occupancy_rate = match date_window(bookings) {
            Some((first, last)) => {
                let days = (last - first).num_days();
                let available = days as f64 * unit_count as f64;
                if available > 0.0 {
                    nights as f64 / available * 100.0
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        let people: Vec<u32> = bookings.iter().filter_map(|b| b.people).collect();
        let average_people = (!people.is_empty())
            .then(|| mean(people.iter().map(|p| f64::from(*p)).sum(), people.len()));

        Self {
            bookings: bookings.len(),
            total_revenue,
            net_revenue,
            net_per_booking,
            average_nights,
            occupancy_rate,
            average_people,
            purposes: value_counts(bookings.iter().map(|b| b.purpose.as_deref())),
            payment_methods: value_counts(bookings.iter().map(|b| b.payment_method.as_deref())),
        }
    }
}

fn mean(total: f64, n: usize) -> f64 {
    if n == 0 { 0.0 } else { total / n as f64 }
}

/// Occurrences per distinct value, most frequent first, ties by name.
fn value_counts<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, n)| (value.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// First check-in and last check-out across all bookings.
pub fn date_window(bookings: &[Booking]) -> Option<(NaiveDate, NaiveDate)> {
    let first = bookings.iter().map(|b| b.stay().check_in).min()?;
    let last = bookings.iter().map(|b| b.stay().check_out).max()?;
    Some((first, last))
}

// ── Occupancy grid ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyRow {
    pub date: NaiveDate,
    /// One cell per unit, in `OccupancyTable::units` order.
    pub guests: Vec<Option<String>>,
}

/// Every date in a window × every configured unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyTable {
    pub units: Vec<Unit>,
    pub rows: Vec<OccupancyRow>,
}

impl OccupancyTable {
    /// Grid over `first..=last`. Without a window, the ledger's own first and
    /// last occupied nights are used.
    pub fn build(ledger: &Ledger, window: Option<(NaiveDate, NaiveDate)>) -> Self {
        let units: Vec<Unit> = ledger.units().collect();
        let window = window.or_else(|| ledger.first_date().zip(ledger.last_date()));
        let rows = match window {
            Some((first, last)) => first
                .iter_days()
                .take_while(|date| *date <= last)
                .map(|date| OccupancyRow {
                    date,
                    guests: units
                        .iter()
                        .map(|unit| ledger.occupant(*unit, date).map(str::to_string))
                        .collect(),
                })
                .collect(),
            None => Vec::new(),
        };
        Self { units, rows }
    }

    fn render(&self) -> String {
        let mut builder = Builder::default();
        let mut header = vec!["Date".to_string()];
        header.extend(self.units.iter().map(|u| format!("Unit {u}")));
        builder.push_record(header);
        for row in &self.rows {
            let mut record = vec![row.date.to_string()];
            record.extend(row.guests.iter().map(|g| g.clone().unwrap_or_default()));
            builder.push_record(record);
        }
        builder.build().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct TimelineEntry {
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[tabled(rename = "Unit")]
    pub unit: Unit,
    #[tabled(rename = "Guest")]
    pub guest: String,
}

/// Flat (date, unit, guest) rows ordered by date, then unit.
pub fn timeline(ledger: &Ledger) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = ledger
        .entries()
        .map(|(unit, date, guest)| TimelineEntry {
            date,
            unit,
            guest: guest.to_string(),
        })
        .collect();
    entries.sort_by_key(|e| (e.date, e.unit));
    entries
}

// ── Rendering ────────────────────────────────────────────────────

#[derive(Tabled)]
struct RejectionRow {
    #[tabled(rename = "Guest")]
    guest: String,
    #[tabled(rename = "Check-in")]
    check_in: NaiveDate,
    #[tabled(rename = "Check-out")]
    check_out: NaiveDate,
}

#[derive(Tabled)]
struct OverwriteRow {
    #[tabled(rename = "Unit")]
    unit: Unit,
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Previous guest")]
    previous: String,
    #[tabled(rename = "Returning guest")]
    guest: String,
}

#[derive(Tabled)]
struct NetRow {
    #[tabled(rename = "Guest")]
    guest: String,
    #[tabled(rename = "Net value")]
    net_value: String,
}

#[derive(Tabled)]
struct BookingRow {
    #[tabled(rename = "Guest")]
    guest: String,
    #[tabled(rename = "Check-in")]
    check_in: NaiveDate,
    #[tabled(rename = "Check-out")]
    check_out: NaiveDate,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Commission")]
    commission: String,
    #[tabled(rename = "People")]
    people: String,
    #[tabled(rename = "Purpose")]
    purpose: String,
    #[tabled(rename = "Payment method")]
    payment_method: String,
}

impl From<&Booking> for BookingRow {
    fn from(b: &Booking) -> Self {
        let amount = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        Self {
            guest: b.guest().to_string(),
            check_in: b.stay().check_in,
            check_out: b.stay().check_out,
            price: amount(b.price),
            commission: amount(b.commission),
            people: b.people.map_or_else(|| "-".to_string(), |p| p.to_string()),
            purpose: b.purpose.clone().unwrap_or_else(|| "-".to_string()),
            payment_method: b.payment_method.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'r> {
    bookings: &'r [Booking],
    summary: &'r Summary,
    assignments: BTreeMap<&'r str, Unit>,
    occupancy: &'r Ledger,
    timeline: Vec<TimelineEntry>,
    rejections: &'r [Rejection],
    overwrites: &'r [Overwrite],
}

/// Everything the CLI prints for one run.
pub struct Report<'a> {
    pub summary: Summary,
    pub table: OccupancyTable,
    bookings: &'a [Booking],
    allocation: &'a Allocation,
}

impl<'a> Report<'a> {
    pub fn new(bookings: &'a [Booking], allocation: &'a Allocation) -> Self {
        let ledger = &allocation.ledger;
        Self {
            summary: Summary::compute(bookings, ledger.unit_count()),
            table: OccupancyTable::build(ledger, date_window(bookings)),
            bookings,
            allocation,
        }
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Table => Ok(self.render_table()),
            OutputFormat::Json => self.render_json(),
        }
    }

    fn render_json(&self) -> serde_json::Result<String> {
        let ledger = &self.allocation.ledger;
        serde_json::to_string_pretty(&JsonReport {
            bookings: self.bookings,
            summary: &self.summary,
            assignments: ledger.assignments(),
            occupancy: ledger,
            timeline: timeline(ledger),
            rejections: &self.allocation.rejections,
            overwrites: &self.allocation.overwrites,
        })
    }

    fn render_table(&self) -> String {
        let s = &self.summary;
        let mut sections = Vec::new();

        if !self.bookings.is_empty() {
            let rows = self.bookings.iter().map(BookingRow::from);
            sections.push(format!("Bookings:\n{}", Table::new(rows)));
        }

        let mut stats = Builder::default();
        stats.push_record(["Metric".to_string(), "Value".to_string()]);
        stats.push_record(["Bookings".to_string(), s.bookings.to_string()]);
        stats.push_record([
            "Total revenue".to_string(),
            format!("{:.2} {CURRENCY}", s.total_revenue),
        ]);
        if let Some(net) = s.net_revenue {
            stats.push_record(["Net revenue".to_string(), format!("{net:.2} {CURRENCY}")]);
        }
        stats.push_record([
            "Average stay".to_string(),
            format!("{:.2} nights", s.average_nights),
        ]);
        stats.push_record([
            "Occupancy rate".to_string(),
            format!("{:.2}%", s.occupancy_rate),
        ]);
        if let Some(people) = s.average_people {
            stats.push_record(["Average people".to_string(), format!("{people:.2}")]);
        }
        sections.push(stats.build().to_string());

        if !s.net_per_booking.is_empty() {
            let rows = s.net_per_booking.iter().map(|g| NetRow {
                guest: g.guest.clone(),
                net_value: format!("{:.2} {CURRENCY}", g.net_value),
            });
            sections.push(format!("Net value per booking:\n{}", Table::new(rows)));
        }
        for (title, counts) in [
            ("Trip purpose", &s.purposes),
            ("Payment method", &s.payment_methods),
        ] {
            if counts.is_empty() {
                continue;
            }
            let mut builder = Builder::default();
            builder.push_record([title.to_string(), "Bookings".to_string()]);
            for (value, n) in counts {
                builder.push_record([value.clone(), n.to_string()]);
            }
            sections.push(builder.build().to_string());
        }

        sections.push(format!("Occupancy:\n{}", self.table.render()));

        let rejections = &self.allocation.rejections;
        if rejections.is_empty() {
            sections.push("All reservations placed.".to_string());
        } else {
            let rows = rejections.iter().map(|r| RejectionRow {
                guest: r.guest.clone(),
                check_in: r.check_in,
                check_out: r.check_out,
            });
            sections.push(format!("Not placed:\n{}", Table::new(rows)));
        }

        let overwrites = &self.allocation.overwrites;
        if !overwrites.is_empty() {
            let rows = overwrites.iter().map(|o| OverwriteRow {
                unit: o.unit,
                date: o.date,
                previous: o.previous.clone(),
                guest: o.guest.clone(),
            });
            sections.push(format!(
                "Nights taken by returning guests:\n{}",
                Table::new(rows)
            ));
        }

        let mut out = sections.join("\n\n");
        out.push('\n');
        out
    }
}
