//! CSV ingestion: turns a reservation export into validated bookings.
//!
//! Column names follow the booking platform export (Portuguese headers);
//! snake_case English aliases are accepted too. Unknown columns are ignored.

use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::limits::MAX_RESERVATIONS;
use crate::model::*;
use crate::observability::ROWS_INGESTED_TOTAL;

#[derive(Debug)]
pub enum IngestError {
    Io(io::Error),
    Csv(csv::Error),
    InvalidDate { row: usize, value: String },
    InvalidAmount { row: usize, value: String },
    InvalidRow { row: usize, reason: String },
    LimitExceeded(&'static str),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Io(e) => write!(f, "I/O error: {e}"),
            IngestError::Csv(e) => write!(f, "CSV error: {e}"),
            IngestError::InvalidDate { row, value } => {
                write!(f, "row {row}: invalid date {value:?}")
            }
            IngestError::InvalidAmount { row, value } => {
                write!(f, "row {row}: invalid amount {value:?}")
            }
            IngestError::InvalidRow { row, reason } => write!(f, "row {row}: {reason}"),
            IngestError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Io(e) => Some(e),
            IngestError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for IngestError {
    fn from(e: io::Error) -> Self {
        IngestError::Io(e)
    }
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::Csv(e)
    }
}

/// A reservation plus the bookkeeping fields the report uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub reservation: Reservation,
    pub price: Option<f64>,
    pub commission: Option<f64>,
    pub people: Option<u32>,
    pub purpose: Option<String>,
    pub payment_method: Option<String>,
}

impl Booking {
    pub fn guest(&self) -> &str {
        &self.reservation.guest
    }

    pub fn stay(&self) -> &Stay {
        &self.reservation.stay
    }

    /// Price minus commission, when a price is known.
    pub fn net_value(&self) -> Option<f64> {
        self.price.map(|p| p - self.commission.unwrap_or(0.0))
    }
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "Nome do hóspede", alias = "guest", default)]
    guest: Option<String>,
    #[serde(rename = "Check-in", alias = "check_in")]
    check_in: String,
    #[serde(rename = "Check-out", alias = "check_out")]
    check_out: String,
    #[serde(rename = "Preço", alias = "price", default)]
    price: Option<String>,
    #[serde(rename = "Valor da comissão", alias = "commission", default)]
    commission: Option<String>,
    #[serde(rename = "Pessoas", alias = "people", default)]
    people: Option<String>,
    #[serde(rename = "Motivo da viagem", alias = "purpose", default)]
    purpose: Option<String>,
    #[serde(rename = "Método de pagamento", alias = "payment_method", default)]
    payment_method: Option<String>,
}

pub fn read_path(path: &Path) -> Result<Vec<Booking>, IngestError> {
    read(std::fs::File::open(path)?)
}

pub fn read<R: io::Read>(input: R) -> Result<Vec<Booking>, IngestError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    collect(reader)
}

fn collect<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Booking>, IngestError> {
    let mut bookings = Vec::new();
    for (index, result) in reader.deserialize::<Row>().enumerate() {
        if index >= MAX_RESERVATIONS {
            return Err(IngestError::LimitExceeded("too many rows"));
        }
        bookings.push(booking_from_row(index + 1, result?)?);
    }
    metrics::counter!(ROWS_INGESTED_TOTAL).increment(bookings.len() as u64);
    tracing::debug!("ingested {} bookings", bookings.len());
    Ok(bookings)
}

fn booking_from_row(row: usize, raw: Row) -> Result<Booking, IngestError> {
    let guest = raw.guest.unwrap_or_default();
    if guest.is_empty() {
        return Err(IngestError::InvalidRow {
            row,
            reason: "empty guest name".into(),
        });
    }

    let check_in = date_field(row, &raw.check_in)?;
    let check_out = date_field(row, &raw.check_out)?;
    let stay = Stay::try_new(check_in, check_out).ok_or_else(|| IngestError::InvalidRow {
        row,
        reason: format!("check-out {check_out} is not after check-in {check_in}"),
    })?;

    let people = match raw.people.as_deref() {
        None => None,
        Some(value) => Some(value.parse::<u32>().map_err(|_| IngestError::InvalidRow {
            row,
            reason: format!("people must be a whole number, got {value:?}"),
        })?),
    };

    Ok(Booking {
        reservation: Reservation::new(guest, stay),
        price: amount_field(row, raw.price.as_deref())?,
        commission: amount_field(row, raw.commission.as_deref())?,
        people,
        purpose: raw.purpose,
        payment_method: raw.payment_method,
    })
}

fn date_field(row: usize, value: &str) -> Result<NaiveDate, IngestError> {
    parse_date(value).ok_or_else(|| IngestError::InvalidDate {
        row,
        value: value.to_string(),
    })
}

fn amount_field(row: usize, value: Option<&str>) -> Result<Option<f64>, IngestError> {
    value
        .map(|v| {
            parse_amount(v).ok_or_else(|| IngestError::InvalidAmount {
                row,
                value: v.to_string(),
            })
        })
        .transpose()
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Calendar date of `value`. Time of day, and any offset, is dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Numeric value of a price string such as `"120.50 EUR"`.
pub fn parse_amount(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches(|c: char| c.is_alphabetic() || c == '€')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn reservations(bookings: &[Booking]) -> Vec<Reservation> {
    bookings.iter().map(|b| b.reservation.clone()).collect()
}
