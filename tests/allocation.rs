use chrono::NaiveDate;

use staydesk::engine::allocate;
use staydesk::ingest;
use staydesk::model::*;
use staydesk::report::{OutputFormat, Report};

const SEASON: &str = "\
Nome do hóspede,Check-in,Check-out,Preço,Valor da comissão,Pessoas,Motivo da viagem,Método de pagamento
Ana Silva,2024-07-01,2024-07-05,400 EUR,60 EUR,2,Lazer,Cartão
Bruno Costa,2024-07-02,2024-07-04,180 EUR,27 EUR,1,Negócios,Cartão
Carla Dias,2024-07-03,2024-07-06,330 EUR,49.5 EUR,4,Lazer,Transferência
Duarte Reis,2024-07-03,2024-07-05,200 EUR,30 EUR,2,Lazer,Cartão
Bruno Costa,2024-07-10,2024-07-12,190 EUR,28.5 EUR,1,Negócios,Cartão
Eva Lopes,2024-07-05,2024-07-08,300 EUR,45 EUR,3,Lazer,Cartão
";

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
}

fn three_units() -> Vec<Unit> {
    vec![Unit(1), Unit(2), Unit(3)]
}

#[test]
fn season_end_to_end() {
    let bookings = ingest::read(SEASON.as_bytes()).unwrap();
    let allocation = allocate(&three_units(), &ingest::reservations(&bookings)).unwrap();

    let units: Vec<_> = allocation.placements.iter().map(Placement::unit).collect();
    assert_eq!(
        units,
        vec![
            Some(Unit(1)), // Ana
            Some(Unit(2)), // Bruno
            Some(Unit(3)), // Carla
            None,          // Duarte: all three busy on the 3rd
            Some(Unit(2)), // Bruno returns to unit 2 although unit 1 is free
            Some(Unit(1)), // Eva: same-day turnover after Ana
        ]
    );
    assert_eq!(
        allocation.rejections,
        vec![Rejection {
            guest: "Duarte Reis".into(),
            check_in: d(3),
            check_out: d(5),
        }]
    );
    assert!(allocation.overwrites.is_empty());
    assert_eq!(allocation.ledger.occupant(Unit(1), d(4)), Some("Ana Silva"));
    assert_eq!(allocation.ledger.occupant(Unit(1), d(5)), Some("Eva Lopes"));
}

#[test]
fn season_report() {
    let bookings = ingest::read(SEASON.as_bytes()).unwrap();
    let allocation = allocate(&three_units(), &ingest::reservations(&bookings)).unwrap();
    let report = Report::new(&bookings, &allocation);

    let s = &report.summary;
    assert_eq!(s.bookings, 6);
    assert!((s.total_revenue - 1600.0).abs() < 1e-9);
    assert!((s.net_revenue.unwrap() - 1360.0).abs() < 1e-9);
    assert_eq!(s.purposes[0], ("Lazer".to_string(), 4));
    assert_eq!(s.payment_methods[0], ("Cartão".to_string(), 5));
    // 4 + 2 + 3 + 2 + 2 + 3 nights over 3 units × 11 days.
    assert!((s.occupancy_rate - 16.0 / 33.0 * 100.0).abs() < 1e-9);

    // Window runs from the 1st to the 12th inclusive.
    assert_eq!(report.table.rows.len(), 12);

    let text = report.render(OutputFormat::Table).unwrap();
    assert!(text.contains("Duarte Reis"));
    assert!(text.contains("1600.00 EUR"));

    let json: serde_json::Value =
        serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json["assignments"]["Bruno Costa"], 2);
    assert_eq!(json["rejections"].as_array().unwrap().len(), 1);
}

#[test]
fn returning_guest_overwrite_is_reported() {
    let csv = "\
guest,check_in,check_out
Ana,2024-07-01,2024-07-02
Bruno,2024-07-03,2024-07-06
Ana,2024-07-05,2024-07-07
";
    let bookings = ingest::read(csv.as_bytes()).unwrap();
    let allocation = allocate(&[Unit(1)], &ingest::reservations(&bookings)).unwrap();

    assert!(allocation.is_complete());
    assert_eq!(
        allocation.overwrites,
        vec![Overwrite {
            unit: Unit(1),
            date: d(5),
            previous: "Bruno".into(),
            guest: "Ana".into(),
        }]
    );

    let text = Report::new(&bookings, &allocation)
        .render(OutputFormat::Table)
        .unwrap();
    assert!(text.contains("Nights taken by returning guests"));
}

#[test]
fn more_units_resolve_rejection() {
    let bookings = ingest::read(SEASON.as_bytes()).unwrap();
    let reservations = ingest::reservations(&bookings);
    let four = [Unit(1), Unit(2), Unit(3), Unit(4)];
    let allocation = allocate(&four, &reservations).unwrap();
    assert!(allocation.is_complete());
    assert_eq!(allocation.placements[3], Placement::Assigned(Unit(4)));
}
