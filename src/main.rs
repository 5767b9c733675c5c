use tracing::info;
use tracing_subscriber::EnvFilter;

use staydesk::config::Config;
use staydesk::report::Report;
use staydesk::{engine, ingest, observability};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env(std::env::args().nth(1))?;
    let metrics = observability::init(config.metrics_file.as_deref())?;

    let units: Vec<String> = config.units.iter().map(|u| u.to_string()).collect();
    info!("staydesk reading {}", config.input.display());
    info!("  units: {}", units.join(", "));
    info!("  format: {:?}", config.format);

    let bookings = ingest::read_path(&config.input)?;
    info!("{} bookings loaded", bookings.len());

    let allocation = engine::allocate(&config.units, &ingest::reservations(&bookings))?;
    if !allocation.is_complete() {
        tracing::warn!(
            "{} of {} reservations could not be placed",
            allocation.rejections.len(),
            allocation.placements.len()
        );
    }

    let report = Report::new(&bookings, &allocation);
    println!("{}", report.render(config.format)?);

    if let (Some(handle), Some(path)) = (&metrics, &config.metrics_file) {
        observability::write_snapshot(handle, path)?;
    }
    Ok(())
}
