use std::fs;
use std::path::Path;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// ── Allocation metrics ──────────────────────────────────────────

/// Counter: reservations processed. Labels: outcome.
pub const RESERVATIONS_TOTAL: &str = "staydesk_reservations_total";

/// Counter: nights a returning guest took over from another guest.
pub const OVERWRITTEN_NIGHTS_TOTAL: &str = "staydesk_overwritten_nights_total";

/// Histogram: wall time of one full allocation run in seconds.
pub const ALLOCATION_DURATION_SECONDS: &str = "staydesk_allocation_duration_seconds";

/// Gauge: units configured for the current run.
pub const UNITS_CONFIGURED: &str = "staydesk_units_configured";

// ── Ingest metrics ──────────────────────────────────────────────

/// Counter: CSV rows turned into bookings.
pub const ROWS_INGESTED_TOTAL: &str = "staydesk_rows_ingested_total";

pub const OUTCOME_ASSIGNED: &str = "assigned";
pub const OUTCOME_RETURNING: &str = "returning";
pub const OUTCOME_REJECTED: &str = "rejected";

/// Install the Prometheus recorder when a metrics file is requested.
/// Without one, the `metrics` macros stay no-ops.
pub fn init(
    metrics_file: Option<&Path>,
) -> Result<Option<PrometheusHandle>, Box<dyn std::error::Error>> {
    if metrics_file.is_none() {
        return Ok(None);
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(Some(handle))
}

/// Write the current text exposition to `path`.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    fs::write(path, handle.render())?;
    tracing::info!("metrics written to {}", path.display());
    Ok(())
}
