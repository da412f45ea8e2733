use std::net::SocketAddr;

/// Counter: day clicks rejected by the range selector. Labels: reason.
pub const SELECTIONS_REJECTED_TOTAL: &str = "fleetcal_selections_rejected_total";

/// Counter: reservation edit saves. Labels: status.
pub const EDIT_SAVES_TOTAL: &str = "fleetcal_edit_saves_total";

/// Counter: reservation deletes. Labels: status.
pub const DELETES_TOTAL: &str = "fleetcal_deletes_total";

/// Counter: record store calls. Labels: op, status.
pub const STORE_OPERATIONS_TOTAL: &str = "fleetcal_store_operations_total";

/// Counter: saves that fell back to the default daily price.
pub const PRICE_FALLBACKS_TOTAL: &str = "fleetcal_price_fallbacks_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
