use anyhow::Result;
use tracing::{info, warn};
use transport_network::{config, network::Network, telemetry, utils};
use config::Config;
use telemetry::init_tracing;

fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    info!(
        airports = %cfg.data.airports_dir.display(),
        ferries = %cfg.data.ferries_dir.display(),
        roads = %cfg.data.roads_dir.display(),
        policy = %cfg.roads.failure_policy,
        "building transport network"
    );

    let mut network = Network::from_config(&cfg);
    let report = network.setup(&cfg.data)?;

    for source in report.reports().filter(|r| !r.is_clean()) {
        warn!("{source}");
    }
    if report.rejected_count() > 0 {
        warn!(rejected = report.rejected_count(), "some records were not loaded");
    }

    if let Ok(demand) = network.demand_matrix() {
        info!("demand matrix:\n{}", utils::format_matrix(demand.values()));
    }

    println!("{}", serde_json::to_string_pretty(&network.summary())?);
    Ok(())
}
