use serde::Serialize;

use super::{Network, Stage};
use crate::loader::LoadReport;

/// Per-source load reports from [`Network::setup`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupReport {
    pub airports: Vec<LoadReport>,
    pub ferries: Vec<LoadReport>,
    pub roads: Vec<LoadReport>,
}

impl SetupReport {
    pub fn reports(&self) -> impl Iterator<Item = &LoadReport> {
        self.airports
            .iter()
            .chain(self.ferries.iter())
            .chain(self.roads.iter())
    }

    pub fn rejected_count(&self) -> usize {
        self.reports().map(|r| r.rejected.len()).sum()
    }

    pub fn aborted_sources(&self) -> Vec<&str> {
        self.reports()
            .filter(|r| r.aborted)
            .map(|r| r.source.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub airports: usize,
    pub ferries: usize,
    pub roads: usize,
    pub roads_with_ferry: usize,
    pub completed: Vec<Stage>,
    pub total_demand: Option<f64>,
    /// Longest great-circle distance between two airports, in km
    pub max_distance_km: Option<f64>,
}

impl NetworkSummary {
    pub(crate) fn from_network(network: &Network) -> Self {
        let distances = network.distance_matrix().ok();
        let demand = network.demand_matrix().ok();

        Self {
            airports: network.airports().len(),
            ferries: network.ferries().len(),
            roads: network.roads().len(),
            roads_with_ferry: network.roads().iter().filter(|r| r.has_ferry()).count(),
            completed: network.completed_stages(),
            total_demand: demand.map(|d| d.total()),
            max_distance_km: distances.map(|d| d.iter().copied().fold(0.0, f64::max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AirportKey, AirportRecord, Coordinates};

    #[test]
    fn test_summary_tracks_stages() {
        let mut network = Network::default();
        assert!(network.summary().completed.is_empty());

        for (name, lon) in [("A", 0.0), ("B", 1.0)] {
            network
                .add_airport(AirportRecord::new(
                    AirportKey::new(name, "S", "C"),
                    Coordinates::new(0.0, lon),
                    100.0,
                    50.0,
                ))
                .unwrap();
        }
        network.compute_distances().unwrap();

        let summary = network.summary();
        assert_eq!(summary.airports, 2);
        assert_eq!(summary.completed, vec![Stage::Airports, Stage::Distances]);
        assert!(summary.total_demand.is_none());
        assert!((summary.max_distance_km.unwrap() - 111.19).abs() < 0.01);

        network.compute_demand().unwrap();
        let summary = network.summary();
        assert_eq!(summary.completed.last(), Some(&Stage::Demand));
        assert!(summary.total_demand.unwrap() > 0.0);
    }

    #[test]
    fn test_setup_report_counts() {
        let report = SetupReport::default();
        assert_eq!(report.rejected_count(), 0);
        assert!(report.aborted_sources().is_empty());
    }
}
