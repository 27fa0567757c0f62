//! # Network Orchestrator
//!
//! Owns the registries and the derived matrices for one simulation run and
//! sequences the pipeline:
//!
//! airports -> ferries -> roads -> distance matrix -> demand matrix
//!
//! Each stage checks that its inputs exist. Adding an airport discards the
//! derived matrices, which must then be recomputed.

pub mod summary;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{Config, DataConfig};
use crate::demand::{distance_metric, DemandEstimator, DemandMatrix, DemandParams};
use crate::domain::{
    AirportId, AirportKey, AirportRecord, AirportRegistry, FerryId, FerryRecord, FerryRegistry,
    RoadFailurePolicy, RoadGraph, RoadId, RoadRecord,
};
use crate::error::{NetworkError, Result};
use crate::geography;
use crate::loader::{self, LoadReport};

pub use summary::{NetworkSummary, SetupReport};

/// Pipeline stages, in dependency order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Airports,
    Ferries,
    Roads,
    Distances,
    Demand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub demand: DemandParams,
    pub road_policy: RoadFailurePolicy,
}

/// Derived matrices, valid for the airport set they were computed from
#[derive(Debug, Default)]
struct Derived {
    distances: Option<Array2<f64>>,
    distance_metric: Option<Array2<f64>>,
    demand: Option<DemandMatrix>,
}

#[derive(Debug, Default)]
pub struct Network {
    settings: NetworkSettings,
    airports: AirportRegistry,
    ferries: FerryRegistry,
    roads: RoadGraph,
    /// Loading stages that have run, even if they found nothing to load
    loaded: BTreeSet<Stage>,
    derived: Derived,
}

impl Network {
    pub fn new(settings: NetworkSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.network_settings())
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    pub fn add_airport(&mut self, record: AirportRecord) -> Result<AirportId> {
        let id = self.airports.add(record)?;
        self.loaded.insert(Stage::Airports);
        self.invalidate_derived();
        Ok(id)
    }

    pub fn add_ferry(&mut self, record: FerryRecord) -> Result<FerryId> {
        let id = self.ferries.add(record)?;
        self.loaded.insert(Stage::Ferries);
        Ok(id)
    }

    pub fn add_road(&mut self, record: &RoadRecord) -> Result<RoadId> {
        self.require_airports("add roads")?;
        let id = self.roads.add(record, &self.airports, &self.ferries)?;
        self.loaded.insert(Stage::Roads);
        Ok(id)
    }

    pub fn load_airports<R: Read>(&mut self, reader: R, source: &str) -> Result<LoadReport> {
        let before = self.airports.len();
        let report = loader::load_airports(reader, source, &mut self.airports)?;
        self.loaded.insert(Stage::Airports);
        if self.airports.len() != before {
            self.invalidate_derived();
        }
        Ok(report)
    }

    pub fn load_ferries<R: Read>(&mut self, reader: R, source: &str) -> Result<LoadReport> {
        let report = loader::load_ferries(reader, source, &mut self.ferries)?;
        self.loaded.insert(Stage::Ferries);
        Ok(report)
    }

    pub fn load_roads<R: Read>(&mut self, reader: R, source: &str) -> Result<LoadReport> {
        self.require_airports("load roads")?;
        let report = loader::load_roads(
            reader,
            source,
            &mut self.roads,
            &self.airports,
            &self.ferries,
            self.settings.road_policy,
        )?;
        self.loaded.insert(Stage::Roads);
        Ok(report)
    }

    pub fn load_airport_dir(&mut self, dir: &Path) -> Result<Vec<LoadReport>> {
        self.load_dir(dir, Stage::Airports, |network, file, source| {
            network.load_airports(file, source)
        })
    }

    pub fn load_ferry_dir(&mut self, dir: &Path) -> Result<Vec<LoadReport>> {
        self.load_dir(dir, Stage::Ferries, |network, file, source| {
            network.load_ferries(file, source)
        })
    }

    pub fn load_road_dir(&mut self, dir: &Path) -> Result<Vec<LoadReport>> {
        self.load_dir(dir, Stage::Roads, |network, file, source| {
            network.load_roads(file, source)
        })
    }

    /// Load every file in `dir` in name order. A file that cannot be read as
    /// a source of this kind is reported as aborted and the next file is
    /// loaded. Failing to list or open files is fatal.
    fn load_dir<F>(&mut self, dir: &Path, stage: Stage, mut load: F) -> Result<Vec<LoadReport>>
    where
        F: FnMut(&mut Self, File, &str) -> Result<LoadReport>,
    {
        let mut reports = Vec::new();
        for path in loader::source_files(dir)? {
            let (file, source) = loader::open_source(&path)?;
            let report = match load(self, file, &source) {
                Ok(report) => report,
                Err(error @ (NetworkError::Validation { .. } | NetworkError::Csv(_))) => {
                    LoadReport::unreadable(&source, &error)
                }
                Err(error) => return Err(error),
            };
            if report.aborted {
                warn!(source = %report.source, %stage, "source rejected, continuing with the next source");
            }
            reports.push(report);
        }
        self.loaded.insert(stage);
        Ok(reports)
    }

    // ------------------------------------------------------------------
    // Derived matrices
    // ------------------------------------------------------------------

    /// Recompute the great-circle distance matrix for the current airports
    pub fn compute_distances(&mut self) -> Result<&Array2<f64>> {
        self.require_airports("compute distances")?;
        let distances = geography::distance_matrix_degrees(
            self.airports.latitudes_deg().view(),
            self.airports.longitudes_deg().view(),
        )?;
        let metric = distance_metric(distances.view(), self.settings.demand.constant_km);
        info!(airports = self.airports.len(), "computed great-circle distances");

        self.derived = Derived {
            distances: Some(distances),
            distance_metric: Some(metric),
            demand: None,
        };
        self.distance_matrix()
    }

    /// Estimate origin-destination demand from GDP and the distance matrix
    pub fn compute_demand(&mut self) -> Result<&DemandMatrix> {
        let (distances, metric) = match (&self.derived.distances, &self.derived.distance_metric) {
            (Some(distances), Some(metric)) => (distances, metric),
            _ => {
                return Err(NetworkError::NotReady {
                    operation: "estimate demand",
                    missing: Stage::Distances,
                })
            }
        };

        let estimator = DemandEstimator::new(self.settings.demand);
        let demand = estimator.estimate_with_metric(
            self.airports.economic_snapshot().view(),
            distances.view(),
            metric.view(),
        )?;
        info!(
            airports = demand.len(),
            total_demand = demand.total(),
            "estimated origin-destination travel demand"
        );

        Ok(self.derived.demand.insert(demand))
    }

    /// Run the whole pipeline from the configured source folders
    pub fn setup(&mut self, data: &DataConfig) -> Result<SetupReport> {
        let airports = self.load_airport_dir(&data.airports_dir)?;
        info!(airports = self.airports.len(), "airport stage complete");

        let ferries = self.load_ferry_dir(&data.ferries_dir)?;
        info!(ferries = self.ferries.len(), "ferry stage complete");

        let roads = self.load_road_dir(&data.roads_dir)?;
        info!(roads = self.roads.len(), "road stage complete");

        self.compute_distances()?;
        self.compute_demand()?;

        Ok(SetupReport {
            airports,
            ferries,
            roads,
        })
    }

    fn require_airports(&self, operation: &'static str) -> Result<()> {
        if self.airports.is_empty() {
            return Err(NetworkError::NotReady {
                operation,
                missing: Stage::Airports,
            });
        }
        Ok(())
    }

    fn invalidate_derived(&mut self) {
        self.derived = Derived::default();
    }

    // ------------------------------------------------------------------
    // Read-only access
    // ------------------------------------------------------------------

    pub fn airports(&self) -> &AirportRegistry {
        &self.airports
    }

    pub fn ferries(&self) -> &FerryRegistry {
        &self.ferries
    }

    pub fn roads(&self) -> &RoadGraph {
        &self.roads
    }

    pub fn airport_count(&self) -> usize {
        self.airports.len()
    }

    pub fn display_airport(&self, id: AirportId) -> Option<String> {
        self.airports.get(id).map(ToString::to_string)
    }

    pub fn display_airport_by_key(&self, key: &AirportKey) -> Option<String> {
        self.airports.get_by_key(key).map(ToString::to_string)
    }

    pub fn display_all_airports(&self) -> Vec<String> {
        self.airports.iter().map(ToString::to_string).collect()
    }

    pub fn distance_matrix(&self) -> Result<&Array2<f64>> {
        self.derived.distances.as_ref().ok_or(NetworkError::NotReady {
            operation: "read the distance matrix",
            missing: Stage::Distances,
        })
    }

    /// Reciprocal distance-decay metric used by the demand estimator
    pub fn distance_metric(&self) -> Result<&Array2<f64>> {
        self.derived
            .distance_metric
            .as_ref()
            .ok_or(NetworkError::NotReady {
                operation: "read the distance metric",
                missing: Stage::Distances,
            })
    }

    pub fn demand_matrix(&self) -> Result<&DemandMatrix> {
        self.derived.demand.as_ref().ok_or(NetworkError::NotReady {
            operation: "read the demand matrix",
            missing: Stage::Demand,
        })
    }

    /// Stages that have run, in pipeline order. Distances and demand count
    /// only while their matrices are current.
    pub fn completed_stages(&self) -> Vec<Stage> {
        let mut completed = self.loaded.clone();
        if self.derived.distances.is_some() {
            completed.insert(Stage::Distances);
        }
        if self.derived.demand.is_some() {
            completed.insert(Stage::Demand);
        }
        completed.into_iter().collect()
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary::from_network(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    fn key(name: &str) -> AirportKey {
        AirportKey::new(name, "S", "C")
    }

    fn airport(name: &str, lat: f64, lon: f64, pop: f64, gdp_head: f64) -> AirportRecord {
        AirportRecord::new(key(name), Coordinates::new(lat, lon), pop, gdp_head)
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Distances.to_string(), "distances");
        assert!(Stage::Airports < Stage::Demand);
    }

    #[test]
    fn test_demand_before_distances_not_ready() {
        let mut network = Network::default();
        network.add_airport(airport("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        let err = network.compute_demand().unwrap_err();
        assert!(matches!(
            err,
            NetworkError::NotReady {
                missing: Stage::Distances,
                ..
            }
        ));
    }

    #[test]
    fn test_distances_without_airports_not_ready() {
        let mut network = Network::default();
        let err = network.compute_distances().unwrap_err();
        assert!(matches!(
            err,
            NetworkError::NotReady {
                missing: Stage::Airports,
                ..
            }
        ));
        assert!(network.distance_matrix().is_err());
    }

    #[test]
    fn test_roads_require_airports() {
        let mut network = Network::default();
        let err = network
            .add_road(&RoadRecord::new(key("A"), key("B"), 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, NetworkError::NotReady { .. }));
    }

    #[test]
    fn test_adding_airport_invalidates_matrices() {
        let mut network = Network::default();
        network.add_airport(airport("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        network.add_airport(airport("B", 0.0, 1.0, 200.0, 50.0)).unwrap();
        network.compute_distances().unwrap();
        network.compute_demand().unwrap();
        assert!(network.demand_matrix().is_ok());

        network.add_airport(airport("C", 1.0, 0.0, 50.0, 80.0)).unwrap();
        assert!(network.distance_matrix().is_err());
        assert!(network.demand_matrix().is_err());
        assert!(network.compute_demand().is_err());

        assert_eq!(network.compute_distances().unwrap().dim(), (3, 3));
        assert_eq!(network.compute_demand().unwrap().len(), 3);
    }

    #[test]
    fn test_rejected_airport_keeps_matrices() {
        let mut network = Network::default();
        network.add_airport(airport("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        network.add_airport(airport("B", 0.0, 1.0, 200.0, 50.0)).unwrap();
        network.compute_distances().unwrap();

        assert!(network.add_airport(airport("A", 0.0, 0.0, 1.0, 1.0)).is_err());
        assert!(network.distance_matrix().is_ok());
    }

    #[test]
    fn test_single_airport_demand_is_degenerate() {
        let mut network = Network::default();
        network.add_airport(airport("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        network.compute_distances().unwrap();
        assert!(matches!(
            network.compute_demand().unwrap_err(),
            NetworkError::DegenerateInput(_)
        ));
    }

    #[test]
    fn test_completed_stages_track_runs_not_contents() {
        let mut network = Network::default();
        assert!(network.completed_stages().is_empty());

        network.add_airport(airport("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        network.add_airport(airport("B", 0.0, 1.0, 200.0, 50.0)).unwrap();
        let header = "Ferry Name,Transport Time,Car Load + Unload Time,Pax Load Time,Car Cost,Pax Cost,Frequency\n";
        let report = network.load_ferries(header.as_bytes(), "ferries.csv").unwrap();
        assert_eq!(report.accepted, 0);
        assert!(network.ferries().is_empty());
        assert_eq!(network.completed_stages(), vec![Stage::Airports, Stage::Ferries]);

        network.compute_distances().unwrap();
        network.compute_demand().unwrap();
        assert_eq!(
            network.completed_stages(),
            vec![Stage::Airports, Stage::Ferries, Stage::Distances, Stage::Demand]
        );

        network.add_airport(airport("C", 1.0, 0.0, 50.0, 80.0)).unwrap();
        assert_eq!(network.completed_stages(), vec![Stage::Airports, Stage::Ferries]);
    }

    #[test]
    fn test_display_airport() {
        let mut network = Network::default();
        let id = network.add_airport(airport("A", 1.0, 2.0, 10.0, 3.0)).unwrap();
        let line = network.display_airport(id).unwrap();
        assert!(line.starts_with("A, S, C Lat = 1 Long = 2"));
        assert_eq!(network.display_airport_by_key(&key("A")), Some(line));
        assert_eq!(network.display_airport_by_key(&key("Z")), None);
        assert_eq!(network.display_all_airports().len(), 1);
    }
}
