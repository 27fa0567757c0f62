//! # Road Graph
//!
//! Road segments between airports, with ferry crossings attached. Every road
//! is indexed under both orientations and both endpoints gain an adjacency
//! entry, so lookups work from either end.
//!
//! Adding a road is split in two: [`RoadGraph::resolve`] checks a record
//! against the registries without touching the graph, and
//! [`RoadGraph::commit`] applies a resolved road. A rejected record therefore
//! never leaves partial index or adjacency updates behind.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::airport::AirportRegistry;
use super::ferry::FerryRegistry;
use super::types::{AirportId, AirportKey, FerryId, RoadId};
use crate::error::{NetworkError, Result};

/// How a road source reacts to invalid records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoadFailurePolicy {
    /// Any endpoint failure (unknown airport, self-loop, unreadable row)
    /// rejects every road in the source. Other failures reject only their
    /// own record.
    #[default]
    PerFile,
    /// Only the failing records are rejected
    PerRecord,
}

/// Road attributes as read from a source row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadRecord {
    pub start: AirportKey,
    pub end: AirportKey,
    pub distance_km: f64,
    pub speed_kmh: f64,
    pub has_ferry: bool,
    /// Names of the ferries serving the segment, in source order
    pub ferries: Vec<String>,
}

impl RoadRecord {
    pub fn new(start: AirportKey, end: AirportKey, distance_km: f64, speed_kmh: f64) -> Self {
        Self {
            start,
            end,
            distance_km,
            speed_kmh,
            has_ferry: false,
            ferries: Vec::new(),
        }
    }

    pub fn with_ferries<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.ferries = names.into_iter().map(Into::into).collect();
        self.has_ferry = true;
        self
    }

    pub fn label(&self) -> String {
        format!("{} to {}", self.start, self.end)
    }
}

/// A committed road segment
#[derive(Debug, Clone, Serialize)]
pub struct Road {
    pub id: RoadId,
    pub start: AirportId,
    pub end: AirportId,
    pub distance_km: f64,
    pub speed_kmh: f64,
    /// Default travel time in hours
    pub travel_time_h: f64,
    pub ferries: Vec<FerryId>,
}

impl Road {
    pub fn has_ferry(&self) -> bool {
        !self.ferries.is_empty()
    }

    /// The endpoint opposite `from`, if `from` is an endpoint of this road
    pub fn other_end(&self, from: AirportId) -> Option<AirportId> {
        if from == self.start {
            Some(self.end)
        } else if from == self.end {
            Some(self.start)
        } else {
            None
        }
    }

    /// "start to end" using the airports' natural keys
    pub fn describe(&self, airports: &AirportRegistry) -> String {
        let name = |id: AirportId| {
            airports
                .get(id)
                .map(|a| a.key.to_string())
                .unwrap_or_else(|| id.to_string())
        };
        format!("{} to {}", name(self.start), name(self.end))
    }
}

/// One adjacency entry: a directly connected airport and the road to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Neighbor {
    pub airport: AirportId,
    pub road: RoadId,
}

/// Why a road record was refused
#[derive(Debug, Clone)]
pub struct RoadRejection {
    pub road: String,
    /// Unknown airport or identical endpoints
    pub endpoint_failure: bool,
    pub problems: Vec<String>,
}

impl fmt::Display for RoadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road {}: {}", self.road, self.problems.join("; "))
    }
}

impl From<RoadRejection> for NetworkError {
    fn from(rejection: RoadRejection) -> Self {
        NetworkError::validation(format!("road {}", rejection.road), rejection.problems)
    }
}

/// A road that passed validation but is not yet part of the graph
#[derive(Debug, Clone)]
pub struct ResolvedRoad {
    start: AirportId,
    end: AirportId,
    distance_km: f64,
    speed_kmh: f64,
    ferries: Vec<FerryId>,
}

#[derive(Debug, Default)]
pub struct RoadGraph {
    roads: Vec<Road>,
    /// Both (start, end) and (end, start) map to the roads joining the pair
    by_pair: HashMap<(AirportId, AirportId), Vec<RoadId>>,
    adjacency: HashMap<AirportId, Vec<Neighbor>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a record against the registries without modifying the graph.
    ///
    /// Checks run in order: endpoints exist, endpoints differ, ferries exist,
    /// then numeric attributes. Every problem found is reported together.
    pub fn resolve(
        &self,
        record: &RoadRecord,
        airports: &AirportRegistry,
        ferries: &FerryRegistry,
    ) -> std::result::Result<ResolvedRoad, RoadRejection> {
        let mut problems = Vec::new();
        let mut endpoint_failure = false;

        let start = airports.lookup(&record.start);
        if start.is_none() {
            problems.push(format!("node {} is not a valid airport", record.start));
            endpoint_failure = true;
        }
        let end = airports.lookup(&record.end);
        if end.is_none() {
            problems.push(format!("node {} is not a valid airport", record.end));
            endpoint_failure = true;
        }
        if record.start == record.end {
            problems.push(format!(
                "starting and ending nodes are both {}",
                record.start
            ));
            endpoint_failure = true;
        }

        let mut ferry_ids = Vec::with_capacity(record.ferries.len());
        if record.has_ferry && record.ferries.is_empty() {
            problems.push("road is marked as having a ferry but names none".to_string());
        }
        let unknown = record
            .ferries
            .iter()
            .filter(|name| match ferries.lookup(name) {
                Some(id) => {
                    ferry_ids.push(id);
                    false
                }
                None => true,
            })
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            problems.push(format!(
                "ferry {} is not a recorded ferry",
                unknown.iter().map(|n| format!("'{n}'")).join(", ")
            ));
        }

        if !record.distance_km.is_finite() || record.distance_km < 0.0 {
            problems.push(format!(
                "distance must be a non-negative number, got {}",
                record.distance_km
            ));
        }
        if !record.speed_kmh.is_finite() || record.speed_kmh <= 0.0 {
            problems.push(format!(
                "speed must be a positive number, got {}",
                record.speed_kmh
            ));
        }

        match (start, end) {
            (Some(start), Some(end)) if problems.is_empty() => Ok(ResolvedRoad {
                start,
                end,
                distance_km: record.distance_km,
                speed_kmh: record.speed_kmh,
                ferries: ferry_ids,
            }),
            _ => Err(RoadRejection {
                road: record.label(),
                endpoint_failure,
                problems,
            }),
        }
    }

    /// Add a resolved road, indexing it in both directions
    pub fn commit(&mut self, resolved: ResolvedRoad) -> RoadId {
        let id = RoadId(self.roads.len());
        let ResolvedRoad {
            start,
            end,
            distance_km,
            speed_kmh,
            ferries,
        } = resolved;

        self.by_pair.entry((start, end)).or_default().push(id);
        self.by_pair.entry((end, start)).or_default().push(id);
        self.adjacency
            .entry(start)
            .or_default()
            .push(Neighbor { airport: end, road: id });
        self.adjacency
            .entry(end)
            .or_default()
            .push(Neighbor { airport: start, road: id });

        debug!(%id, %start, %end, distance_km, "committed road");
        self.roads.push(Road {
            id,
            start,
            end,
            distance_km,
            speed_kmh,
            travel_time_h: distance_km / speed_kmh,
            ferries,
        });
        id
    }

    /// Validate and add a single road
    pub fn add(
        &mut self,
        record: &RoadRecord,
        airports: &AirportRegistry,
        ferries: &FerryRegistry,
    ) -> Result<RoadId> {
        let resolved = self.resolve(record, airports, ferries)?;
        Ok(self.commit(resolved))
    }

    pub fn get(&self, id: RoadId) -> Option<&Road> {
        self.roads.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Road> {
        self.roads.iter()
    }

    /// Airports reachable over a single road, with the road used
    pub fn neighbors(&self, airport: AirportId) -> &[Neighbor] {
        self.adjacency
            .get(&airport)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn neighbors_by_key(&self, key: &AirportKey, airports: &AirportRegistry) -> &[Neighbor] {
        airports
            .lookup(key)
            .map(|id| self.neighbors(id))
            .unwrap_or_default()
    }

    /// Roads joining two airports, in either orientation
    pub fn roads_between(&self, a: AirportId, b: AirportId) -> &[RoadId] {
        self.by_pair
            .get(&(a, b))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn roads_between_keys(
        &self,
        a: &AirportKey,
        b: &AirportKey,
        airports: &AirportRegistry,
    ) -> &[RoadId] {
        match (airports.lookup(a), airports.lookup(b)) {
            (Some(a), Some(b)) => self.roads_between(a, b),
            _ => &[],
        }
    }
}
