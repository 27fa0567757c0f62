use ndarray::Array1;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;
use validator::Validate;

use super::types::{AirportId, AirportKey, Coordinates};
use crate::error::{non_finite_fields, NetworkError, Result};

/// Raw airport attributes, validated before entering the registry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AirportRecord {
    pub key: AirportKey,
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must lie in [-90, 90]"))]
    pub latitude_deg: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must lie in [-180, 180]"))]
    pub longitude_deg: f64,
    /// Catchment population in thousands
    #[validate(range(min = 0.0, message = "population must be non-negative"))]
    pub population_k: f64,
    /// GDP per head in thousands of USD
    #[validate(range(min = 0.0, message = "GDP per head must be non-negative"))]
    pub gdp_per_head_k: f64,
}

impl AirportRecord {
    /// Range and finiteness checks on the numeric attributes
    pub fn check(&self) -> Result<()> {
        let subject = format!("airport {}", self.key);
        let non_finite = non_finite_fields(&[
            ("latitude", self.latitude_deg),
            ("longitude", self.longitude_deg),
            ("population", self.population_k),
            ("GDP per head", self.gdp_per_head_k),
        ]);
        if !non_finite.is_empty() {
            return Err(NetworkError::validation(subject, non_finite));
        }
        self.validate()
            .map_err(|e| NetworkError::invalid_fields(subject, &e))
    }

    pub fn new(key: AirportKey, location: Coordinates, population_k: f64, gdp_per_head_k: f64) -> Self {
        Self {
            key,
            latitude_deg: location.latitude_deg,
            longitude_deg: location.longitude_deg,
            population_k,
            gdp_per_head_k,
        }
    }
}

/// A network node. Immutable once registered.
#[derive(Debug, Clone, Serialize)]
pub struct Airport {
    pub id: AirportId,
    pub key: AirportKey,
    pub location: Coordinates,
    pub population_k: f64,
    pub gdp_per_head_k: f64,
}

impl Airport {
    /// Total GDP of the catchment area (population x GDP per head)
    pub fn gdp(&self) -> f64 {
        self.population_k * self.gdp_per_head_k
    }
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} Lat = {} Long = {} GDP per capita = {} Population = {} GDP = {}",
            self.key.name,
            self.key.region,
            self.key.country,
            self.location.latitude_deg,
            self.location.longitude_deg,
            self.gdp_per_head_k,
            self.population_k,
            self.gdp()
        )
    }
}

/// Authoritative set of airports.
///
/// Indices are handed out sequentially and never reused. The GDP snapshot is
/// derived on first request and dropped whenever an airport is added.
#[derive(Debug, Default)]
pub struct AirportRegistry {
    airports: Vec<Airport>,
    index_by_key: HashMap<AirportKey, AirportId>,
    gdp_snapshot: OnceCell<Array1<f64>>,
}

impl AirportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append an airport, returning its new index
    pub fn add(&mut self, record: AirportRecord) -> Result<AirportId> {
        if self.index_by_key.contains_key(&record.key) {
            return Err(NetworkError::DuplicateKey {
                kind: "airport",
                key: record.key.to_string(),
            });
        }
        record.check()?;

        let id = AirportId(self.airports.len());
        debug!(%id, key = %record.key, "registered airport");
        self.index_by_key.insert(record.key.clone(), id);
        self.airports.push(Airport {
            id,
            key: record.key,
            location: Coordinates::new(record.latitude_deg, record.longitude_deg),
            population_k: record.population_k,
            gdp_per_head_k: record.gdp_per_head_k,
        });
        self.gdp_snapshot = OnceCell::new();
        Ok(id)
    }

    pub fn lookup(&self, key: &AirportKey) -> Option<AirportId> {
        self.index_by_key.get(key).copied()
    }

    pub fn get(&self, id: AirportId) -> Option<&Airport> {
        self.airports.get(id.index())
    }

    pub fn get_by_key(&self, key: &AirportKey) -> Option<&Airport> {
        self.lookup(key).and_then(|id| self.get(id))
    }

    pub fn contains(&self, id: AirportId) -> bool {
        id.index() < self.airports.len()
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Airport> {
        self.airports.iter()
    }

    /// Catchment GDP per airport, indexed by [`AirportId`]
    pub fn economic_snapshot(&self) -> &Array1<f64> {
        self.gdp_snapshot
            .get_or_init(|| self.airports.iter().map(Airport::gdp).collect())
    }

    pub fn latitudes_deg(&self) -> Array1<f64> {
        self.airports.iter().map(|a| a.location.latitude_deg).collect()
    }

    pub fn longitudes_deg(&self) -> Array1<f64> {
        self.airports.iter().map(|a| a.location.longitude_deg).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, lat: f64, lon: f64, pop: f64, gdp_head: f64) -> AirportRecord {
        AirportRecord::new(
            AirportKey::new(name, "State", "Country"),
            Coordinates::new(lat, lon),
            pop,
            gdp_head,
        )
    }

    #[test]
    fn test_sequential_indices() {
        let mut registry = AirportRegistry::new();
        let a = registry.add(record("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        let b = registry.add(record("B", 0.0, 1.0, 200.0, 50.0)).unwrap();

        assert_eq!(a, AirportId(0));
        assert_eq!(b, AirportId(1));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup(&AirportKey::new("B", "State", "Country")), Some(b));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = AirportRegistry::new();
        registry.add(record("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        let err = registry.add(record("A", 5.0, 5.0, 1.0, 1.0)).unwrap_err();

        assert!(matches!(err, NetworkError::DuplicateKey { kind: "airport", .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(AirportId(0)).unwrap().location.latitude_deg, 0.0);
    }

    #[test]
    fn test_same_name_different_country_is_distinct() {
        let mut registry = AirportRegistry::new();
        registry
            .add(AirportRecord::new(
                AirportKey::new("Perth", "WA", "Australia"),
                Coordinates::new(-31.9, 115.9),
                2000.0,
                60.0,
            ))
            .unwrap();
        let id = registry
            .add(AirportRecord::new(
                AirportKey::new("Perth", "Scotland", "United Kingdom"),
                Coordinates::new(56.4, -3.4),
                50.0,
                40.0,
            ))
            .unwrap();
        assert_eq!(id, AirportId(1));
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let registry = AirportRegistry::new();
        assert_eq!(registry.lookup(&AirportKey::new("X", "Y", "Z")), None);
        assert!(registry.get(AirportId(0)).is_none());
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let mut registry = AirportRegistry::new();
        let err = registry.add(record("A", 91.0, 0.0, 100.0, 50.0)).unwrap_err();
        assert!(matches!(err, NetworkError::Validation { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_economic_snapshot_invalidated_on_add() {
        let mut registry = AirportRegistry::new();
        registry.add(record("A", 0.0, 0.0, 100.0, 50.0)).unwrap();
        assert_eq!(registry.economic_snapshot().to_vec(), vec![5000.0]);

        registry.add(record("B", 0.0, 1.0, 200.0, 50.0)).unwrap();
        assert_eq!(registry.economic_snapshot().to_vec(), vec![5000.0, 10000.0]);
    }

    #[test]
    fn test_display_line() {
        let mut registry = AirportRegistry::new();
        let id = registry.add(record("A", 1.5, 2.5, 10.0, 3.0)).unwrap();
        let line = registry.get(id).unwrap().to_string();
        assert_eq!(
            line,
            "A, State, Country Lat = 1.5 Long = 2.5 GDP per capita = 3 Population = 10 GDP = 30"
        );
    }
}
