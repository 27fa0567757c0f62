use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Index Newtypes
// ============================================================================

/// Stable index of an airport, assigned in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AirportId(pub usize);

/// Stable index of a ferry service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FerryId(pub usize);

/// Stable index of a road segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoadId(pub usize);

macro_rules! index_newtype {
    ($name:ident, $prefix:literal) => {
        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

index_newtype!(AirportId, "airport");
index_newtype!(FerryId, "ferry");
index_newtype!(RoadId, "road");

// ============================================================================
// Natural Keys
// ============================================================================

/// Natural key of an airport: (name, state/region, country).
///
/// Unique across every loaded source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AirportKey {
    pub name: String,
    pub region: String,
    pub country: String,
}

impl AirportKey {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            country: country.into(),
        }
    }
}

impl fmt::Display for AirportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.name, self.region, self.country)
    }
}

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl Coordinates {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }
}

impl std::str::FromStr for Coordinates {
    type Err = String;

    /// Parses a `"lat,lon"` pair
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("location '{s}' is not a 'lat,lon' pair"))?;
        let latitude_deg = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("latitude '{}' is not a number", lat.trim()))?;
        let longitude_deg = lon
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("longitude '{}' is not a number", lon.trim()))?;
        Ok(Self::new(latitude_deg, longitude_deg))
    }
}
