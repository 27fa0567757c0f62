//! Column layouts of the tabular sources

use csv::StringRecord;
use serde::Deserialize;

use crate::domain::{AirportKey, AirportRecord, Coordinates, FerryRecord, RoadRecord};

pub const AIRPORT_COLUMNS: [&str; 6] = [
    "Name",
    "State",
    "Country",
    "Location",
    "Population (k)",
    "GDP/head ($k)",
];

pub const FERRY_COLUMNS: [&str; 7] = [
    "Ferry Name",
    "Transport Time",
    "Car Load + Unload Time",
    "Pax Load Time",
    "Car Cost",
    "Pax Cost",
    "Frequency",
];

pub const ROAD_COLUMNS: [&str; 9] = [
    "Start Node",
    "Start State",
    "Start Country",
    "End Node",
    "End State",
    "End Country",
    "Distance (km)",
    "Speed (km/h)",
    "Has Ferry",
];

fn column<'a>(headers: &StringRecord, record: &'a StringRecord, name: &str) -> &'a str {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| record.get(i))
        .unwrap_or_default()
}

/// Natural key of a raw airport row, for messages about rows that failed to parse
pub fn airport_label(headers: &StringRecord, record: &StringRecord) -> String {
    AirportKey::new(
        column(headers, record, "Name"),
        column(headers, record, "State"),
        column(headers, record, "Country"),
    )
    .to_string()
}

pub fn ferry_label(headers: &StringRecord, record: &StringRecord) -> String {
    column(headers, record, "Ferry Name").to_string()
}

pub fn road_label(headers: &StringRecord, record: &StringRecord) -> String {
    let start = AirportKey::new(
        column(headers, record, "Start Node"),
        column(headers, record, "Start State"),
        column(headers, record, "Start Country"),
    );
    let end = AirportKey::new(
        column(headers, record, "End Node"),
        column(headers, record, "End State"),
        column(headers, record, "End Country"),
    );
    format!("{start} to {end}")
}

#[derive(Debug, Deserialize)]
pub struct AirportRow {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    /// "lat,lon" in degrees
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Population (k)")]
    pub population_k: f64,
    #[serde(rename = "GDP/head ($k)")]
    pub gdp_per_head_k: f64,
}

impl AirportRow {
    pub fn into_record(self) -> Result<AirportRecord, String> {
        let key = AirportKey::new(self.name, self.state, self.country);
        let location: Coordinates = self
            .location
            .parse()
            .map_err(|e| format!("airport {key}: {e}"))?;
        Ok(AirportRecord::new(
            key,
            location,
            self.population_k,
            self.gdp_per_head_k,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct FerryRow {
    #[serde(rename = "Ferry Name", default)]
    pub name: String,
    #[serde(rename = "Transport Time")]
    pub transport_time_h: f64,
    #[serde(rename = "Car Load + Unload Time")]
    pub car_load_time_h: f64,
    #[serde(rename = "Pax Load Time")]
    pub pax_load_time_h: f64,
    #[serde(rename = "Car Cost")]
    pub car_cost: f64,
    #[serde(rename = "Pax Cost")]
    pub pax_cost: f64,
    /// Sailings per week
    #[serde(rename = "Frequency")]
    pub frequency: f64,
}

impl FerryRow {
    pub fn into_record(self) -> FerryRecord {
        FerryRecord {
            name: self.name,
            transport_time_h: self.transport_time_h,
            car_load_time_h: self.car_load_time_h,
            pax_load_time_h: self.pax_load_time_h,
            car_cost: self.car_cost,
            pax_cost: self.pax_cost,
            weekly_frequency: self.frequency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RoadRow {
    #[serde(rename = "Start Node", default)]
    pub start_name: String,
    #[serde(rename = "Start State", default)]
    pub start_state: String,
    #[serde(rename = "Start Country", default)]
    pub start_country: String,
    #[serde(rename = "End Node", default)]
    pub end_name: String,
    #[serde(rename = "End State", default)]
    pub end_state: String,
    #[serde(rename = "End Country", default)]
    pub end_country: String,
    #[serde(rename = "Distance (km)")]
    pub distance_km: f64,
    #[serde(rename = "Speed (km/h)")]
    pub speed_kmh: f64,
    /// "yes" (any case) when the segment includes a ferry crossing
    #[serde(rename = "Has Ferry", default)]
    pub has_ferry: String,
    /// Comma-separated ferry names
    #[serde(rename = "Ferries", default)]
    pub ferries: Option<String>,
}

impl RoadRow {
    pub fn into_record(self) -> RoadRecord {
        let has_ferry = self.has_ferry.trim().eq_ignore_ascii_case("yes");
        let ferries = match (&self.ferries, has_ferry) {
            (Some(names), true) => names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        };

        RoadRecord {
            start: AirportKey::new(self.start_name, self.start_state, self.start_country),
            end: AirportKey::new(self.end_name, self.end_state, self.end_country),
            distance_km: self.distance_km,
            speed_kmh: self.speed_kmh,
            has_ferry,
            ferries,
        }
    }
}
