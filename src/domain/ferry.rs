use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use validator::Validate;

use super::types::FerryId;
use crate::error::{non_finite_fields, NetworkError, Result};

/// Ferry service attributes as read from a source row
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FerryRecord {
    #[validate(length(min = 1, message = "ferry name must not be empty"))]
    pub name: String,
    /// Crossing duration (hours)
    #[validate(range(min = 0.0, message = "transport time must be non-negative"))]
    pub transport_time_h: f64,
    /// Loading plus unloading time for cars and buses (hours)
    #[validate(range(min = 0.0, message = "car load time must be non-negative"))]
    pub car_load_time_h: f64,
    /// Loading time for foot passengers (hours)
    #[validate(range(min = 0.0, message = "passenger load time must be non-negative"))]
    pub pax_load_time_h: f64,
    /// Fare for one car ($)
    #[validate(range(min = 0.0, message = "car cost must be non-negative"))]
    pub car_cost: f64,
    /// Fare for one passenger, on foot or by bus ($)
    #[validate(range(min = 0.0, message = "passenger cost must be non-negative"))]
    pub pax_cost: f64,
    /// Sailings per week, averaged where the timetable varies
    #[validate(range(min = 0.0, message = "weekly frequency must be non-negative"))]
    pub weekly_frequency: f64,
}

impl FerryRecord {
    pub fn check(&self) -> Result<()> {
        let subject = format!("ferry {}", self.name);
        let non_finite = non_finite_fields(&[
            ("transport time", self.transport_time_h),
            ("car load time", self.car_load_time_h),
            ("passenger load time", self.pax_load_time_h),
            ("car cost", self.car_cost),
            ("passenger cost", self.pax_cost),
            ("weekly frequency", self.weekly_frequency),
        ]);
        if !non_finite.is_empty() {
            return Err(NetworkError::validation(subject, non_finite));
        }
        self.validate()
            .map_err(|e| NetworkError::invalid_fields(subject, &e))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ferry {
    pub id: FerryId,
    pub name: String,
    pub transport_time_h: f64,
    pub car_load_time_h: f64,
    pub pax_load_time_h: f64,
    pub car_cost: f64,
    pub pax_cost: f64,
    pub weekly_frequency: f64,
}

/// Named ferry services, keyed by unique name
#[derive(Debug, Default)]
pub struct FerryRegistry {
    ferries: Vec<Ferry>,
    index_by_name: HashMap<String, FerryId>,
}

impl FerryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ferry. A name already in use is rejected and the first
    /// registration is kept.
    pub fn add(&mut self, record: FerryRecord) -> Result<FerryId> {
        if self.index_by_name.contains_key(&record.name) {
            return Err(NetworkError::DuplicateKey {
                kind: "ferry",
                key: record.name,
            });
        }
        record.check()?;

        let id = FerryId(self.ferries.len());
        debug!(%id, name = %record.name, "registered ferry");
        self.index_by_name.insert(record.name.clone(), id);
        self.ferries.push(Ferry {
            id,
            name: record.name,
            transport_time_h: record.transport_time_h,
            car_load_time_h: record.car_load_time_h,
            pax_load_time_h: record.pax_load_time_h,
            car_cost: record.car_cost,
            pax_cost: record.pax_cost,
            weekly_frequency: record.weekly_frequency,
        });
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<FerryId> {
        self.index_by_name.get(name).copied()
    }

    pub fn get(&self, id: FerryId) -> Option<&Ferry> {
        self.ferries.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.ferries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ferries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ferry> {
        self.ferries.iter()
    }
}
