//! # Source Loading
//!
//! Reads one tabular source at a time into the registries. Airports and
//! ferries are imported best-effort: a bad row is reported and skipped. Roads
//! follow the configured [`RoadFailurePolicy`].

pub mod rows;

use csv::StringRecord;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::{AirportRegistry, FerryRegistry, RoadFailurePolicy, RoadGraph};
use crate::error::{NetworkError, Result};
use rows::{
    airport_label, ferry_label, road_label, AirportRow, FerryRow, RoadRow, AIRPORT_COLUMNS,
    FERRY_COLUMNS, ROAD_COLUMNS,
};

/// First data row in spreadsheet numbering (row 1 is the header)
const FIRST_DATA_ROW: usize = 2;

/// A record that was not loaded
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub message: String,
}

/// Outcome of loading one source
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: String,
    pub accepted: usize,
    pub rejected: Vec<RejectedRow>,
    /// The whole source was refused and nothing from it was committed
    pub aborted: bool,
}

impl LoadReport {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            accepted: 0,
            rejected: Vec::new(),
            aborted: false,
        }
    }

    /// Report for a source that could not be read at all, such as one with
    /// missing columns. The problem is recorded against the header row.
    pub fn unreadable(source: &str, error: &NetworkError) -> Self {
        let mut report = Self::new(source);
        report.reject(1, error.to_string());
        report.aborted = true;
        report
    }

    fn reject(&mut self, row: usize, message: impl Into<String>) {
        let message = message.into();
        warn!(source = %self.source, row, %message, "rejected record");
        self.rejected.push(RejectedRow { row, message });
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && !self.aborted
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} accepted, {} rejected",
            self.source,
            self.accepted,
            self.rejected.len()
        )?;
        if self.aborted {
            write!(f, " (source aborted)")?;
        }
        for rejected in &self.rejected {
            write!(f, "\n  row {}: {}", rejected.row, rejected.message)?;
        }
        Ok(())
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Check the header row, returning it for keying rows that fail to parse
fn require_columns<R: Read>(
    reader: &mut csv::Reader<R>,
    source: &str,
    columns: &[&str],
) -> Result<StringRecord> {
    let headers = reader.headers()?.clone();
    let missing: Vec<String> = columns
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| format!("missing column '{column}'"))
        .collect();
    if missing.is_empty() {
        Ok(headers)
    } else {
        Err(NetworkError::validation(format!("source {source}"), missing))
    }
}

/// Load every airport row of one source
pub fn load_airports<R: Read>(reader: R, source: &str, registry: &mut AirportRegistry) -> Result<LoadReport> {
    let mut reader = csv_reader(reader);
    let headers = require_columns(&mut reader, source, &AIRPORT_COLUMNS)?;
    let mut report = LoadReport::new(source);

    for (i, row) in reader.records().enumerate() {
        let row_number = i + FIRST_DATA_ROW;
        let outcome = row
            .map_err(|e| e.to_string())
            .and_then(|record| {
                record
                    .deserialize::<AirportRow>(Some(&headers))
                    .map_err(|e| format!("airport {}: {e}", airport_label(&headers, &record)))
            })
            .and_then(AirportRow::into_record)
            .and_then(|record| registry.add(record).map_err(|e| e.to_string()));
        match outcome {
            Ok(_) => report.accepted += 1,
            Err(message) => report.reject(row_number, message),
        }
    }

    info!(source, accepted = report.accepted, rejected = report.rejected.len(), "loaded airports");
    Ok(report)
}

/// Load every ferry row of one source. A repeated name keeps the first service.
pub fn load_ferries<R: Read>(reader: R, source: &str, registry: &mut FerryRegistry) -> Result<LoadReport> {
    let mut reader = csv_reader(reader);
    let headers = require_columns(&mut reader, source, &FERRY_COLUMNS)?;
    let mut report = LoadReport::new(source);

    for (i, row) in reader.records().enumerate() {
        let row_number = i + FIRST_DATA_ROW;
        let outcome = row
            .map_err(|e| e.to_string())
            .and_then(|record| {
                record
                    .deserialize::<FerryRow>(Some(&headers))
                    .map_err(|e| format!("ferry {}: {e}", ferry_label(&headers, &record)))
            })
            .map(FerryRow::into_record)
            .and_then(|record| registry.add(record).map_err(|e| e.to_string()));
        match outcome {
            Ok(_) => report.accepted += 1,
            Err(message) => report.reject(row_number, message),
        }
    }

    info!(source, accepted = report.accepted, rejected = report.rejected.len(), "loaded ferries");
    Ok(report)
}

/// Load the roads of one source.
///
/// Every row is checked before anything is committed. Under
/// [`RoadFailurePolicy::PerFile`] an unreadable row or an endpoint failure
/// anywhere in the source aborts it with no roads committed.
pub fn load_roads<R: Read>(
    reader: R,
    source: &str,
    graph: &mut RoadGraph,
    airports: &AirportRegistry,
    ferries: &FerryRegistry,
    policy: RoadFailurePolicy,
) -> Result<LoadReport> {
    let mut reader = csv_reader(reader);
    let headers = require_columns(&mut reader, source, &ROAD_COLUMNS)?;
    let mut report = LoadReport::new(source);
    let mut resolved = Vec::new();
    let mut endpoint_failure = false;

    for (i, row) in reader.records().enumerate() {
        let row_number = i + FIRST_DATA_ROW;
        let parsed = row.map_err(|e| e.to_string()).and_then(|record| {
            record
                .deserialize::<RoadRow>(Some(&headers))
                .map_err(|e| format!("road {}: {e}", road_label(&headers, &record)))
        });
        let record = match parsed {
            Ok(row) => row.into_record(),
            Err(message) => {
                endpoint_failure = true;
                report.reject(row_number, message);
                continue;
            }
        };
        match graph.resolve(&record, airports, ferries) {
            Ok(road) => resolved.push(road),
            Err(rejection) => {
                endpoint_failure |= rejection.endpoint_failure;
                report.reject(row_number, rejection.to_string());
            }
        }
    }

    if endpoint_failure && policy == RoadFailurePolicy::PerFile {
        warn!(source, "not all roads are valid airport pairs, no roads loaded from this source");
        report.aborted = true;
        return Ok(report);
    }

    for road in resolved {
        graph.commit(road);
        report.accepted += 1;
    }

    info!(source, accepted = report.accepted, rejected = report.rejected.len(), "loaded roads");
    Ok(report)
}

/// Regular files in `dir`, sorted by name
pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Open a source file, returning it with its display name
pub fn open_source(path: &Path) -> Result<(File, String)> {
    let file = File::open(path)?;
    Ok((file, path.display().to_string()))
}
