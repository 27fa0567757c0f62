//! # Travel Demand Estimation
//!
//! Gravity model for baseline long-distance travel between airports. Each
//! origin generates `km_per_million_gdp x GDP` passenger-km per year, split
//! across destinations in proportion to destination GDP weighted by a
//! reciprocal distance-decay metric, then adjusted by a second decay pass.
//!
//! The second pass is not renormalised, so a row of the demand matrix does
//! not in general add up to the origin total. [`DemandMatrix::coverage`]
//! measures the gap.

pub mod estimator;

pub use estimator::{distance_metric, DemandEstimator, DemandMatrix, DemandParams};
