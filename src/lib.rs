pub mod config;
pub mod demand;
pub mod domain;
pub mod error;
pub mod geography;
pub mod loader;
pub mod network;
pub mod telemetry;
pub mod utils;

pub use error::{NetworkError, Result};
pub use network::{Network, NetworkSettings, Stage};
