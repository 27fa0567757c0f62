use anyhow::Result;
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::demand::DemandParams;
use crate::domain::RoadFailurePolicy;
use crate::network::NetworkSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub demand: DemandParams,
    #[serde(default)]
    pub roads: RoadsConfig,
}

/// Folders holding one CSV file per source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub airports_dir: PathBuf,
    pub ferries_dir: PathBuf,
    pub roads_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            airports_dir: PathBuf::from("airport_csvs"),
            ferries_dir: PathBuf::from("ferry_csvs"),
            roads_dir: PathBuf::from("road_csvs"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadsConfig {
    pub failure_policy: RoadFailurePolicy,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_path("config/default.toml")
    }

    /// Defaults, overlaid by the TOML file at `path` (if present), then by
    /// `TRANSNET__SECTION__KEY` environment variables
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TRANSNET__").split("__"));
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.demand.check()?;
        Ok(())
    }

    pub fn network_settings(&self) -> NetworkSettings {
        NetworkSettings {
            demand: self.demand,
            road_policy: self.roads.failure_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        figment::Jail::expect_with(|_| {
            let config = Config::from_path("does/not/exist.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.demand, DemandParams::default());
            assert_eq!(config.roads.failure_policy, RoadFailurePolicy::PerFile);
            assert_eq!(config.data.airports_dir, PathBuf::from("airport_csvs"));
            Ok(())
        });
    }

    #[test]
    fn test_toml_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "network.toml",
                r#"
                [demand]
                km_per_million_gdp = 80.0
                constant_km = 25.0

                [roads]
                failure_policy = "per_record"
                "#,
            )?;
            let config = Config::from_path("network.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.demand.km_per_million_gdp, 80.0);
            assert_eq!(config.demand.constant_km, 25.0);
            assert_eq!(config.roads.failure_policy, RoadFailurePolicy::PerRecord);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_and_validation() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TRANSNET__DEMAND__CONSTANT_KM", "0");
            assert!(Config::from_path("missing.toml").is_err());
            Ok(())
        });
    }
}
