use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tourtrack::providers::{ATTRACTION_PROXIMITY_RANGE_MILES, DEFAULT_PROXIMITY_BUFFER_MILES};
use tourtrack::tracker::{DEFAULT_WORKER_COUNT, TrackerConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub tracker: TrackerSection,
    pub services: ServicesConfig,
    pub rewards: RewardsConfig,
    pub trip_pricer: TripPricerConfig,
    pub internal_users: InternalUsersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    pub interval_secs: u64,
    pub batch_budget_secs: Option<u64>,
    pub worker_count: usize,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            batch_budget_secs: None,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

impl TrackerSection {
    pub fn to_tracker_config(&self) -> TrackerConfig {
        let config = TrackerConfig::new(Duration::from_secs(self.interval_secs));
        match self.batch_budget_secs {
            Some(secs) => config.with_batch_budget(Duration::from_secs(secs)),
            None => config,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub gps_url: String,
    pub rewards_url: String,
    pub preferences_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            gps_url: "http://localhost:8081".to_string(),
            rewards_url: "http://localhost:8082".to_string(),
            preferences_url: "http://localhost:8083".to_string(),
            request_timeout_ms: 10000,
        }
    }
}

impl ServicesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub proximity_buffer_miles: f64,
    pub attraction_proximity_range_miles: f64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            proximity_buffer_miles: DEFAULT_PROXIMITY_BUFFER_MILES,
            attraction_proximity_range_miles: ATTRACTION_PROXIMITY_RANGE_MILES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TripPricerConfig {
    pub api_key: String,
}

impl Default for TripPricerConfig {
    fn default() -> Self {
        Self {
            api_key: "test-server-api-key".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalUsersConfig {
    pub enabled: bool,
    pub count: usize,
}

impl Default for InternalUsersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            tracker: TrackerSection::default(),
            services: ServicesConfig::default(),
            rewards: RewardsConfig::default(),
            trip_pricer: TripPricerConfig::default(),
            internal_users: InternalUsersConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values the tracker cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tracker.worker_count == 0 {
            eyre::bail!("tracker.worker_count must be greater than 0");
        }
        if self.tracker.interval_secs == 0 {
            eyre::bail!("tracker.interval_secs must be greater than 0");
        }
        if self.rewards.proximity_buffer_miles < 0.0 {
            eyre::bail!("rewards.proximity_buffer_miles must not be negative");
        }
        Ok(())
    }
}
