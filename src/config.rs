use std::path::PathBuf;

use crate::limits::DEFAULT_FALLBACK_PRICE;
use crate::model::{Day, Money};

/// Runtime settings, read from `FLEETCAL_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON array of booking records to load.
    pub bookings_path: PathBuf,
    pub metrics_port: Option<u16>,
    pub fallback_price: Money,
    /// Overrides the system date, mostly for demos and reproducible output.
    pub today: Option<Day>,
    pub user: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bookings_path: PathBuf::from("./bookings.json"),
            metrics_port: None,
            fallback_price: DEFAULT_FALLBACK_PRICE,
            today: None,
            user: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bookings_path: get("FLEETCAL_BOOKINGS")
                .map(PathBuf::from)
                .unwrap_or(defaults.bookings_path),
            metrics_port: get("FLEETCAL_METRICS_PORT").and_then(|s| s.parse().ok()),
            fallback_price: get("FLEETCAL_FALLBACK_PRICE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fallback_price),
            today: get("FLEETCAL_TODAY").and_then(|s| s.parse().ok()),
            user: get("FLEETCAL_USER").filter(|s| !s.is_empty()),
        }
    }

    /// Configured override, else the local calendar date.
    pub fn today(&self) -> Day {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
