//! Per-connection stream parameters and the rules that normalize raw client
//! input into them.

use crate::gateway::open_meteo::WeatherQuery;
use service::config::Config;
use std::time::Duration;

/// Fallback values applied when a client omits a parameter or sends one that
/// does not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDefaults {
    pub latitude: f64,
    pub longitude: f64,
    pub interval_secs: u64,
    pub min_interval_secs: u64,
}

impl StreamDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            latitude: config.default_latitude,
            longitude: config.default_longitude,
            interval_secs: config.default_interval_secs,
            min_interval_secs: config.min_interval_secs,
        }
    }
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self {
            latitude: 23.8103,
            longitude: 90.4125,
            interval_secs: 30,
            min_interval_secs: 10,
        }
    }
}

/// Immutable parameters of one weather stream session.
///
/// Always satisfies `interval >= min_interval_secs` of the defaults it was
/// normalized with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub interval: Duration,
    pub timezone: Option<String>,
}

impl SessionParameters {
    /// Builds session parameters from raw client strings. Never fails: every
    /// missing or malformed value is replaced by its default.
    pub fn normalize(
        lat: Option<&str>,
        lon: Option<&str>,
        interval: Option<&str>,
        timezone: Option<&str>,
        defaults: &StreamDefaults,
    ) -> Self {
        let latitude = parse_coordinate(lat).unwrap_or(defaults.latitude);
        let longitude = parse_coordinate(lon).unwrap_or(defaults.longitude);

        let requested = interval
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(defaults.interval_secs as i64);
        let floor = defaults.min_interval_secs;
        let interval_secs = if requested < floor as i64 {
            floor
        } else {
            requested as u64
        };

        let timezone = timezone
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .map(str::to_string);

        Self {
            latitude,
            longitude,
            interval: Duration::from_secs(interval_secs),
            timezone,
        }
    }

    /// The subset of parameters forwarded to the upstream provider.
    pub fn weather_query(&self) -> WeatherQuery {
        WeatherQuery {
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone.clone(),
        }
    }
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
