use crate::gateway::open_meteo::CurrentWeather;
use serde::Serialize;
use serde_json::Value;

/// One successful weather poll, stamped with where and when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Unix seconds at which the poll completed.
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
    pub weathercode: Option<i64>,
    pub raw: Value,
}

impl Reading {
    pub fn new(timestamp: i64, latitude: f64, longitude: f64, current: CurrentWeather) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            temperature: current.temperature,
            windspeed: current.windspeed,
            winddirection: current.winddirection,
            weathercode: current.weathercode,
            raw: current.raw,
        }
    }
}
