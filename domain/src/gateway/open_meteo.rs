use crate::error::{Error, InternalErrorKind};
use log::*;
use serde_json::{Map, Value};
use service::config::Config;
use std::time::Duration;

/// Open-Meteo forecast API client returning the `current_weather` block.
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

/// Location (and optional timezone) to ask the provider about.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

/// Fields extracted from the provider's `current_weather` object.
///
/// A field the provider left out, or sent with an unexpected type, is `None`
/// rather than an error. `raw` is the untouched object.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
    pub weathercode: Option<i64>,
    pub raw: Value,
}

impl OpenMeteoClient {
    /// Create a client whose every request is bounded by the configured upstream timeout.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = build_client(Duration::from_secs(config.upstream_timeout_secs))?;

        Ok(Self {
            client,
            base_url: config.open_meteo_url().to_string(),
        })
    }

    /// Issue exactly one forecast request. No retries.
    pub async fn fetch(&self, query: &WeatherQuery) -> Result<CurrentWeather, Error> {
        let mut params = vec![
            ("latitude", query.latitude.to_string()),
            ("longitude", query.longitude.to_string()),
            ("current_weather", "true".to_string()),
        ];
        if let Some(timezone) = &query.timezone {
            params.push(("timezone", timezone.clone()));
        }

        debug!(
            "Fetching current weather for ({}, {})",
            query.latitude, query.longitude
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                warn!("Open-Meteo request failed: {e}");
                Error::from(e)
            })?;

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read Open-Meteo response body: {e}");
            Error::from(e)
        })?;

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            warn!("Open-Meteo returned a non-JSON body: {e}");
            Error::from(e)
        })?;

        CurrentWeather::from_response(&json)
    }
}

impl CurrentWeather {
    /// Extract the current conditions from a full forecast response.
    pub fn from_response(response: &Value) -> Result<Self, Error> {
        let response = response.as_object().ok_or_else(|| {
            Error::internal(InternalErrorKind::Other(
                "forecast response is not a JSON object".to_string(),
            ))
        })?;

        let current = match response.get("current_weather") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(current)) => current.clone(),
            Some(_) => {
                return Err(Error::internal(InternalErrorKind::Other(
                    "current_weather is not a JSON object".to_string(),
                )))
            }
        };

        Ok(Self {
            temperature: current.get("temperature").and_then(Value::as_f64),
            windspeed: current.get("windspeed").and_then(Value::as_f64),
            winddirection: current.get("winddirection").and_then(Value::as_f64),
            weathercode: current.get("weathercode").and_then(as_integer),
            raw: Value::Object(current),
        })
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|code| code.fract() == 0.0)
            .map(|code| code as i64)
    })
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?)
}
