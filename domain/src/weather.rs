use crate::gateway::open_meteo::{OpenMeteoClient, WeatherQuery};
use crate::reading::Reading;
use crate::session::SessionParameters;
use crate::source::{PollOutcome, PollSource};
use async_trait::async_trait;
use chrono::Utc;

/// Polls Open-Meteo for one session's location.
pub struct WeatherSource {
    client: OpenMeteoClient,
    query: WeatherQuery,
}

impl WeatherSource {
    pub fn new(client: OpenMeteoClient, params: &SessionParameters) -> Self {
        Self {
            client,
            query: params.weather_query(),
        }
    }
}

#[async_trait]
impl PollSource for WeatherSource {
    async fn poll(&mut self) -> PollOutcome {
        match self.client.fetch(&self.query).await {
            Ok(current) => PollOutcome::Reading(Reading::new(
                Utc::now().timestamp(),
                self.query.latitude,
                self.query.longitude,
                current,
            )),
            Err(err) => PollOutcome::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureCategory;
    use crate::session::StreamDefaults;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use service::config::Config;

    fn source_for(server_url: &str, lat: &str, lon: &str) -> WeatherSource {
        let config = Config::default().set_open_meteo_url(format!("{server_url}/v1/forecast"));
        let client = OpenMeteoClient::new(&config).unwrap();
        let params = SessionParameters::normalize(
            Some(lat),
            Some(lon),
            None,
            None,
            &StreamDefaults::default(),
        );
        WeatherSource::new(client, &params)
    }

    #[tokio::test]
    async fn test_poll_stamps_reading_with_session_coordinates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "current_weather": { "temperature": 14.0 } }).to_string())
            .create_async()
            .await;

        let before = Utc::now().timestamp();
        let outcome = source_for(&server.url(), "51.5", "-0.1").poll().await;

        match outcome {
            PollOutcome::Reading(reading) => {
                assert_eq!(reading.latitude, 51.5);
                assert_eq!(reading.longitude, -0.1);
                assert_eq!(reading.temperature, Some(14.0));
                assert!(reading.timestamp >= before);
            }
            other => panic!("expected a reading, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_reports_upstream_failure_without_panicking() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let outcome = source_for(&server.url(), "51.5", "-0.1").poll().await;

        match outcome {
            PollOutcome::Failed(err) => {
                assert_eq!(err.category(), FailureCategory::UpstreamUnavailable)
            }
            other => panic!("expected a failure, got {other:?}"),
        }
    }
}
