use crate::error::{Error, Result};
use crate::params::stream::StreamParams;
use crate::AppState;
use async_stream::stream;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use domain::replay::ReplaySource;
use domain::weather::WeatherSource;
use domain::PollSource;
use log::*;
use sse::encoder::CONTENT_TYPE;
use sse::{ChannelSink, Event, PollScheduler};
use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;

/// Records buffered between a session's scheduler and its response body.
const STREAM_BUFFER: usize = 16;

/// Shortest pause between two campaign polls, so a heartbeat campaign never
/// writes as fast as the client reads.
const MIN_CAMPAIGN_INTERVAL: Duration = Duration::from_secs(1);

/// GET a live weather event stream
#[utoipa::path(
    get,
    path = "/api/stream_weather",
    params(StreamParams),
    responses(
        (status = 200, description = "Event stream of connected, weather and error records", content_type = "text/event-stream", body = String),
        (status = 500, description = "The stream could not be opened")
    )
)]
pub(crate) async fn stream_weather(
    State(app_state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let params = StreamParams::from_query(&query).into_session_parameters(&app_state.stream_defaults);

    info!(
        "Opening weather stream for ({}, {}) every {}s",
        params.latitude,
        params.longitude,
        params.interval.as_secs()
    );

    let handshake = Event::connected(params.latitude, params.longitude);
    let source = WeatherSource::new(app_state.open_meteo.clone(), &params);

    open_stream(&app_state, handshake, params.interval, source)
}

/// GET a replay of the configured campaign messages
#[utoipa::path(
    get,
    path = "/api/stream_campaign",
    responses(
        (status = 200, description = "Event stream of the campaign messages, optionally followed by heartbeats", content_type = "text/event-stream", body = String),
        (status = 500, description = "The stream could not be opened")
    )
)]
pub(crate) async fn stream_campaign(State(app_state): State<AppState>) -> Result<Response> {
    let config = &app_state.config;
    info!(
        "Opening campaign stream ({} messages, {} mode)",
        app_state.campaign.len(),
        config.campaign_mode
    );

    let source = ReplaySource::new(app_state.campaign.clone(), config.campaign_mode);
    let interval = Duration::from_secs(config.campaign_interval_secs).max(MIN_CAMPAIGN_INTERVAL);

    open_stream(
        &app_state,
        Event::connected_without_location(),
        interval,
        source,
    )
}

/// Starts a session: builds the streaming response and spawns the task that
/// feeds it.
///
/// The response body owns a drop guard for the session's cancellation token.
/// When the client goes away hyper drops the body, which cancels the session
/// even if the scheduler is in the middle of waiting. When the scheduler
/// returns, its sender is dropped and the body ends.
fn open_stream<S>(
    app_state: &AppState,
    handshake: Event,
    interval: Duration,
    mut source: S,
) -> Result<Response>
where
    S: PollSource + 'static,
{
    let cancel = app_state.shutdown.child_token();
    let (tx, mut rx) = mpsc::channel::<Bytes>(STREAM_BUFFER);

    let guard = cancel.clone().drop_guard();
    let body = stream! {
        let _guard = guard;
        while let Some(record) = rx.recv().await {
            yield Ok::<Bytes, Infallible>(record);
        }
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE))
        .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
        .header("x-accel-buffering", HeaderValue::from_static("no"))
        .body(Body::from_stream(body))
        .map_err(Error::response_build)?;

    let session = app_state.begin_session();
    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        let reason = PollScheduler::new(interval)
            .run(handshake, &mut source, &mut sink, &cancel)
            .await;

        drop(session);
        info!("Stream session closed: {reason:?}");
    });

    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use crate::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::{json, Value};
    use service::config::{CampaignMode, Config};
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    fn test_state(config: Config) -> AppState {
        AppState::new(config, CancellationToken::new()).unwrap()
    }

    fn weather_config(server: &ServerGuard) -> Config {
        Config::default().set_open_meteo_url(format!("{}/v1/forecast", server.url()))
    }

    fn campaign_config(mode: CampaignMode, interval_secs: u64) -> Config {
        let mut config = Config::default();
        config.campaign_mode = mode;
        config.campaign_interval_secs = interval_secs;
        config
    }

    async fn get(state: AppState, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        define_routes(state).oneshot(request).await.unwrap()
    }

    /// Reads the next record from a streaming body, or `None` once it ends.
    async fn next_record(body: &mut Body) -> Option<String> {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("timed out waiting for a record")?
            .unwrap();
        let data = frame.into_data().unwrap();
        Some(String::from_utf8(data.to_vec()).unwrap())
    }

    fn data_json(record: &str) -> Value {
        let body = record
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .expect("expected a data record");
        serde_json::from_str(body).unwrap()
    }

    async fn wait_for_no_sessions(state: &AppState) {
        for _ in 0..100 {
            if state.active_sessions() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session still active");
    }

    async fn mock_forecast(server: &mut ServerGuard, status: usize, body: Value) -> mockito::Mock {
        server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_stream_weather_sets_event_stream_headers() {
        let mut server = Server::new_async().await;
        let _mock = mock_forecast(&mut server, 200, json!({ "current_weather": {} })).await;

        let response = get(test_state(weather_config(&server)), "/api/stream_weather").await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "text/event-stream");
        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(headers["x-accel-buffering"], "no");
    }

    #[tokio::test]
    async fn test_stream_weather_handshake_uses_normalized_params() {
        let mut server = Server::new_async().await;
        let _mock = mock_forecast(&mut server, 200, json!({ "current_weather": {} })).await;

        let response = get(
            test_state(weather_config(&server)),
            "/api/stream_weather?lat=51.5&lon=-0.1&interval=5",
        )
        .await;
        let mut body = response.into_body();

        assert_eq!(
            next_record(&mut body).await.unwrap(),
            "data: {\"type\":\"connected\",\"lat\":51.5,\"lon\":-0.1}\n\n"
        );
    }

    #[tokio::test]
    async fn test_stream_weather_malformed_params_still_connect() {
        let mut server = Server::new_async().await;
        let _mock = mock_forecast(&mut server, 200, json!({ "current_weather": {} })).await;

        let response = get(
            test_state(weather_config(&server)),
            "/api/stream_weather?lat=abc&lon=&interval=often&lat=also-bad",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body();
        let connected = data_json(&next_record(&mut body).await.unwrap());
        assert_eq!(connected, json!({ "type": "connected", "lat": 23.8103, "lon": 90.4125 }));
    }

    #[tokio::test]
    async fn test_stream_weather_forwards_reading_after_handshake() {
        let mut server = Server::new_async().await;
        let _mock = mock_forecast(
            &mut server,
            200,
            json!({ "current_weather": { "temperature": 18.5, "windspeed": 7.2, "winddirection": 90, "weathercode": 1 } }),
        )
        .await;

        let response = get(
            test_state(weather_config(&server)),
            "/api/stream_weather?lat=51.5&lon=-0.1",
        )
        .await;
        let mut body = response.into_body();
        next_record(&mut body).await.unwrap();

        let reading = data_json(&next_record(&mut body).await.unwrap());
        assert_eq!(reading["type"], "weather");
        assert_eq!(reading["latitude"], 51.5);
        assert_eq!(reading["longitude"], -0.1);
        assert_eq!(reading["temperature"], 18.5);
        assert_eq!(reading["weathercode"], 1);
        assert_eq!(reading["raw"]["windspeed"], 7.2);
        assert!(reading["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_stream_weather_upstream_failure_is_in_band() {
        let mut server = Server::new_async().await;
        let _mock = mock_forecast(&mut server, 503, json!({ "reason": "maintenance" })).await;

        let response = get(test_state(weather_config(&server)), "/api/stream_weather").await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body();
        next_record(&mut body).await.unwrap();
        let error = data_json(&next_record(&mut body).await.unwrap());

        assert_eq!(error["type"], "error");
        assert_eq!(error["msg"], "fetch_failed");
        assert!(error["detail"].is_string());
    }

    #[tokio::test]
    async fn test_dropping_body_cancels_session() {
        let state = test_state(campaign_config(CampaignMode::Heartbeat, 3600));

        let response = get(state.clone(), "/api/stream_campaign").await;
        let mut body = response.into_body();
        next_record(&mut body).await.unwrap();
        assert_eq!(state.active_sessions(), 1);

        // The scheduler is now inside an hour long wait.
        drop(body);

        wait_for_no_sessions(&state).await;
    }

    #[tokio::test]
    async fn test_server_shutdown_ends_open_streams() {
        let state = test_state(campaign_config(CampaignMode::Heartbeat, 3600));

        let response = get(state.clone(), "/api/stream_campaign").await;
        let mut body = response.into_body();
        next_record(&mut body).await.unwrap();

        state.shutdown.cancel();

        // Remaining buffered records drain, then the body ends.
        while next_record(&mut body).await.is_some() {}
        wait_for_no_sessions(&state).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_finite_campaign_replays_messages_then_closes() {
        let state = test_state(campaign_config(CampaignMode::Finite, 1));

        let response = get(state, "/api/stream_campaign").await;
        let mut body = response.into_body();

        assert_eq!(
            data_json(&next_record(&mut body).await.unwrap()),
            json!({ "type": "connected" })
        );
        for status in ["started", "in_progress", "completed"] {
            let message = data_json(&next_record(&mut body).await.unwrap());
            assert_eq!(message["status"], status);
        }
        assert!(next_record(&mut body).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_campaign_keeps_connection_alive() {
        let state = test_state(campaign_config(CampaignMode::Heartbeat, 1));

        let response = get(state, "/api/stream_campaign").await;
        let mut body = response.into_body();

        // connected + three messages
        for _ in 0..4 {
            next_record(&mut body).await.unwrap();
        }
        for _ in 0..3 {
            assert_eq!(next_record(&mut body).await.unwrap(), ": heartbeat\n\n");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_campaign_interval_is_raised_to_one_second() {
        let state = test_state(campaign_config(CampaignMode::Heartbeat, 0));

        let response = get(state, "/api/stream_campaign").await;
        let mut body = response.into_body();

        for _ in 0..4 {
            next_record(&mut body).await.unwrap();
        }

        let mut previous = Instant::now();
        for _ in 0..3 {
            assert_eq!(next_record(&mut body).await.unwrap(), ": heartbeat\n\n");
            let now = Instant::now();
            assert!(now - previous >= Duration::from_secs(1));
            previous = now;
        }
    }
}
