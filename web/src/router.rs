use crate::{controller::health_check_controller, sse::handler, AppState};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use log::*;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Weather Stream API"
        ),
        paths(
            health_check_controller::health_check,
            handler::stream_weather,
            handler::stream_campaign,
        ),
        tags(
            (name = "weather_stream_rs", description = "Server-sent event streams of live weather readings and campaign replays")
        )
    )]
pub struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .merge(health_routes())
        .merge(stream_routes(app_state))
        .merge(api_doc_routes())
        .layer(cors)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/stream_weather", get(handler::stream_weather))
        .route("/api/stream_campaign", get(handler::stream_campaign))
        .with_state(app_state)
}

fn api_doc_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid allowed origin: {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
}
