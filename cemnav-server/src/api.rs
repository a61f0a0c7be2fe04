//! REST API for routing across the grounds.
//!
//! - `GET /health`
//! - `GET /network`: statistics of the network currently served
//! - `POST /route`: route between two points as JSON
//! - `POST /route/geojson`: the same route as a GeoJSON `Feature`
//! - `POST /network/reload`: rebuild from the geometry file and swap

use std::sync::Arc;

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cemnav_core::{
    Coordinate, Error, NetworkConfig, NetworkStats, Route, RouteOptions, build_routed_polyline,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let limits = state.config.limits.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(limits.timeout()))
        .layer(ConcurrencyLimitLayer::new(limits.concurrency));

    Router::new()
        .route("/health", get(health))
        .route("/network", get(network_info))
        .route("/network/reload", post(reload_network))
        .route("/route", post(route))
        .route("/route/geojson", post(route_geojson))
        .layer(middleware)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Failure of a request, rendered as `{ "error": kind, "message": text }`
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Core(err) => {
                let status = match err {
                    Error::InvalidGeometry(_) | Error::InvalidConfig(_) | Error::GeoJson(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    Error::NoReachablePoint { .. } | Error::NoRoute => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    Error::IoError(_) | Error::InternalInvariant(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.kind(), err.to_string())
            }
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
            }
        };

        if status.is_server_error() {
            error!(kind, %message, "Request failed");
        } else {
            warn!(kind, %message, "Request rejected");
        }
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "timeout", "message": "request took too long" })),
        )
            .into_response()
    } else {
        ApiError::Internal(err.to_string()).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

#[derive(Debug, Serialize)]
struct NetworkResponse {
    #[serde(flatten)]
    stats: NetworkStats,
    build: NetworkConfig,
}

async fn network_info(State(state): State<Arc<AppState>>) -> Json<NetworkResponse> {
    Json(NetworkResponse {
        stats: state.network.current().stats(),
        build: state.config.network.build,
    })
}

async fn reload_network(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NetworkResponse>, ApiError> {
    let worker = Arc::clone(&state);
    let stats = tokio::task::spawn_blocking(move || worker.reload())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(NetworkResponse {
        stats,
        build: state.config.network.build,
    }))
}

/// Body of `POST /route` and `POST /route/geojson`
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub destination: Coordinate,
    pub start_radius: Option<f64>,
    pub dest_radius: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub polyline: Vec<Coordinate>,
    pub distance_meters: f64,
    pub distance_text: String,
    pub start_offset_meters: f64,
    pub dest_offset_meters: f64,
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        let distance_text = route.distance_text();
        Self {
            polyline: route.polyline,
            distance_meters: route.distance_meters,
            distance_text,
            start_offset_meters: route.start_offset_meters,
            dest_offset_meters: route.dest_offset_meters,
        }
    }
}

async fn solve(state: &AppState, request: RouteRequest) -> Result<Route, ApiError> {
    let defaults = state.config.routing;
    let options = RouteOptions {
        start_radius: request.start_radius.unwrap_or(defaults.start_radius),
        dest_radius: request.dest_radius.unwrap_or(defaults.dest_radius),
    };
    let network = state.network.current();

    let route = tokio::task::spawn_blocking(move || {
        build_routed_polyline(request.start, request.destination, &network, &options)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(route)
}

async fn route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let route = solve(&state, request).await?;
    Ok(Json(route.into()))
}

async fn route_geojson(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<geojson::Feature>, ApiError> {
    let route = solve(&state, request).await?;
    Ok(Json(route.to_geojson_feature()?))
}
