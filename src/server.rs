//! REST API over the pricing engine.

use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::pricing::{admission, calculator, discount, PromoBanner, Recommendation};
use crate::types::{Location, QuoteRequest};

#[derive(Clone)]
struct ApiState {
    config: Config,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct QuoteResponse {
    recommendation: Recommendation,
    /// Hash of the price sheet the quote was computed against.
    config_fingerprint: String,
    generated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct PrimaryLocationQuery {
    #[serde(default)]
    science: u32,
    #[serde(default)]
    dpkh: u32,
    #[serde(default)]
    dpkr: u32,
}

#[derive(Debug, Serialize)]
struct PrimaryLocationResponse {
    primary_location: Location,
    label: String,
}

pub async fn run_server(config: Config, addr: SocketAddr) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = ApiState {
        fingerprint: config.fingerprint(),
        config,
    };
    let app = Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/quote", post(quote))
        .route("/api/primary-location", get(primary_location))
        .route("/api/promo", get(promo))
        .route("/api/config", get(show_config))
        .layer(cors)
        .with_state(state);

    info!("Starting Membership Advisor API on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> &'static str {
    "Membership Advisor API - https://github.com/discoveryplace-labs/membership-advisor"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn quote(
    State(state): State<ApiState>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<QuoteResponse> {
    request
        .validate(&state.config)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let recommendation = calculator::calculate_membership_costs(&state.config, &request);
    Ok(Json(ApiResponse {
        ok: true,
        data: QuoteResponse {
            recommendation,
            config_fingerprint: state.fingerprint.clone(),
            generated_at: Utc::now(),
        },
    }))
}

async fn primary_location(
    Query(query): Query<PrimaryLocationQuery>,
) -> Json<ApiResponse<PrimaryLocationResponse>> {
    let primary = admission::determine_primary_location(query.science, query.dpkh, query.dpkr);
    Json(ApiResponse {
        ok: true,
        data: PrimaryLocationResponse {
            primary_location: primary,
            label: primary.label().to_string(),
        },
    })
}

async fn promo(State(state): State<ApiState>) -> Json<ApiResponse<PromoBanner>> {
    Json(ApiResponse {
        ok: true,
        data: discount::promotion_banner(&state.config),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    Json(ApiResponse {
        ok: true,
        data: state.config.clone(),
    })
}

#[cfg(test)]
mod tests {
    use crate::types::QuoteRequest;

    #[test]
    fn quote_request_defaults_optional_fields() {
        let request: QuoteRequest =
            serde_json::from_str(r#"{"adult_count": 2, "children_count": 0}"#)
                .expect("minimal payload parses");
        assert_eq!(request.adult_count, 2);
        assert!(request.child_ages.is_empty());
        assert_eq!(request.science_visits, 0);
        assert!(!request.include_parking);
    }
}
