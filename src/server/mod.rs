//! HTTP query endpoint.
//!
//! A thin axum layer over the estimation core: `GET /estimate?url=...` with
//! optional behavioral ratios and per-segment country overrides. Invalid
//! parameters map to 400, page-load failures to 500; results are served
//! from and stored into the shared result cache.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Semaphore;

use crate::cache::ResultCache;
use crate::error_handling::EstimateError;
use crate::estimator::{
    EstimationOptions, GridIntensityOptions, ModelParams, Report, SegmentIntensity,
};
use crate::hosting::GreenHostingResolver;
use crate::recorder::ResourceRecorder;
use crate::run::estimate_page;

/// Shared state for the query endpoint.
#[derive(Clone)]
pub struct QueryState {
    pub recorder: Arc<ResourceRecorder>,
    pub resolver: Arc<GreenHostingResolver>,
    pub model: Arc<ModelParams>,
    pub cache: Arc<ResultCache>,
    /// Bounds concurrently running browser sessions across requests.
    pub sessions: Arc<Semaphore>,
}

/// Query parameters of `GET /estimate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateParams {
    url: String,
    data_cache_ratio: Option<f64>,
    return_visitor_ratio: Option<f64>,
    green_hosting_factor: Option<f64>,
    /// ISO Alpha-3 country override for the end-user device segment.
    device_country: Option<String>,
    data_center_country: Option<String>,
    network_country: Option<String>,
}

impl EstimateParams {
    fn options(&self) -> EstimationOptions {
        EstimationOptions {
            data_cache_ratio: self.data_cache_ratio,
            return_visitor_ratio: self.return_visitor_ratio,
            green_hosting_factor: self.green_hosting_factor,
            grid_intensity: GridIntensityOptions {
                device: self
                    .device_country
                    .clone()
                    .map(SegmentIntensity::Country),
                data_center: self
                    .data_center_country
                    .clone()
                    .map(SegmentIntensity::Country),
                network: self
                    .network_country
                    .clone()
                    .map(SegmentIntensity::Country),
            },
        }
    }
}

/// Error payload for the endpoint; chooses the status class by failure
/// taxonomy.
struct QueryError(EstimateError);

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EstimateError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            EstimateError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<EstimateError> for QueryError {
    fn from(e: EstimateError) -> Self {
        QueryError(e)
    }
}

/// Creates and starts the query server.
pub async fn start_query_server(port: u16, state: QueryState) -> Result<(), anyhow::Error> {
    let app = Router::new()
        .route("/estimate", get(estimate_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind query server to port {}: {}", port, e))?;

    log::info!("Query endpoint listening on http://127.0.0.1:{}/estimate", port);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Query server error: {}", e))?;

    Ok(())
}

async fn estimate_handler(
    State(state): State<QueryState>,
    Query(params): Query<EstimateParams>,
) -> Result<Json<Report>, QueryError> {
    let options = params.options();

    let _permit = state.sessions.acquire().await.map_err(|_| {
        EstimateError::Load(crate::error_handling::LoadError::Session(
            "browser session pool is closed".to_string(),
        ))
    })?;

    let report = estimate_page(
        &state.recorder,
        &state.resolver,
        &state.model,
        Some(&state.cache),
        &params.url,
        &options,
    )
    .await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialize_camel_case() {
        let params: EstimateParams = serde_json::from_value(json!({
            "url": "https://example.com",
            "dataCacheRatio": 0.5,
            "deviceCountry": "SWE"
        }))
        .unwrap();
        assert_eq!(params.data_cache_ratio, Some(0.5));
        assert_eq!(params.device_country.as_deref(), Some("SWE"));
        assert!(params.network_country.is_none());

        let options = params.options();
        assert_eq!(
            options.grid_intensity.device,
            Some(SegmentIntensity::Country("SWE".to_string()))
        );
    }

    #[test]
    fn test_error_status_mapping() {
        let invalid =
            QueryError(EstimateError::InvalidParameter("bad ratio".into())).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let load = QueryError(EstimateError::Load(
            crate::error_handling::LoadError::QuiescenceTimeout(30.0),
        ))
        .into_response();
        assert_eq!(load.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
