use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::artifacts::Artifacts;
use crate::error::ApiError;
use crate::predictor;
use crate::types::{
    DistrictListResponse, DistrictTableResponse, PredictionRequest, PredictionResult,
    ProvincesResponse,
};

// ---------- Server state ----------

pub type AppState = Arc<Artifacts>;

// ---------- Handlers ----------

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(predictor::predict(&state, &req)?))
}

async fn list_provinces(State(state): State<AppState>) -> Json<ProvincesResponse> {
    Json(ProvincesResponse {
        provinces: state.provinces.provinces().map(str::to_owned).collect(),
    })
}

async fn list_districts_for_province(
    State(state): State<AppState>,
    Path(province): Path<String>,
) -> Result<Json<DistrictListResponse>, ApiError> {
    let districts = state
        .provinces
        .districts(&province)
        .ok_or(ApiError::ProvinceNotFound)?;
    Ok(Json(DistrictListResponse {
        districts: districts.to_vec(),
    }))
}

async fn list_all_districts(State(state): State<AppState>) -> Json<DistrictTableResponse> {
    Json(DistrictTableResponse {
        districts: state.coordinates.as_map().clone(),
    })
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// One allowed origin, credentials on; other origins get no allow-origin
/// header. Methods and headers are mirrored from the preflight since
/// wildcards are not allowed together with credentials.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

pub fn router(artifacts: Arc<Artifacts>, cors_origin: HeaderValue) -> Router {
    Router::new()
        .route("/predict", post(predict).fallback(method_not_allowed))
        .route("/provinces", get(list_provinces).fallback(method_not_allowed))
        .route("/districts", get(list_all_districts).fallback(method_not_allowed))
        .route(
            "/districts/:province",
            get(list_districts_for_province).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(artifacts)
}
