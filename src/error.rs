use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::predictor::PredictError;
use crate::types::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown district")]
    UnknownDistrict,
    #[error("District coordinates not found")]
    MissingCoordinates,
    #[error("Province not found")]
    ProvinceNotFound,
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    MalformedRequest(#[from] JsonRejection),
    #[error("{0}")]
    Internal(String),
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::UnknownDistrict => ApiError::UnknownDistrict,
            PredictError::MissingCoordinates => ApiError::MissingCoordinates,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownDistrict | ApiError::MissingCoordinates => StatusCode::BAD_REQUEST,
            ApiError::ProvinceNotFound | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MalformedRequest(rejection) => rejection.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::MalformedRequest(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!(%status, %detail, "request failed");
        } else {
            warn!(%status, %detail, "request rejected");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}
