use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use cartage_core::error::ExecutionError;

pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(String),
}

impl From<ExecutionError> for ApiError {
    fn from(error: ExecutionError) -> Self {
        let message = error.to_string();
        match error {
            ExecutionError::TripNotFound(_)
            | ExecutionError::StopNotFound { .. }
            | ExecutionError::RouteNotFound(_)
            | ExecutionError::DriverNotFound(_)
            | ExecutionError::VehicleNotFound(_)
            | ExecutionError::ParcelNotFound(_)
            | ExecutionError::SettlementNotFound(_) => ApiError::NotFound(message),
            ExecutionError::OwnershipViolation { .. } => ApiError::Forbidden(message),
            error if error.is_retryable() => ApiError::Conflict(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::InternalServerError(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::InternalServerError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use cartage_core::ids::{TripId, VehicleId};

    use super::*;

    #[test]
    fn lock_conflicts_map_to_409() {
        let api_error: ApiError = ExecutionError::VehicleInUse {
            vehicle_id: VehicleId::generate(),
            holding_trip_id: TripId::generate(),
        }
        .into();
        assert!(matches!(api_error, ApiError::Conflict(_)));
    }

    #[test]
    fn missing_trip_maps_to_404() {
        let api_error: ApiError = ExecutionError::TripNotFound(TripId::generate()).into();
        assert!(matches!(api_error, ApiError::NotFound(_)));
    }

    #[test]
    fn ownership_maps_to_403() {
        let api_error: ApiError = ExecutionError::OwnershipViolation {
            trip_id: TripId::generate(),
            actor: "driver x".to_owned(),
        }
        .into();
        assert!(matches!(api_error, ApiError::Forbidden(_)));
    }
}
