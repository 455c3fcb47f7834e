use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use crate::errors::AppError;
use crate::models::ApiResponse;

// Every failure is rendered with the same `{ success: false, message }` envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiResponse::failure(msg)),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ApiResponse::failure(msg)),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiResponse::failure(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::failure(msg)),

            // Internal errors keep the detail in the `error` field
            AppError::Store(e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, internal_error(e.to_string()))
            }
            AppError::Hash(e) => {
                tracing::error!("Password hashing error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, internal_error(e.to_string()))
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal_error(detail: String) -> ApiResponse<()> {
    let mut body = ApiResponse::failure("Error interno del servidor");
    body.error = Some(detail);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;

    #[tokio::test]
    async fn test_error_status_codes() {
        let cases = [
            (AppError::bad_request("x"), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::not_found("x"), StatusCode::NOT_FOUND),
            (
                AppError::Store(StoreError::Contention { collection: "tiempoClase".into(), id: "t1".into() }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_internal_error_body_carries_detail() {
        let response = AppError::Store(StoreError::Contention { collection: "tiempoClase".into(), id: "t1".into() }).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Error interno del servidor");
        assert_eq!(body["error"], "Too many concurrent updates of tiempoClase:t1");
    }
}
