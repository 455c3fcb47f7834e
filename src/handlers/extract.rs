use axum::extract::{rejection::JsonRejection, FromRequest};
use crate::errors::AppError;

/// `Json` whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("JSON inválido: {}", rejection.body_text()))
    }
}
