use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use crate::errors::AppError;
use crate::models::Usuario;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "user-id";

/// The user named by the `user-id` header.
pub struct CurrentUser(pub Usuario);

/// A [`CurrentUser`] whose role is admin.
pub struct AdminUser(pub Usuario);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized("No autenticado".into()))?;

        let user = state
            .repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Request with unknown user-id {}", user_id);
                AppError::Unauthorized("Usuario no encontrado".into())
            })?;

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!("User {} ({}) denied admin access", user.id, user.role);
            return Err(AppError::Forbidden(
                "Solo administradores pueden realizar esta acción".into(),
            ));
        }
        Ok(AdminUser(user))
    }
}

/// Guards a whole router. The admin is left in the request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    match AdminUser::from_request_parts(&mut parts, &state).await {
        Ok(AdminUser(admin)) => {
            parts.extensions.insert(admin);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.into_response(),
    }
}
