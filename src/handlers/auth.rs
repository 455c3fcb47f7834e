use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use crate::errors::{AppError, AppResult};
use crate::models::{non_empty, ApiResponse, LoginForm, RegistroForm, UsuarioPublico};
use crate::services::passwords::verify_password;
use crate::state::AppState;
use super::{usuarios::register_user, ApiJson};

pub async fn handle_login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginForm>,
) -> AppResult<Json<ApiResponse<UsuarioPublico>>> {
    let (identifier, password) = match (non_empty(&form.identifier), form.password.as_deref()) {
        (Some(identifier), Some(password)) if !password.is_empty() => (identifier, password),
        _ => return Err(AppError::bad_request("Email/legajo y contraseña requeridos")),
    };

    tracing::info!("Login attempt for identifier: {}", identifier);

    let user = state
        .repo
        .find_user_by_identifier(identifier)
        .await?
        .ok_or_else(|| {
            tracing::info!("User not found: {}", identifier);
            AppError::Unauthorized("Usuario no encontrado".into())
        })?;

    if !verify_password(password, &user.password_hash).await {
        tracing::info!("Invalid password for user: {}", user.id);
        return Err(AppError::Unauthorized("Contraseña incorrecta".into()));
    }

    tracing::info!("Login successful for user: {}", user.id);
    Ok(Json(ApiResponse::with_message("Login exitoso", user.publico())))
}

pub async fn handle_register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegistroForm>,
) -> AppResult<Json<ApiResponse<UsuarioPublico>>> {
    if form.role.as_deref().is_some_and(|r| r != "user") {
        tracing::warn!("Ignoring role {:?} requested at public registration", form.role);
    }

    // Public registration never grants a role
    let user = register_user(&state, form, false).await?;
    Ok(Json(ApiResponse::with_message(
        "Usuario registrado exitosamente",
        user.publico(),
    )))
}

pub async fn check_legajo(
    State(state): State<AppState>,
    Path(legajo): Path<String>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let exists = state.repo.find_user_by_legajo(legajo.trim()).await?.is_some();
    Ok(Json(existence(exists)))
}

/// `exists` is reported at the top level and inside `data` for older clients.
pub(super) fn existence(exists: bool) -> ApiResponse<Value> {
    let mut body = ApiResponse::ok(json!({ "exists": exists }));
    body.exists = Some(exists);
    body
}
