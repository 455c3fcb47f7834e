use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use crate::errors::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{
    ids, non_empty, ApiResponse, EditarUsuarioForm, EliminarCuentaForm, PasswordForm, PerfilForm,
    RegistroForm, Rol, RolForm, Usuario, UsuarioPublico,
};
use crate::services::passwords::{hash_password, verify_password};
use crate::state::AppState;
use super::{check_id, ApiJson};

const REQUIRED_FIELDS: &str = "Todos los campos son requeridos";
const DUPLICATE_USER: &str = "El email o legajo ya están registrados";
const DUPLICATE_OTHER_USER: &str = "El email o legajo ya están registrados por otro usuario";

fn check_password_len(state: &AppState, password: &str) -> AppResult<()> {
    let min = state.config.security.min_password_len;
    if password.chars().count() < min {
        return Err(AppError::bad_request(format!(
            "La contraseña debe tener al menos {} caracteres",
            min
        )));
    }
    Ok(())
}

async fn load_user(state: &AppState, id: &str) -> AppResult<Usuario> {
    check_id(id)?;
    state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("Usuario no encontrado"))
}

/// Shared by public registration and admin creation. Only the latter may pick a role.
pub(super) async fn register_user(
    state: &AppState,
    form: RegistroForm,
    allow_role: bool,
) -> AppResult<Usuario> {
    let (apellido_nombre, legajo, turno, email) = match (
        non_empty(&form.apellido_nombre),
        non_empty(&form.legajo),
        non_empty(&form.turno),
        non_empty(&form.email),
    ) {
        (Some(a), Some(l), Some(t), Some(e)) => (a, l, t, e),
        _ => return Err(AppError::bad_request(REQUIRED_FIELDS)),
    };
    let password = form
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request(REQUIRED_FIELDS))?;
    check_password_len(state, password)?;

    let role = match (allow_role, non_empty(&form.role)) {
        (true, Some(role)) => role
            .parse::<Rol>()
            .map_err(|_| AppError::bad_request("Rol inválido"))?,
        _ => Rol::User,
    };

    if state.repo.find_conflicting_user(email, legajo, None).await?.is_some() {
        tracing::info!("Registration rejected, email {} or legajo {} taken", email, legajo);
        return Err(AppError::bad_request(DUPLICATE_USER));
    }

    let user = Usuario {
        id: ids::new_id(),
        apellido_nombre: apellido_nombre.to_string(),
        legajo: legajo.to_string(),
        turno: turno.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password, state.config.security.bcrypt_cost).await?,
        role,
        fecha_registro: Utc::now(),
    };
    state.repo.save_user(&user).await?;

    tracing::info!("Created user {} with role {}", user.id, user.role);
    Ok(user)
}

pub async fn list_users(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UsuarioPublico>>>> {
    let mut users: Vec<UsuarioPublico> = state
        .repo
        .list_users()
        .await?
        .iter()
        .map(Usuario::publico)
        .collect();
    users.sort_by(|a, b| a.apellido_nombre.cmp(&b.apellido_nombre));

    tracing::debug!("Listing {} users", users.len());
    Ok(Json(ApiResponse::ok(users)))
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegistroForm>,
) -> AppResult<Json<ApiResponse<UsuarioPublico>>> {
    let user = register_user(&state, form, true).await?;
    Ok(Json(ApiResponse::with_message("Usuario creado exitosamente", user.publico())))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<EditarUsuarioForm>,
) -> AppResult<Json<ApiResponse<UsuarioPublico>>> {
    tracing::info!("Editing user {}", id);

    let (apellido_nombre, legajo, email, turno) = match (
        non_empty(&form.apellido_nombre),
        non_empty(&form.legajo),
        non_empty(&form.email),
        non_empty(&form.turno),
    ) {
        (Some(a), Some(l), Some(e), Some(t)) => (a, l, e, t),
        _ => return Err(AppError::bad_request(REQUIRED_FIELDS)),
    };

    let mut user = load_user(&state, &id).await?;

    if state.repo.find_conflicting_user(email, legajo, Some(&id)).await?.is_some() {
        return Err(AppError::bad_request(DUPLICATE_OTHER_USER));
    }

    user.apellido_nombre = apellido_nombre.to_string();
    user.legajo = legajo.to_string();
    user.email = email.to_string();
    user.turno = turno.to_string();
    state.repo.save_user(&user).await?;

    Ok(Json(ApiResponse::with_message(
        "Usuario actualizado correctamente",
        user.publico(),
    )))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<RolForm>,
) -> AppResult<Json<ApiResponse<()>>> {
    let role = form
        .role
        .as_deref()
        .and_then(|r| r.parse::<Rol>().ok())
        .ok_or_else(|| AppError::bad_request("Rol inválido"))?;

    let mut user = load_user(&state, &id).await?;
    user.role = role;
    state.repo.save_user(&user).await?;

    tracing::info!("Role of user {} set to {}", id, role);
    Ok(Json(ApiResponse::message("Rol actualizado correctamente")))
}

pub async fn update_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(form): ApiJson<PasswordForm>,
) -> AppResult<Json<ApiResponse<()>>> {
    tracing::info!("Changing password for user {}", id);

    let new_password = form.new_password.unwrap_or_default();
    check_password_len(&state, &new_password)?;

    let mut user = load_user(&state, &id).await?;
    user.password_hash = hash_password(&new_password, state.config.security.bcrypt_cost).await?;
    state.repo.save_user(&user).await?;

    Ok(Json(ApiResponse::message("Contraseña cambiada correctamente")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<Usuario>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    tracing::info!("Admin {} deleting user {}", admin.id, id);

    let user = load_user(&state, &id).await?;

    if admin.id == user.id {
        return Err(AppError::bad_request("No puedes eliminarte a ti mismo"));
    }

    if !state.repo.delete_user(&id).await? {
        return Err(AppError::not_found("Usuario no encontrado"));
    }

    tracing::info!("Deleted user {}", user.apellido_nombre);
    Ok(Json(ApiResponse::message(format!(
        "Usuario {} eliminado correctamente",
        user.apellido_nombre
    ))))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    ApiJson(form): ApiJson<PerfilForm>,
) -> AppResult<Json<ApiResponse<UsuarioPublico>>> {
    tracing::info!("Updating profile of user {}", user.id);

    let (apellido_nombre, legajo, turno, email) = match (
        non_empty(&form.apellido_nombre),
        non_empty(&form.legajo),
        non_empty(&form.turno),
        non_empty(&form.email),
    ) {
        (Some(a), Some(l), Some(t), Some(e)) => (a, l, t, e),
        _ => return Err(AppError::bad_request(REQUIRED_FIELDS)),
    };
    let current_password = form
        .current_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request(REQUIRED_FIELDS))?;

    if !verify_password(current_password, &user.password_hash).await {
        return Err(AppError::Unauthorized("Contraseña actual incorrecta".into()));
    }

    if (legajo != user.legajo || email != user.email)
        && state.repo.find_conflicting_user(email, legajo, Some(&user.id)).await?.is_some()
    {
        return Err(AppError::bad_request(DUPLICATE_OTHER_USER));
    }

    user.apellido_nombre = apellido_nombre.to_string();
    user.legajo = legajo.to_string();
    user.turno = turno.to_string();
    user.email = email.to_string();

    // A new password too short to be valid is ignored
    if let Some(password) = form.password.as_deref() {
        if check_password_len(&state, password).is_ok() {
            user.password_hash = hash_password(password, state.config.security.bcrypt_cost).await?;
        }
    }

    state.repo.save_user(&user).await?;

    tracing::info!("Profile updated: {}", user.apellido_nombre);
    Ok(Json(ApiResponse::with_message(
        "Perfil actualizado correctamente",
        user.publico(),
    )))
}

pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(form): ApiJson<EliminarCuentaForm>,
) -> AppResult<Json<ApiResponse<()>>> {
    tracing::info!("Deleting account of user {}", user.id);

    let current_password = form
        .current_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request("La contraseña actual es requerida"))?;

    if !verify_password(current_password, &user.password_hash).await {
        return Err(AppError::Unauthorized("Contraseña incorrecta".into()));
    }

    if !state.repo.delete_user(&user.id).await? {
        return Err(AppError::not_found("Usuario no encontrado"));
    }

    tracing::info!("Account deleted: {}", user.apellido_nombre);
    Ok(Json(ApiResponse::message("Cuenta eliminada correctamente")))
}
