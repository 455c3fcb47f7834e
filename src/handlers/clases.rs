use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use crate::errors::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{ids, non_empty, parse_fecha_clase, ApiResponse, Clase, ClaseForm};
use crate::state::AppState;
use super::{check_id, ApiJson};

fn newest_first(clases: &mut [Clase]) {
    clases.sort_by(|a, b| b.fecha_clase.cmp(&a.fecha_clase));
}

// Required fields of a class form: name and a parseable date.
fn required_fields(form: &ClaseForm) -> AppResult<(String, DateTime<Utc>)> {
    let (nombre, fecha) = match (non_empty(&form.nombre), non_empty(&form.fecha_clase)) {
        (Some(nombre), Some(fecha)) => (nombre, fecha),
        _ => return Err(AppError::bad_request("Faltan campos requeridos")),
    };
    let fecha_clase = parse_fecha_clase(fecha)
        .ok_or_else(|| AppError::bad_request(format!("Fecha de clase inválida: {}", fecha)))?;
    Ok((nombre.to_string(), fecha_clase))
}

pub async fn list_clases(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Clase>>>> {
    let mut clases = state.repo.list_clases().await?;
    newest_first(&mut clases);

    let activas = clases.iter().filter(|c| c.activa).count();
    tracing::info!(
        "{} classes fetched ({} active, {} inactive)",
        clases.len(),
        activas,
        clases.len() - activas
    );
    Ok(Json(ApiResponse::ok(clases)))
}

pub async fn get_clase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Clase>>> {
    check_id(&id)?;

    let clase = state
        .repo
        .get_clase(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Clase no encontrada"))?;

    Ok(Json(ApiResponse::ok(clase)))
}

pub async fn create_clase(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(mut form): ApiJson<ClaseForm>,
) -> AppResult<Json<ApiResponse<Clase>>> {
    tracing::info!("Admin {} creating class", admin.id);

    let (nombre, fecha_clase) = required_fields(&form)?;
    let estado = form.estado();

    let mut clase = Clase {
        id: ids::new_id(),
        nombre,
        descripcion: form.descripcion.take().unwrap_or_default(),
        fecha_clase,
        enlaces: form.take_enlaces(),
        estado,
        activa: true,
        instructores: form.instructores(),
        tags: form.tags(),
        fecha_creacion: Utc::now(),
        fecha_actualizacion: None,
        creado_por: Some(admin.id),
    };
    clase.set_estado(estado);

    state.repo.save_clase(&clase).await?;

    tracing::info!("Class created: {} ({:?}, {})", clase.id, clase.estado, clase.fecha_clase);
    Ok(Json(ApiResponse::with_message("Clase creada exitosamente", clase)))
}

pub async fn update_clase(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(mut form): ApiJson<ClaseForm>,
) -> AppResult<Json<ApiResponse<Clase>>> {
    tracing::info!("Admin {} updating class {}", admin.id, id);
    check_id(&id)?;

    let (nombre, fecha_clase) = required_fields(&form)?;

    let mut clase = state
        .repo
        .get_clase(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Clase no encontrada"))?;

    clase.nombre = nombre;
    clase.descripcion = form.descripcion.take().unwrap_or_default();
    clase.fecha_clase = fecha_clase;
    clase.enlaces = form.take_enlaces();
    clase.instructores = form.instructores();
    clase.tags = form.tags();
    clase.set_estado(form.estado());
    clase.fecha_actualizacion = Some(Utc::now());

    state.repo.save_clase(&clase).await?;

    tracing::info!("Class updated: {} ({:?})", id, clase.estado);
    Ok(Json(ApiResponse::with_message("Clase actualizada exitosamente", clase)))
}

pub async fn delete_clase(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    tracing::info!("Admin {} deleting class {}", admin.id, id);
    check_id(&id)?;

    if !state.repo.delete_clase(&id).await? {
        return Err(AppError::not_found("Clase no encontrada"));
    }

    tracing::info!("Class deleted: {}", id);
    Ok(Json(ApiResponse::message("Clase eliminada exitosamente")))
}

/// Catalogue shown to users: published classes with material.
pub async fn list_clases_publicadas(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Clase>>>> {
    let mut clases: Vec<Clase> = state
        .repo
        .list_clases()
        .await?
        .into_iter()
        .filter(Clase::visible_para_usuarios)
        .collect();
    newest_first(&mut clases);

    Ok(Json(ApiResponse::ok(clases)))
}
