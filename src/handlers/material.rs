use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use crate::errors::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{
    ids, non_empty, ApiResponse, Clase, SolicitudConUsuario, SolicitudForm, SolicitudMaterial,
    Usuario,
};
use crate::state::AppState;
use super::ApiJson;

const POPULARES: usize = 5;
const DIAS_HISTORIAL: i64 = 30;

pub fn solicitud_id(usuario_id: &str, clase_id: &str) -> String {
    ids::pair_id("solicitud", usuario_id, clase_id)
}

fn enlace_de(clase: Option<&Clase>, tipo: &str) -> Option<String> {
    clase?
        .enlaces
        .iter()
        .find(|e| e.tipo == tipo)
        .map(|e| e.url.clone())
}

fn ya_solicitado(solicitud: SolicitudMaterial) -> Json<ApiResponse<SolicitudMaterial>> {
    let mut body = ApiResponse::with_message("Material ya solicitado anteriormente", solicitud);
    body.exists = Some(true);
    Json(body)
}

pub async fn create_solicitud(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(form): ApiJson<SolicitudForm>,
) -> AppResult<Json<ApiResponse<SolicitudMaterial>>> {
    let clase_id = non_empty(&form.clase_id)
        .ok_or_else(|| AppError::bad_request("Faltan campos requeridos"))?;

    tracing::info!("User {} requesting material of class {}", user.id, clase_id);

    let id = solicitud_id(&user.id, clase_id);
    if let Some(existing) = state.repo.get_solicitud(&id).await? {
        return Ok(ya_solicitado(existing));
    }

    // Missing fields are completed from the class document when it exists
    let clase = if ids::is_valid(clase_id) {
        state.repo.get_clase(clase_id).await?
    } else {
        None
    };

    let clase_nombre = non_empty(&form.clase_nombre)
        .map(String::from)
        .or_else(|| clase.as_ref().map(|c| c.nombre.clone()))
        .ok_or_else(|| AppError::bad_request("Faltan campos requeridos"))?;

    let solicitud = SolicitudMaterial {
        id: id.clone(),
        usuario_id: user.id.clone(),
        clase_id: clase_id.to_string(),
        clase_nombre,
        email: non_empty(&form.email).unwrap_or(user.email.as_str()).to_string(),
        youtube: non_empty(&form.youtube)
            .map(String::from)
            .or_else(|| enlace_de(clase.as_ref(), "youtube")),
        powerpoint: non_empty(&form.powerpoint)
            .map(String::from)
            .or_else(|| enlace_de(clase.as_ref(), "powerpoint")),
        fecha_solicitud: Utc::now(),
    };

    if !state.repo.create_solicitud(&solicitud).await? {
        let existing = state
            .repo
            .get_solicitud(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Solicitud no encontrada"))?;
        return Ok(ya_solicitado(existing));
    }

    tracing::info!("Material request {} registered", solicitud.id);
    Ok(Json(ApiResponse::with_message(
        "Solicitud de material histórico registrada exitosamente",
        solicitud,
    )))
}

/// Admins see every request, other users only their own.
pub async fn list_solicitudes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<SolicitudConUsuario>>>> {
    let usuarios: HashMap<String, Usuario> = state
        .repo
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    let mut solicitudes: Vec<SolicitudConUsuario> = state
        .repo
        .list_solicitudes()
        .await?
        .into_iter()
        .filter(|s| user.is_admin() || s.usuario_id == user.id)
        .map(|solicitud| SolicitudConUsuario {
            usuario: usuarios.get(&solicitud.usuario_id).map(Usuario::publico),
            solicitud,
        })
        .collect();
    solicitudes.sort_by(|a, b| b.solicitud.fecha_solicitud.cmp(&a.solicitud.fecha_solicitud));

    tracing::info!(
        "{} material requests for user {} (admin: {})",
        solicitudes.len(),
        user.id,
        user.is_admin()
    );
    Ok(Json(ApiResponse::ok(solicitudes)))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Conteo {
    #[serde(rename = "_id")]
    pub clave: String,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolicitudesStats {
    pub total: usize,
    pub clases_populares: Vec<Conteo>,
    pub solicitudes_por_dia: Vec<Conteo>,
}

pub fn compute_stats(solicitudes: &[SolicitudMaterial], now: DateTime<Utc>) -> SolicitudesStats {
    let mut por_clase: HashMap<&str, usize> = HashMap::new();
    for s in solicitudes {
        *por_clase.entry(s.clase_nombre.as_str()).or_insert(0) += 1;
    }
    let mut clases_populares: Vec<Conteo> = por_clase
        .into_iter()
        .map(|(clave, count)| Conteo { clave: clave.to_string(), count })
        .collect();
    clases_populares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.clave.cmp(&b.clave)));
    clases_populares.truncate(POPULARES);

    let desde = now - Duration::days(DIAS_HISTORIAL);
    let mut por_dia: BTreeMap<String, usize> = BTreeMap::new();
    for s in solicitudes.iter().filter(|s| s.fecha_solicitud >= desde) {
        *por_dia
            .entry(s.fecha_solicitud.format("%Y-%m-%d").to_string())
            .or_insert(0) += 1;
    }

    SolicitudesStats {
        total: solicitudes.len(),
        clases_populares,
        solicitudes_por_dia: por_dia
            .into_iter()
            .map(|(clave, count)| Conteo { clave, count })
            .collect(),
    }
}

pub async fn solicitudes_stats(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SolicitudesStats>>> {
    let solicitudes = state.repo.list_solicitudes().await?;
    Ok(Json(ApiResponse::ok(compute_stats(&solicitudes, Utc::now()))))
}
