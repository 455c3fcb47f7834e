use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use crate::errors::{AppError, AppResult};
use crate::middleware::AdminUser;
use crate::models::{
    ids, non_empty, ApiResponse, Inscripcion, InscripcionConUsuario, InscripcionForm, Usuario,
};
use crate::state::AppState;
use super::{auth::existence, ApiJson};

const ULTIMAS: usize = 10;

pub fn inscripcion_id(usuario_id: &str, clase: &str) -> String {
    ids::pair_id("inscripcion", usuario_id, clase)
}

pub async fn create_inscripcion(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<InscripcionForm>,
) -> AppResult<Json<ApiResponse<Inscripcion>>> {
    let (usuario_id, clase) = match (non_empty(&form.usuario_id), non_empty(&form.clase)) {
        (Some(u), Some(c)) => (u, c),
        _ => return Err(AppError::bad_request("Faltan campos requeridos")),
    };

    let usuario = if ids::is_valid(usuario_id) {
        state.repo.get_user(usuario_id).await?
    } else {
        None
    }
    .ok_or_else(|| AppError::not_found("Usuario no encontrado"))?;

    let inscripcion = Inscripcion {
        id: inscripcion_id(&usuario.id, clase),
        usuario_id: usuario.id.clone(),
        clase: clase.to_string(),
        turno: non_empty(&form.turno).unwrap_or(usuario.turno.as_str()).to_string(),
        fecha: Utc::now(),
    };

    // The id is derived from (user, class), so a second insert collides
    if !state.repo.create_inscripcion(&inscripcion).await? {
        tracing::info!("User {} already enrolled in {}", usuario.id, clase);
        return Err(AppError::bad_request("Ya estás inscrito en esta clase"));
    }

    tracing::info!("User {} enrolled in {}", usuario.id, clase);
    Ok(Json(ApiResponse::with_message(
        "Inscripción registrada exitosamente",
        inscripcion,
    )))
}

/// `usuario` may be a user id or a legajo.
pub async fn verify_inscripcion(
    State(state): State<AppState>,
    Path((usuario, clase)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Value>>> {
    tracing::debug!("Checking enrollment of {} in {}", usuario, clase);

    let usuario_id = if ids::is_valid(&usuario) {
        Some(usuario)
    } else {
        state.repo.find_user_by_legajo(&usuario).await?.map(|u| u.id)
    };

    let exists = match usuario_id {
        Some(id) => state.repo.get_inscripcion(&inscripcion_id(&id, &clase)).await?.is_some(),
        None => false,
    };

    Ok(Json(existence(exists)))
}

// Enrollments whose user still exists, newest first.
async fn joined_inscripciones(state: &AppState) -> AppResult<Vec<InscripcionConUsuario>> {
    let usuarios: HashMap<String, Usuario> = state
        .repo
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    let mut joined: Vec<InscripcionConUsuario> = state
        .repo
        .list_inscripciones()
        .await?
        .into_iter()
        .filter_map(|inscripcion| {
            let usuario = usuarios.get(&inscripcion.usuario_id)?.publico();
            Some(InscripcionConUsuario { inscripcion, usuario })
        })
        .collect();

    joined.sort_by(|a, b| b.inscripcion.fecha.cmp(&a.inscripcion.fecha));
    Ok(joined)
}

pub async fn list_inscripciones(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<ApiResponse<Vec<InscripcionConUsuario>>>> {
    let inscripciones = joined_inscripciones(&state).await?;
    tracing::info!("{} enrollments fetched", inscripciones.len());
    Ok(Json(ApiResponse::ok(inscripciones)))
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionesStats {
    pub total: usize,
    pub hoy: usize,
    pub por_clase: BTreeMap<String, usize>,
    pub por_turno: BTreeMap<String, usize>,
    pub ultimas: Vec<UltimaInscripcion>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct UltimaInscripcion {
    pub usuario: String,
    pub clase: String,
    pub fecha: String,
}

/// Expects `inscripciones` newest first.
pub fn compute_stats(inscripciones: &[InscripcionConUsuario], now: DateTime<Utc>) -> InscripcionesStats {
    let today = now.date_naive();
    let mut por_clase = BTreeMap::new();
    let mut por_turno = BTreeMap::new();

    for i in inscripciones {
        *por_clase.entry(i.inscripcion.clase.clone()).or_insert(0) += 1;
        if !i.inscripcion.turno.is_empty() {
            *por_turno.entry(i.inscripcion.turno.clone()).or_insert(0) += 1;
        }
    }

    InscripcionesStats {
        total: inscripciones.len(),
        hoy: inscripciones
            .iter()
            .filter(|i| i.inscripcion.fecha.date_naive() == today)
            .count(),
        por_clase,
        por_turno,
        ultimas: inscripciones
            .iter()
            .take(ULTIMAS)
            .map(|i| UltimaInscripcion {
                usuario: i.usuario.apellido_nombre.clone(),
                clase: i.inscripcion.clase.clone(),
                fecha: i.inscripcion.fecha.format("%d/%m/%Y %H:%M:%S").to_string(),
            })
            .collect(),
    }
}

pub async fn inscripciones_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> AppResult<Json<ApiResponse<InscripcionesStats>>> {
    let inscripciones = joined_inscripciones(&state).await?;
    tracing::info!("Computing stats over {} enrollments", inscripciones.len());
    Ok(Json(ApiResponse::ok(compute_stats(&inscripciones, Utc::now()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rol, UsuarioPublico};
    use chrono::{Duration, TimeZone};

    fn row(nombre: &str, clase: &str, turno: &str, fecha: DateTime<Utc>) -> InscripcionConUsuario {
        InscripcionConUsuario {
            inscripcion: Inscripcion {
                id: ids::new_id(),
                usuario_id: nombre.into(),
                clase: clase.into(),
                turno: turno.into(),
                fecha,
            },
            usuario: UsuarioPublico {
                id: nombre.into(),
                apellido_nombre: nombre.into(),
                legajo: "1".into(),
                turno: turno.into(),
                email: format!("{}@x.com", nombre),
                role: Rol::User,
                fecha_registro: fecha,
            },
        }
    }

    #[test]
    fn test_compute_stats() {
        let now = Utc.with_ymd_and_hms(2026, 5, 20, 15, 0, 0).unwrap();
        let rows = vec![
            row("ana", "Stroke", "Mañana", now - Duration::hours(1)),
            row("beto", "Stroke", "Tarde", now - Duration::hours(3)),
            row("caro", "Telemetría", "Mañana", now - Duration::days(2)),
        ];

        let stats = compute_stats(&rows, now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.hoy, 2);
        assert_eq!(stats.por_clase["Stroke"], 2);
        assert_eq!(stats.por_clase["Telemetría"], 1);
        assert_eq!(stats.por_turno["Mañana"], 2);
        assert_eq!(stats.ultimas.len(), 3);
        assert_eq!(stats.ultimas[0].usuario, "ana");
        assert_eq!(stats.ultimas[0].fecha, "20/05/2026 14:00:00");
    }

    #[test]
    fn test_ultimas_is_capped() {
        let now = Utc::now();
        let rows: Vec<_> = (0..15)
            .map(|i| row(&format!("u{}", i), "X", "", now - Duration::minutes(i)))
            .collect();

        let stats = compute_stats(&rows, now);
        assert_eq!(stats.ultimas.len(), ULTIMAS);
        assert!(stats.por_turno.is_empty());
    }
}
