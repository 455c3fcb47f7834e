use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use crate::errors::{AppError, AppResult};
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::{
    ids, non_empty, ApiResponse, TiempoClase, TiempoClaseFila, TiempoFiltro, TiempoForm, Usuario,
};
use crate::state::AppState;
use crate::tracker::Snapshot;
use super::{check_id, ApiJson};

pub fn tiempo_id(usuario_id: &str, clase_nombre: &str) -> String {
    ids::pair_id("tiempo", usuario_id, clase_nombre)
}

pub async fn save_tiempo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(form): ApiJson<TiempoForm>,
) -> AppResult<Json<ApiResponse<TiempoClaseFila>>> {
    record_tiempo(&state, &user, form, true).await
}

pub async fn update_tiempo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(form): ApiJson<TiempoForm>,
) -> AppResult<Json<ApiResponse<TiempoClaseFila>>> {
    record_tiempo(&state, &user, form, false).await
}

async fn record_tiempo(
    state: &AppState,
    user: &Usuario,
    form: TiempoForm,
    create: bool,
) -> AppResult<Json<ApiResponse<TiempoClaseFila>>> {
    let sesion_id = non_empty(&form.sesion_id)
        .ok_or_else(|| AppError::bad_request("Faltan campos requeridos"))?;
    let clase_id = non_empty(&form.clase_id).map(String::from);

    let clase_nombre = match (non_empty(&form.clase_nombre), &clase_id) {
        (Some(nombre), _) => nombre.to_string(),
        // Fall back to the class document when only its id was sent
        (None, Some(id)) if ids::is_valid(id) => state
            .repo
            .get_clase(id)
            .await?
            .map(|c| c.nombre)
            .ok_or_else(|| AppError::not_found("Clase no encontrada"))?,
        _ => return Err(AppError::bad_request("Faltan campos requeridos")),
    };

    let snapshot = Snapshot::new(form.segundos_activos, form.segundos_inactivos);
    if snapshot.total_secs() > state.config.tracking.max_session_secs {
        tracing::warn!("Rejecting implausible report from user {}: {:?}", user.id, snapshot);
        return Err(AppError::bad_request("Tiempo inválido"));
    }

    let id = tiempo_id(&user.id, &clase_nombre);
    let now = Utc::now();

    if create && state.repo.get_tiempo(&id).await?.is_none() {
        let nuevo = TiempoClase::new(id.clone(), &user.id, clase_id.clone(), &clase_nombre, now);
        // Losing this race to another flush of the same user is fine
        if state.repo.create_tiempo(&nuevo).await? {
            tracing::info!("Time record opened for user {} in {}", user.id, clase_nombre);
        }
    }

    let mut changed = false;
    let tiempo = state
        .repo
        .update_tiempo(&id, |tiempo| {
            changed = tiempo.registrar(sesion_id, snapshot, form.es_final, now);
            if tiempo.clase_id.is_none() {
                tiempo.clase_id = clase_id.clone();
            }
            true
        })
        .await?
        .ok_or_else(|| AppError::not_found("Registro de tiempo no encontrado"))?;

    tracing::debug!(
        "Session {} of user {} in {}: {:?} (changed: {}, final: {})",
        sesion_id,
        user.id,
        clase_nombre,
        snapshot,
        changed,
        form.es_final
    );

    Ok(Json(ApiResponse::with_message(
        "Tiempo registrado correctamente",
        tiempo.fila(user),
    )))
}

pub fn apply_filter(filas: Vec<TiempoClaseFila>, filtro: &TiempoFiltro, now: DateTime<Utc>) -> Vec<TiempoClaseFila> {
    let clase = non_empty(&filtro.clase).filter(|c| *c != "todas");
    let desde = match non_empty(&filtro.periodo) {
        Some("semana") => Some(now - Duration::days(7)),
        Some("mes") => now.checked_sub_months(Months::new(1)),
        _ => None,
    };
    let hoy = non_empty(&filtro.periodo) == Some("hoy");
    let usuario = non_empty(&filtro.usuario).map(str::to_lowercase);

    let mut filas: Vec<TiempoClaseFila> = filas
        .into_iter()
        .filter(|f| clase.map_or(true, |c| f.clase_nombre == c))
        .filter(|f| !hoy || f.fecha_registro.date_naive() == now.date_naive())
        .filter(|f| desde.map_or(true, |d| f.fecha_registro >= d))
        .filter(|f| {
            usuario.as_deref().map_or(true, |term| {
                f.usuario_nombre.to_lowercase().contains(term) || f.legajo.to_lowercase().contains(term)
            })
        })
        .collect();

    filas.sort_by(|a, b| b.fecha_registro.cmp(&a.fecha_registro));
    filas
}

// Records joined with their user; records of deleted users are dropped.
async fn all_filas(state: &AppState) -> AppResult<Vec<TiempoClaseFila>> {
    let usuarios: HashMap<String, Usuario> = state
        .repo
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    Ok(state
        .repo
        .list_tiempos()
        .await?
        .iter()
        .filter_map(|t| usuarios.get(&t.usuario_id).map(|u| t.fila(u)))
        .collect())
}

pub async fn list_tiempos(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(filtro): Query<TiempoFiltro>,
) -> AppResult<Json<ApiResponse<Vec<TiempoClaseFila>>>> {
    let filas = apply_filter(all_filas(&state).await?, &filtro, Utc::now());
    tracing::info!("{} time records fetched", filas.len());
    Ok(Json(ApiResponse::ok(filas)))
}

#[derive(Debug, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TiempoStats {
    pub total_registros: usize,
    pub usuarios_distintos: usize,
    pub clases_distintas: usize,
    pub tiempo_total_segundos: u64,
    pub por_clase: BTreeMap<String, ClaseStats>,
}

#[derive(Debug, Serialize, PartialEq, Default)]
pub struct ClaseStats {
    pub registros: usize,
    pub segundos: u64,
}

pub fn compute_stats(filas: &[TiempoClaseFila]) -> TiempoStats {
    let mut por_clase: BTreeMap<String, ClaseStats> = BTreeMap::new();
    for f in filas {
        let entry = por_clase.entry(f.clase_nombre.clone()).or_default();
        entry.registros += 1;
        entry.segundos = entry.segundos.saturating_add(f.tiempo_segundos);
    }

    TiempoStats {
        total_registros: filas.len(),
        usuarios_distintos: filas.iter().map(|f| &f.usuario_id).collect::<HashSet<_>>().len(),
        clases_distintas: por_clase.len(),
        tiempo_total_segundos: filas
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.tiempo_segundos)),
        por_clase,
    }
}

pub async fn tiempo_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(filtro): Query<TiempoFiltro>,
) -> AppResult<Json<ApiResponse<TiempoStats>>> {
    let filas = apply_filter(all_filas(&state).await?, &filtro, Utc::now());
    Ok(Json(ApiResponse::ok(compute_stats(&filas))))
}

pub async fn tiempo_usuario(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Value>>> {
    check_id(&id)?;

    let usuario = state
        .repo
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Usuario no encontrado"))?;

    let mut registros: Vec<TiempoClaseFila> = state
        .repo
        .list_tiempos()
        .await?
        .iter()
        .filter(|t| t.usuario_id == usuario.id)
        .map(|t| t.fila(&usuario))
        .collect();
    registros.sort_by(|a, b| b.fecha_registro.cmp(&a.fecha_registro));

    tracing::debug!("{} time records for user {}", registros.len(), id);
    Ok(Json(ApiResponse::ok(json!({
        "usuario": usuario.publico(),
        "registros": registros,
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fila(usuario: &str, legajo: &str, clase: &str, secs: u64, registro: DateTime<Utc>) -> TiempoClaseFila {
        TiempoClaseFila {
            id: ids::new_id(),
            usuario_id: format!("id-{}", legajo),
            usuario_nombre: usuario.into(),
            legajo: legajo.into(),
            turno: "Mañana".into(),
            clase_id: None,
            clase_nombre: clase.into(),
            tiempo_segundos: secs,
            segundos_activos: secs,
            segundos_inactivos: 0,
            sesiones: 1,
            fecha_registro: registro,
            fecha_actualizacion: registro,
            activo: false,
        }
    }

    fn sample(now: DateTime<Utc>) -> Vec<TiempoClaseFila> {
        vec![
            fila("Pérez, Ana", "100", "Stroke", 600, now - Duration::hours(1)),
            fila("Gómez, Beto", "200", "Stroke", 1200, now - Duration::days(3)),
            fila("Pérez, Ana", "100", "Telemetría", 300, now - Duration::days(20)),
            fila("Díaz, Caro", "300", "Telemetría", 60, now - Duration::days(60)),
        ]
    }

    fn filtro(clase: Option<&str>, periodo: Option<&str>, usuario: Option<&str>) -> TiempoFiltro {
        TiempoFiltro {
            clase: clase.map(String::from),
            periodo: periodo.map(String::from),
            usuario: usuario.map(String::from),
        }
    }

    #[test]
    fn test_filter_by_period() {
        let now = Utc.with_ymd_and_hms(2026, 4, 15, 18, 0, 0).unwrap();
        assert_eq!(apply_filter(sample(now), &filtro(None, Some("hoy"), None), now).len(), 1);
        assert_eq!(apply_filter(sample(now), &filtro(None, Some("semana"), None), now).len(), 2);
        assert_eq!(apply_filter(sample(now), &filtro(None, Some("mes"), None), now).len(), 3);
        assert_eq!(apply_filter(sample(now), &filtro(None, Some("todo"), None), now).len(), 4);
    }

    #[test]
    fn test_filter_by_class_and_user() {
        let now = Utc.with_ymd_and_hms(2026, 4, 15, 18, 0, 0).unwrap();

        let stroke = apply_filter(sample(now), &filtro(Some("Stroke"), None, None), now);
        assert_eq!(stroke.len(), 2);
        assert!(stroke.iter().all(|f| f.clase_nombre == "Stroke"));

        assert_eq!(apply_filter(sample(now), &filtro(Some("todas"), None, None), now).len(), 4);
        assert_eq!(apply_filter(sample(now), &filtro(None, None, Some("pérez")), now).len(), 2);
        assert_eq!(apply_filter(sample(now), &filtro(None, None, Some("300")), now).len(), 1);
    }

    #[test]
    fn test_filter_sorts_newest_first() {
        let now = Utc::now();
        let filas = apply_filter(sample(now), &TiempoFiltro::default(), now);
        assert!(filas.windows(2).all(|w| w[0].fecha_registro >= w[1].fecha_registro));
    }

    #[test]
    fn test_stats_saturate_instead_of_overflowing() {
        let now = Utc::now();
        let filas = vec![
            fila("A", "1", "Stroke", u64::MAX, now),
            fila("B", "2", "Stroke", 10, now),
        ];
        let stats = compute_stats(&filas);
        assert_eq!(stats.tiempo_total_segundos, u64::MAX);
        assert_eq!(stats.por_clase["Stroke"].segundos, u64::MAX);
    }

    #[test]
    fn test_compute_stats() {
        let stats = compute_stats(&sample(Utc::now()));
        assert_eq!(stats.total_registros, 4);
        assert_eq!(stats.usuarios_distintos, 3);
        assert_eq!(stats.clases_distintas, 2);
        assert_eq!(stats.tiempo_total_segundos, 2160);
        assert_eq!(stats.por_clase["Stroke"], ClaseStats { registros: 2, segundos: 1800 });
    }
}
