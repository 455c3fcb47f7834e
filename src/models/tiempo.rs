use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::tracker::{SessionLedger, Snapshot};
use super::usuario::Usuario;

/// Running total of time on the viewer page for one (user, class) pair.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TiempoClase {
    #[serde(rename = "_id")]
    pub id: String,
    pub usuario_id: String,
    #[serde(default)]
    pub clase_id: Option<String>,
    pub clase_nombre: String,
    pub sesiones: SessionLedger,
    pub activo: bool,
    pub fecha_registro: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

impl TiempoClase {
    pub fn new(id: String, usuario_id: &str, clase_id: Option<String>, clase_nombre: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            usuario_id: usuario_id.to_string(),
            clase_id,
            clase_nombre: clase_nombre.to_string(),
            sesiones: SessionLedger::default(),
            activo: true,
            fecha_registro: now,
            fecha_actualizacion: now,
        }
    }

    /// Folds one session report into the record. The record stays active
    /// while any of its sessions has not sent its final report.
    pub fn registrar(&mut self, sesion_id: &str, snapshot: Snapshot, es_final: bool, now: DateTime<Utc>) -> bool {
        let changed = self.sesiones.merge(sesion_id, snapshot, es_final);
        self.activo = self.sesiones.any_open();
        self.fecha_actualizacion = now;
        changed
    }

    /// Closes every session, as if each had sent its final report.
    pub fn cerrar(&mut self) {
        self.sesiones.close_all();
        self.activo = false;
    }

    pub fn totales(&self) -> Snapshot {
        self.sesiones.totals()
    }

    pub fn fila(&self, usuario: &Usuario) -> TiempoClaseFila {
        let totales = self.totales();
        TiempoClaseFila {
            id: self.id.clone(),
            usuario_id: self.usuario_id.clone(),
            usuario_nombre: usuario.apellido_nombre.clone(),
            legajo: usuario.legajo.clone(),
            turno: usuario.turno.clone(),
            clase_id: self.clase_id.clone(),
            clase_nombre: self.clase_nombre.clone(),
            tiempo_segundos: totales.active_secs,
            segundos_activos: totales.active_secs,
            segundos_inactivos: totales.inactive_secs,
            sesiones: self.sesiones.len(),
            fecha_registro: self.fecha_registro,
            fecha_actualizacion: self.fecha_actualizacion,
            activo: self.activo,
        }
    }
}

/// Flattened row shown on the admin time dashboard.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TiempoClaseFila {
    #[serde(rename = "_id")]
    pub id: String,
    pub usuario_id: String,
    pub usuario_nombre: String,
    pub legajo: String,
    pub turno: String,
    pub clase_id: Option<String>,
    pub clase_nombre: String,
    pub tiempo_segundos: u64,  // active time, the figure the dashboard reports
    pub segundos_activos: u64,
    pub segundos_inactivos: u64,
    pub sesiones: usize,
    pub fecha_registro: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub activo: bool,
}
