use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::usuario::UsuarioPublico;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Inscripcion {
    #[serde(rename = "_id")]
    pub id: String,
    pub usuario_id: String,
    pub clase: String,
    pub turno: String,
    pub fecha: DateTime<Utc>,
}

/// Enrollment joined with its user, as listed to admins.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InscripcionConUsuario {
    #[serde(flatten)]
    pub inscripcion: Inscripcion,
    pub usuario: UsuarioPublico,
}
