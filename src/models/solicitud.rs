use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::usuario::UsuarioPublico;

/// A user's request for the recorded material of a class.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SolicitudMaterial {
    #[serde(rename = "_id")]
    pub id: String,
    pub usuario_id: String,
    pub clase_id: String,
    pub clase_nombre: String,
    pub email: String,
    pub youtube: Option<String>,
    pub powerpoint: Option<String>,
    pub fecha_solicitud: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SolicitudConUsuario {
    #[serde(flatten)]
    pub solicitud: SolicitudMaterial,
    // None when the requesting user was deleted afterwards
    pub usuario: Option<UsuarioPublico>,
}
