use serde::{Deserialize, Deserializer};
use super::clase::{Enlace, EnlacesEntrada, EstadoClase};

// Legajos arrive as either JSON strings or numbers.
fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
        StringOrNumber::Str(s) => s,
        StringOrNumber::Num(n) => n.to_string(),
    }))
}

/// Trimmed value of an optional text field, `None` when missing or blank.
pub fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// Body of both public registration and admin user creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistroForm {
    pub apellido_nombre: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub legajo: Option<String>,
    pub turno: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditarUsuarioForm {
    pub apellido_nombre: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub legajo: Option<String>,
    pub email: Option<String>,
    pub turno: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RolForm {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordForm {
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfilForm {
    pub apellido_nombre: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub legajo: Option<String>,
    pub turno: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminarCuentaForm {
    pub current_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaseForm {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub fecha_clase: Option<String>,
    pub enlaces: Option<EnlacesEntrada>,
    pub enlaces_array: Option<Vec<Enlace>>,
    pub activa: Option<bool>,
    pub estado: Option<EstadoClase>,
    #[serde(default)]
    pub instructores: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ClaseForm {
    /// The list form wins when both link shapes are present and it is non-empty.
    pub fn take_enlaces(&mut self) -> Vec<Enlace> {
        if let Some(lista) = self.enlaces_array.take().filter(|l| !l.is_empty()) {
            return EnlacesEntrada::Lista(lista).normalizar();
        }
        self.enlaces.take().map(EnlacesEntrada::normalizar).unwrap_or_default()
    }

    pub fn estado(&self) -> EstadoClase {
        self.estado.unwrap_or_else(|| EstadoClase::from_legacy(self.activa))
    }

    pub fn instructores(&self) -> Vec<String> {
        clean_list(&self.instructores)
    }

    pub fn tags(&self) -> Vec<String> {
        clean_list(&self.tags)
    }
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionForm {
    pub usuario_id: Option<String>,
    pub clase: Option<String>,
    pub turno: Option<String>,
}

/// Cumulative totals of one viewer-page session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiempoForm {
    pub clase_id: Option<String>,
    pub clase_nombre: Option<String>,
    pub sesion_id: Option<String>,
    #[serde(default)]
    pub segundos_activos: u64,
    #[serde(default)]
    pub segundos_inactivos: u64,
    #[serde(default, rename = "final")]
    pub es_final: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolicitudForm {
    pub clase_id: Option<String>,
    pub clase_nombre: Option<String>,
    pub email: Option<String>,
    pub youtube: Option<String>,
    pub powerpoint: Option<String>,
}

/// Query filters of the time dashboard.
#[derive(Debug, Deserialize, Default)]
pub struct TiempoFiltro {
    pub clase: Option<String>,
    pub periodo: Option<String>,
    pub usuario: Option<String>,
}
