use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EstadoClase {
    /// Only visible in the admin panel.
    #[default]
    Activa,
    /// Visible to users when the class has at least one link.
    Publicada,
    Cancelada,
}

impl EstadoClase {
    /// Status for documents that only carry the legacy `activa` flag.
    pub fn from_legacy(activa: Option<bool>) -> Self {
        match activa {
            Some(false) => EstadoClase::Cancelada,
            _ => EstadoClase::Activa,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Enlace {
    pub tipo: String,
    pub url: String,
    #[serde(default)]
    pub descripcion: String,
}

impl Enlace {
    pub fn new(tipo: &str, url: &str, descripcion: Option<&str>) -> Self {
        let descripcion = match descripcion.map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => tipo_label(tipo).to_string(),
        };
        Self {
            tipo: tipo.trim().to_string(),
            url: url.trim().to_string(),
            descripcion,
        }
    }
}

fn tipo_label(tipo: &str) -> &'static str {
    match tipo {
        "youtube" => "YouTube",
        "vimeo" => "Vimeo",
        "pdf" => "PDF",
        "powerpoint" => "Presentación",
        "document" => "Documento",
        "drive" => "Google Drive",
        _ => "Enlace",
    }
}

/// Links as submitted by a client: either the legacy `{youtube, powerpoint}`
/// object or the list form.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum EnlacesEntrada {
    Lista(Vec<Enlace>),
    Legado {
        #[serde(default)]
        youtube: Option<String>,
        #[serde(default)]
        powerpoint: Option<String>,
    },
}

impl EnlacesEntrada {
    /// Canonical list form. Entries without a type or URL are dropped.
    pub fn normalizar(self) -> Vec<Enlace> {
        match self {
            EnlacesEntrada::Lista(enlaces) => enlaces
                .into_iter()
                .filter(|e| !e.tipo.trim().is_empty() && !e.url.trim().is_empty())
                .map(|e| Enlace::new(&e.tipo, &e.url, Some(&e.descripcion)))
                .collect(),
            EnlacesEntrada::Legado { youtube, powerpoint } => [("youtube", youtube), ("powerpoint", powerpoint)]
                .into_iter()
                .filter_map(|(tipo, url)| {
                    url.filter(|u| !u.trim().is_empty())
                        .map(|u| Enlace::new(tipo, &u, None))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Clase {
    #[serde(rename = "_id")]
    pub id: String,
    pub nombre: String,
    pub descripcion: String,
    pub fecha_clase: DateTime<Utc>,
    pub enlaces: Vec<Enlace>,
    pub estado: EstadoClase,
    pub activa: bool,  // mirrors `estado != cancelada` for older clients
    pub instructores: Vec<String>,
    pub tags: Vec<String>,
    pub fecha_creacion: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_actualizacion: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creado_por: Option<String>,
}

impl Clase {
    pub fn set_estado(&mut self, estado: EstadoClase) {
        self.estado = estado;
        self.activa = estado != EstadoClase::Cancelada;
    }

    pub fn visible_para_usuarios(&self) -> bool {
        self.estado == EstadoClase::Publicada && !self.enlaces.is_empty()
    }
}

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC) or a bare date.
pub fn parse_fecha_clase(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_legacy_links_are_normalized() {
        let entrada: EnlacesEntrada = serde_json::from_str(
            r#"{"youtube": "https://youtu.be/x", "powerpoint": ""}"#,
        )
        .unwrap();

        let enlaces = entrada.normalizar();
        assert_eq!(enlaces, vec![Enlace {
            tipo: "youtube".into(),
            url: "https://youtu.be/x".into(),
            descripcion: "YouTube".into(),
        }]);
    }

    #[test]
    fn test_list_links_drop_incomplete_entries() {
        let entrada: EnlacesEntrada = serde_json::from_str(
            r#"[
                {"tipo": "pdf", "url": "https://a/b.pdf"},
                {"tipo": "", "url": "https://nope"},
                {"tipo": "drive", "url": "https://drive/x", "descripcion": "Carpeta"}
            ]"#,
        )
        .unwrap();

        let enlaces = entrada.normalizar();
        assert_eq!(enlaces.len(), 2);
        assert_eq!(enlaces[0].descripcion, "PDF");
        assert_eq!(enlaces[1].descripcion, "Carpeta");
    }

    #[test]
    fn test_parse_fecha_clase_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 4, 10, 0, 0).unwrap();
        assert_eq!(parse_fecha_clase("2025-12-04T10:00:00"), Some(expected));
        assert_eq!(parse_fecha_clase("2025-12-04T10:00"), Some(expected));
        assert_eq!(parse_fecha_clase("2025-12-04T10:00:00Z"), Some(expected));
        assert_eq!(parse_fecha_clase("2025-12-04T07:00:00-03:00"), Some(expected));
        assert_eq!(
            parse_fecha_clase("2025-12-04"),
            Some(Utc.with_ymd_and_hms(2025, 12, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_fecha_clase("mañana"), None);
    }

    #[test]
    fn test_estado_from_legacy_flag() {
        assert_eq!(EstadoClase::from_legacy(Some(false)), EstadoClase::Cancelada);
        assert_eq!(EstadoClase::from_legacy(Some(true)), EstadoClase::Activa);
        assert_eq!(EstadoClase::from_legacy(None), EstadoClase::Activa);
    }
}
