use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    Advanced,
    #[default]
    User,
}

impl FromStr for Rol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Rol::Admin),
            "advanced" => Ok(Rol::Advanced),
            "user" => Ok(Rol::User),
            other => Err(format!("Rol inválido: {}", other)),
        }
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rol::Admin => "admin",
            Rol::Advanced => "advanced",
            Rol::User => "user",
        };
        f.write_str(name)
    }
}

/// Stored user document. Never serialized into an API response; use
/// [`UsuarioPublico`] for that.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    #[serde(rename = "_id")]
    pub id: String,
    pub apellido_nombre: String,
    pub legajo: String,
    pub turno: String,
    pub email: String,
    pub password_hash: String,  // bcrypt, never plaintext
    pub role: Rol,
    pub fecha_registro: DateTime<Utc>,
}

impl Usuario {
    pub fn is_admin(&self) -> bool {
        self.role == Rol::Admin
    }

    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.email == identifier || self.legajo == identifier
    }

    pub fn publico(&self) -> UsuarioPublico {
        UsuarioPublico {
            id: self.id.clone(),
            apellido_nombre: self.apellido_nombre.clone(),
            legajo: self.legajo.clone(),
            turno: self.turno.clone(),
            email: self.email.clone(),
            role: self.role,
            fecha_registro: self.fecha_registro,
        }
    }
}

/// User as returned by the API: same fields minus the password hash.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioPublico {
    #[serde(rename = "_id")]
    pub id: String,
    pub apellido_nombre: String,
    pub legajo: String,
    pub turno: String,
    pub email: String,
    pub role: Rol,
    pub fecha_registro: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario() -> Usuario {
        Usuario {
            id: "u1".into(),
            apellido_nombre: "Pérez, Ana".into(),
            legajo: "1234".into(),
            turno: "Turno tarde".into(),
            email: "ana@example.com".into(),
            password_hash: "$2b$04$hash".into(),
            role: Rol::Advanced,
            fecha_registro: Utc::now(),
        }
    }

    #[test]
    fn test_rol_parse_and_display() {
        for name in ["admin", "advanced", "user"] {
            assert_eq!(name.parse::<Rol>().unwrap().to_string(), name);
        }
        assert!("root".parse::<Rol>().is_err());
        assert!("Admin".parse::<Rol>().is_err());
    }

    #[test]
    fn test_publico_has_no_password() {
        let json = serde_json::to_value(usuario().publico()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["apellidoNombre"], "Pérez, Ana");
        assert_eq!(json["role"], "advanced");
        assert_eq!(json["_id"], "u1");
    }

    #[test]
    fn test_matches_identifier() {
        let u = usuario();
        assert!(u.matches_identifier("ana@example.com"));
        assert!(u.matches_identifier("1234"));
        assert!(!u.matches_identifier("12345"));
    }
}
