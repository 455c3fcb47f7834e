use chrono::Utc;
use crate::config::{BootstrapConfig, SecurityConfig};
use crate::errors::AppResult;
use crate::models::{ids, Rol, Usuario};
use crate::services::{passwords::hash_password, Repository};

/// Creates the configured administrator unless an account already uses its email.
/// Returns whether an account was created.
pub async fn ensure_admin(
    repo: &Repository,
    admin: &BootstrapConfig,
    security: &SecurityConfig,
) -> AppResult<bool> {
    if repo.find_user_by_email(&admin.admin_email).await?.is_some() {
        tracing::debug!("Bootstrap admin {} already present", admin.admin_email);
        return Ok(false);
    }

    let user = Usuario {
        id: ids::new_id(),
        apellido_nombre: admin.admin_name.clone(),
        legajo: admin.admin_legajo.clone(),
        turno: admin.admin_turno.clone(),
        email: admin.admin_email.clone(),
        password_hash: hash_password(&admin.admin_password, security.bcrypt_cost).await?,
        role: Rol::Admin,
        fecha_registro: Utc::now(),
    };
    repo.save_user(&user).await?;

    tracing::info!("Bootstrap admin {} created", user.email);
    Ok(true)
}
