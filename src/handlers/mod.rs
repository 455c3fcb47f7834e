mod extract;
mod health;
mod auth;
mod usuarios;
mod clases;
mod inscripciones;
mod tiempo;
mod material;

pub use extract::ApiJson;
pub use health::{health, api_not_found};
pub use auth::{handle_login, handle_register, check_legajo};
pub use usuarios::{
    list_users, create_user, update_user, update_role, update_password, delete_user,
    update_profile, delete_account,
};
pub use clases::{list_clases, get_clase, create_clase, update_clase, delete_clase, list_clases_publicadas};
pub use inscripciones::{create_inscripcion, verify_inscripcion, list_inscripciones, inscripciones_stats};
pub use tiempo::{save_tiempo, update_tiempo, list_tiempos, tiempo_stats, tiempo_usuario};
pub use material::{create_solicitud, list_solicitudes, solicitudes_stats};

use crate::errors::{AppError, AppResult};
use crate::models::ids;

// Path ids must look like document ids before touching the store.
fn check_id(id: &str) -> AppResult<()> {
    if ids::is_valid(id) {
        Ok(())
    } else {
        Err(AppError::bad_request("ID inválido"))
    }
}
