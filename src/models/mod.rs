mod usuario;
mod clase;
mod inscripcion;
mod tiempo;
mod solicitud;
mod forms;
mod response;
pub mod ids;

pub use usuario::{Usuario, UsuarioPublico, Rol};
pub use clase::{Clase, Enlace, EnlacesEntrada, EstadoClase, parse_fecha_clase};
pub use inscripcion::{Inscripcion, InscripcionConUsuario};
pub use tiempo::{TiempoClase, TiempoClaseFila};
pub use solicitud::{SolicitudMaterial, SolicitudConUsuario};
pub use forms::{
    LoginForm, RegistroForm, EditarUsuarioForm, RolForm, PasswordForm, PerfilForm,
    EliminarCuentaForm, ClaseForm, InscripcionForm, TiempoForm, SolicitudForm, TiempoFiltro,
    non_empty,
};
pub use response::ApiResponse;
