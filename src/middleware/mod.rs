mod auth;

pub use auth::{require_admin, AdminUser, CurrentUser, USER_ID_HEADER};
