use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::ServeDir,
};
use crate::handlers;
use crate::middleware::require_admin;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let max_body_size = state.config.server.max_body_size;

    let admin = Router::new()
        .route("/usuarios", get(handlers::list_users).post(handlers::create_user))
        .route("/usuarios/:id", put(handlers::update_user).delete(handlers::delete_user))
        .route("/usuarios/:id/rol", put(handlers::update_role))
        .route("/usuarios/:id/password", put(handlers::update_password))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let api = Router::new()
        .route("/health", get(handlers::health))

        // Auth routes
        .route("/auth/login", post(handlers::handle_login))
        .route("/auth/register", post(handlers::handle_register))
        .route("/auth/check-legajo/:legajo", get(handlers::check_legajo))

        // Profile routes
        .route("/usuarios/perfil", put(handlers::update_profile))
        .route("/usuarios/cuenta", delete(handlers::delete_account))

        // Class routes
        .route(
            "/clases-historicas",
            get(handlers::list_clases).post(handlers::create_clase),
        )
        .route(
            "/clases-historicas/:id",
            get(handlers::get_clase)
                .put(handlers::update_clase)
                .delete(handlers::delete_clase),
        )

        // Enrollment routes
        .route(
            "/inscripciones",
            get(handlers::list_inscripciones).post(handlers::create_inscripcion),
        )
        .route("/inscripciones/estadisticas", get(handlers::inscripciones_stats))
        .route(
            "/inscripciones/verificar/:usuario_id/:clase",
            get(handlers::verify_inscripcion),
        )

        // Time tracking routes
        .route("/tiempo-clase", get(handlers::list_tiempos))
        .route("/tiempo-clase/guardar", post(handlers::save_tiempo))
        .route("/tiempo-clase/actualizar", post(handlers::update_tiempo))
        .route("/tiempo-clase/estadisticas", get(handlers::tiempo_stats))
        .route("/tiempo-clase/usuario/:id", get(handlers::tiempo_usuario))

        // Material routes
        .route("/material-historico/clases", get(handlers::list_clases_publicadas))
        .route(
            "/material-historico/solicitudes",
            get(handlers::list_solicitudes).post(handlers::create_solicitud),
        )
        .route("/material-historico/estadisticas", get(handlers::solicitudes_stats))

        .nest("/admin", admin)
        .fallback(handlers::api_not_found);

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())

        // Body limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))

        .with_state(state)
}
