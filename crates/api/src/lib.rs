pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me))
        .route("/me", put(routes::auth::update_me))
        .route("/link", post(routes::auth::link_auth));

    // Ledger routes (under project)
    let expense_routes = Router::new()
        .route("/", get(routes::expense::list))
        .route("/", post(routes::expense::create))
        .route("/{expense_id}", put(routes::expense::update))
        .route("/{expense_id}", delete(routes::expense::remove));

    let phase_routes = Router::new()
        .route("/", get(routes::phase::list))
        .route("/", post(routes::phase::create))
        .route("/{phase_id}", put(routes::phase::update))
        .route("/{phase_id}", delete(routes::phase::remove));

    let material_routes = Router::new()
        .route("/", get(routes::material::list))
        .route("/", post(routes::material::create))
        .route("/{material_id}", put(routes::material::update))
        .route("/{material_id}", delete(routes::material::remove));

    let project_routes = Router::new()
        .route("/", get(routes::project::list))
        .route("/", post(routes::project::create))
        .route("/{project_id}", get(routes::project::get))
        .route("/{project_id}", put(routes::project::update))
        .nest("/{project_id}/expense", expense_routes)
        .nest("/{project_id}/phase", phase_routes)
        .nest("/{project_id}/material", material_routes);

    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route("/{notification_id}/read", put(routes::notification::mark_read))
        .route("/read-all", put(routes::notification::mark_all_read));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/project", project_routes)
        .nest("/api/notification", notification_routes)
        .route("/api/ws", get(ws::ws_upgrade))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
