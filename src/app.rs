// app.rs - shared state and router assembly

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use crate::cache::ViewCache;
use crate::config::{AppConfig, SecurityConfig, StoreBackend};
use crate::database::{DatabaseError, DatabaseManager, MemoryStore, PgStore, Store};
use crate::handlers::{elevated, protected, public};
use crate::mail::{self, Mailer};
use crate::middleware::{require_session, require_staff};
use crate::storage::FileStorage;

/// Everything a handler needs, injected through axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cache: Arc<ViewCache>,
    pub storage: FileStorage,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            cache: Arc::new(ViewCache::new(Duration::from_secs(config.cache.view_ttl_secs))),
            storage: FileStorage::new(&config.storage.root),
            mailer: mail::from_config(&config.email),
            config: Arc::new(config),
        }
    }

    /// State over a fresh memory store, for local runs and tests.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}

/// Open the configured store, applying migrations first when enabled.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, DatabaseError> {
    match config.database.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(elevated_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes)),
        );

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

/// Tier 1: no session required
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/register", post(public::auth::register))
        .route("/auth/login", post(public::auth::login))
        .route("/auth/logout", post(public::auth::logout))
        .route("/plans", get(public::site::plans_list))
        .route("/events", get(public::site::events_list))
        .route("/events/:id", get(public::site::event_get))
        .route("/hubs", get(public::site::hubs_list))
        .route("/hubs/:id", get(public::site::hub_get))
        .route("/maps", get(public::site::map_get))
        .route("/maps/routes", get(public::site::routes_list))
        .route("/maps/routes/:id", get(public::site::route_get))
        .route("/about/:section", get(public::site::section_get))
        .route("/participants/:slug", get(public::site::participant_profile))
        .route("/storage/*path", get(public::site::storage_get))
        .route("/check-display-number", post(public::site::check_display_number))
}

/// Tier 2: any valid session
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{events, participants, users};

    Router::new()
        .route("/users/:id", get(users::user_get))
        .route(
            "/users/participants/:user_id/details",
            get(participants::details_get)
                .post(participants::details_post)
                .put(participants::details_put),
        )
        .route(
            "/users/participants/:user_id/hours",
            get(participants::hours_get)
                .post(participants::hours_put)
                .put(participants::hours_put),
        )
        .route(
            "/users/participants/:user_id/info",
            get(participants::info_get)
                .post(participants::info_put)
                .put(participants::info_put),
        )
        .route(
            "/users/participants/:user_id/invoice",
            get(participants::invoice_get)
                .post(participants::invoice_put)
                .put(participants::invoice_put),
        )
        .route(
            "/users/participants/:user_id/map-info",
            get(participants::map_info_get)
                .post(participants::map_info_put)
                .put(participants::map_info_put),
        )
        .route("/events", post(events::event_post))
        .route("/events/:id", put(events::event_put).delete(events::event_delete))
        .route_layer(from_fn_with_state(state, require_session))
}

/// Tier 3: moderators and admins
fn elevated_routes(state: AppState) -> Router<AppState> {
    use elevated::{content, hubs, plans, routes, users};

    Router::new()
        .route(
            "/plans",
            post(plans::plan_post).put(plans::plan_put).delete(plans::plan_delete),
        )
        .route("/about/:section", put(content::section_put))
        .route("/hubs", post(hubs::hub_post))
        .route("/hubs/:id", put(hubs::hub_put).delete(hubs::hub_delete))
        .route("/maps/routes", post(routes::route_post))
        .route("/maps/routes/:id", put(routes::route_put).delete(routes::route_delete))
        .route("/deleteUsers", post(users::delete_users))
        .route("/storage/*path", put(content::storage_put))
        .route_layer(from_fn(require_staff))
        .route_layer(from_fn_with_state(state, require_session))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
