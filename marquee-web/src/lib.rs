//! marquee-web library - catalog pages, player, and content locker
//!
//! The detail page mounts a player per selected server and registers a
//! playback session. The browser player script reports playback events to
//! the session endpoints; the locker controller answers with the action the
//! player must take.

use axum::Router;
use marquee_common::config::ServerConfig;
use marquee_common::db::{SettingsStore, SqliteSettingsStore};
use marquee_common::Clock;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod locker;
pub mod overlay;
pub mod pagination;
pub mod session;
pub mod surface;

use locker::SettingsCache;
use session::SessionRegistry;
use surface::SurfaceClassifier;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub settings_store: Arc<dyn SettingsStore>,
    pub locker_settings: Arc<SettingsCache>,
    pub sessions: Arc<SessionRegistry>,
    pub surfaces: Arc<SurfaceClassifier>,
    /// Bearer token for settings writes; `None` disables the check
    pub admin_token: Option<String>,
}

impl AppState {
    /// Create application state backed by `db`
    pub fn new(db: SqlitePool, config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let settings_store: Arc<dyn SettingsStore> = Arc::new(SqliteSettingsStore::new(db.clone()));
        let ttl = chrono::Duration::seconds(config.settings_cache_ttl_secs as i64);
        let idle_timeout = chrono::Duration::seconds(config.session_idle_timeout_secs as i64);

        Self {
            db,
            locker_settings: Arc::new(SettingsCache::new(
                settings_store.clone(),
                clock.clone(),
                ttl,
            )),
            settings_store,
            sessions: Arc::new(SessionRegistry::new(clock, idle_timeout, config.max_sessions)),
            surfaces: Arc::new(SurfaceClassifier::new(config.embed_hosts.clone())),
            admin_token: config.admin_token.clone(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    // Settings writes require the admin token when one is configured
    let admin = Router::new()
        .route("/api/settings/locker", put(api::update_locker_settings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_admin,
        ));

    let public = Router::new()
        .route("/", get(api::catalog_index))
        .route("/movies/:slug", get(api::movie_detail))
        .route("/api/settings/locker", get(api::get_locker_settings))
        .route("/api/playback/:session_id/play", post(api::play))
        .route("/api/playback/:session_id/tick", post(api::tick))
        .route("/api/playback/:session_id/complete", post(api::complete))
        .route("/api/playback/:session_id/source", post(api::switch_source))
        .route("/static/player.js", get(api::serve_player_js))
        .merge(api::health_routes());

    Router::new()
        .merge(admin)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
