//! HTTP handlers for marquee-web

pub mod auth;
pub mod catalog;
pub mod detail;
pub mod error;
pub mod health;
pub mod playback;
pub mod settings;
pub mod ui;

pub use auth::require_admin;
pub use catalog::catalog_index;
pub use detail::movie_detail;
pub use error::{ApiError, ApiResult, PageError};
pub use health::health_routes;
pub use playback::{complete, play, switch_source, tick};
pub use settings::{get_locker_settings, update_locker_settings};
pub use ui::serve_player_js;
