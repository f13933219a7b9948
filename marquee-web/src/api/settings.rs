//! Locker settings read/write endpoints

use axum::{extract::State, Json};
use tracing::info;

use super::error::{ApiError, ApiResult};
use crate::locker::{LockerSettings, LockerSettingsUpdate};
use crate::AppState;

/// GET /api/settings/locker
///
/// Effective settings, as the cache currently serves them
pub async fn get_locker_settings(State(state): State<AppState>) -> Json<LockerSettings> {
    Json(state.locker_settings.get().await)
}

/// PUT /api/settings/locker
///
/// Writes the fields present in one transaction and invalidates the cache,
/// whether or not the write succeeded. Sessions that have already bound
/// settings keep them; new sessions see the update.
pub async fn update_locker_settings(
    State(state): State<AppState>,
    Json(update): Json<LockerSettingsUpdate>,
) -> ApiResult<Json<LockerSettings>> {
    let pairs = update.to_pairs().map_err(ApiError::BadRequest)?;
    if pairs.is_empty() {
        return Err(ApiError::BadRequest("no settings supplied".to_string()));
    }

    let written = state.settings_store.set_many(&pairs).await;
    state.locker_settings.invalidate().await;
    written?;

    let keys: Vec<&str> = pairs.iter().map(|(key, _)| *key).collect();
    info!("Locker settings updated: {}", keys.join(", "));

    Ok(Json(state.locker_settings.get().await))
}
