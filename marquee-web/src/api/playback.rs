//! Playback session endpoints
//!
//! The player script posts every playback event here and applies the
//! returned action. Settings bind to a session by token: the token is read
//! before the cache is awaited, and a source switch in between makes the
//! resolved settings stale so they are dropped.

use axum::{
    extract::{Path, State},
    Json,
};
use marquee_common::db::list_servers;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use crate::locker::{LockerAction, LockerPhase, LockerSettings};
use crate::overlay::render_overlay;
use crate::session::SharedEntry;
use crate::surface::PlaybackSurface;
use crate::AppState;

/// Action for the player plus the session's resulting phase
#[derive(Debug, Serialize)]
pub struct PlaybackResponse {
    #[serde(flatten)]
    pub action: LockerAction,
    pub phase: LockerPhase,
}

#[derive(Debug, Deserialize)]
pub struct TickRequest {
    /// `null` (a NaN on the client) is ignored
    pub current_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SourceRequest {
    pub server: usize,
}

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    /// False when the selected server has the current URL
    pub changed: bool,
    pub server: usize,
    pub surface: PlaybackSurface,
    /// Markup for the new playback surface
    pub player: String,
    /// Overlay markup for the new settings, absent when the locker is off
    pub overlay: Option<String>,
    pub phase: LockerPhase,
}

async fn find_session(state: &AppState, id: &Uuid) -> ApiResult<SharedEntry> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("playback session {}", id)))
}

/// Resolve settings and bind them to the session generation that was current
/// when resolution started
pub(crate) async fn bind_settings(state: &AppState, entry: &SharedEntry) -> LockerSettings {
    let token = entry.lock().await.controller.token();
    let settings = state.locker_settings.get().await;

    let mut guard = entry.lock().await;
    if !guard.controller.apply_settings(token, settings.clone()) {
        debug!("Settings for session token {} not applied", token);
    }
    settings
}

/// POST /api/playback/:session_id/play
pub async fn play(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<PlaybackResponse>> {
    let entry = find_session(&state, &session_id).await?;
    let mut guard = entry.lock().await;
    guard.controller.on_play();

    Ok(Json(PlaybackResponse {
        action: LockerAction::None,
        phase: guard.controller.phase(),
    }))
}

/// POST /api/playback/:session_id/tick
pub async fn tick(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<TickRequest>,
) -> ApiResult<Json<PlaybackResponse>> {
    let entry = find_session(&state, &session_id).await?;

    let unbound = entry.lock().await.controller.settings().is_none();
    if unbound {
        bind_settings(&state, &entry).await;
    }

    let mut guard = entry.lock().await;
    if request.duration.is_some() {
        guard.controller.set_duration(request.duration);
    }

    let action = match request.current_time {
        Some(t) => guard.controller.on_time_update(t),
        None => LockerAction::None,
    };
    if let LockerAction::ShowOverlay { pause } = action {
        info!(
            "Locker fired for session {} (movie {}, pause {})",
            session_id, guard.movie_id, pause
        );
    }

    Ok(Json(PlaybackResponse {
        action,
        phase: guard.controller.phase(),
    }))
}

/// POST /api/playback/:session_id/complete
pub async fn complete(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<PlaybackResponse>> {
    let entry = find_session(&state, &session_id).await?;
    let mut guard = entry.lock().await;
    let action = guard.controller.on_overlay_complete();
    if guard.controller.phase() == LockerPhase::Completed {
        debug!("Unlock completed for session {}", session_id);
    }

    Ok(Json(PlaybackResponse {
        action,
        phase: guard.controller.phase(),
    }))
}

/// POST /api/playback/:session_id/source
pub async fn switch_source(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SourceRequest>,
) -> ApiResult<Json<SourceResponse>> {
    let entry = find_session(&state, &session_id).await?;
    let movie_id = entry.lock().await.movie_id;

    let servers = list_servers(&state.db, movie_id).await?;
    let server = servers.get(request.server).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "server {} out of range ({} available)",
            request.server,
            servers.len()
        ))
    })?;
    let surface = state.surfaces.classify_server(server);

    let changed = {
        let mut guard = entry.lock().await;
        let changed = guard.controller.change_source(&server.url, surface.kind);
        if changed {
            let hint = guard.duration_hint;
            guard.controller.set_duration(hint);
            guard.surface = surface.clone();
            guard.server_index = request.server;
        }
        changed
    };

    let settings = if changed {
        info!(
            "Session {} switched to server {} ({:?})",
            session_id, request.server, surface.kind
        );
        bind_settings(&state, &entry).await
    } else {
        state.locker_settings.get().await
    };

    let guard = entry.lock().await;
    Ok(Json(SourceResponse {
        changed,
        server: guard.server_index,
        player: super::detail::render_surface(&guard.surface),
        surface: guard.surface.clone(),
        overlay: settings.enabled.then(|| render_overlay(&settings)),
        phase: guard.controller.phase(),
    }))
}
