//! Locker trigger state machine
//!
//! Watches playback progress for one session and decides, on every time
//! update, whether the unlock overlay must appear. It fires at most once per
//! session; only a source change starts a new cycle.
//!
//! ```text
//! Idle --on_play--> Armed --trigger--> Fired --complete--> Completed
//!   \________________ ineligible _______________________> Inert
//! ```

use serde::Serialize;
use tracing::debug;

use super::settings::LockerSettings;
use crate::surface::SurfaceKind;

/// Ticks at or below this time never fire; mount events report t=0
pub const START_GUARD_SECONDS: f64 = 0.1;

/// Observable phase of a session's locker cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockerPhase {
    Idle,
    Armed,
    Fired,
    Completed,
    Inert,
}

/// What the player must do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LockerAction {
    None,
    /// Show the overlay. `pause` is false for embeds, which keep playing.
    ShowOverlay { pause: bool },
    /// Resume the native player
    Resume,
}

/// Ephemeral per-source state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSession {
    pub video_url: String,
    pub duration_seconds: Option<f64>,
    pub has_started_playing: bool,
    pub trigger_fired: bool,
    pub overlay_visible: bool,
}

impl PlaybackSession {
    fn new(video_url: String) -> Self {
        Self {
            video_url,
            duration_seconds: None,
            has_started_playing: false,
            trigger_fired: false,
            overlay_visible: false,
        }
    }
}

/// Usable duration: finite and positive, otherwise unknown
fn sanitize_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

/// Whether the locker may run for this session at all
pub fn is_eligible(settings: &LockerSettings, surface: SurfaceKind, duration: Option<f64>) -> bool {
    if !settings.enabled {
        return false;
    }
    if settings.only_direct_videos && surface.is_embed() {
        return false;
    }
    if settings.skip_if_no_duration {
        match duration {
            None => return false,
            Some(d) if d < settings.min_duration_seconds as f64 => return false,
            Some(_) => {}
        }
    }
    true
}

/// Playback time at which the overlay fires, `None` when it can't be known
pub fn trigger_time(settings: &LockerSettings, duration: Option<f64>) -> Option<f64> {
    if settings.trigger_percentage <= 0.0 {
        return Some(0.0);
    }
    duration.map(|d| d * (settings.trigger_percentage / 100.0))
}

/// Trigger controller for one playback session
#[derive(Debug, Clone)]
pub struct LockerController {
    session: PlaybackSession,
    surface: SurfaceKind,
    token: u64,
    settings: Option<LockerSettings>,
    /// Decided once per session, on the first evaluation with settings bound
    eligible: Option<bool>,
}

impl LockerController {
    pub fn new(video_url: impl Into<String>, surface: SurfaceKind) -> Self {
        Self {
            session: PlaybackSession::new(video_url.into()),
            surface,
            token: 0,
            settings: None,
            eligible: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Generation of the current session; changes on every source switch
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn settings(&self) -> Option<&LockerSettings> {
        self.settings.as_ref()
    }

    pub fn phase(&self) -> LockerPhase {
        if self.session.trigger_fired {
            if self.session.overlay_visible {
                LockerPhase::Fired
            } else {
                LockerPhase::Completed
            }
        } else if self.eligible == Some(false) {
            LockerPhase::Inert
        } else if self.session.has_started_playing {
            LockerPhase::Armed
        } else {
            LockerPhase::Idle
        }
    }

    /// Bind settings resolved for session `token`.
    ///
    /// Resolutions for an earlier session are dropped so a slow fetch can't
    /// affect the source that replaced it. Returns whether they were applied.
    pub fn apply_settings(&mut self, token: u64, settings: LockerSettings) -> bool {
        if token != self.token {
            debug!(
                "Dropping settings for stale session token {} (current {})",
                token, self.token
            );
            return false;
        }
        if self.eligible.is_some() {
            // Eligibility is already frozen for this session
            return false;
        }
        self.settings = Some(settings);
        true
    }

    /// Report the media duration. Non-finite or non-positive means unknown.
    pub fn set_duration(&mut self, duration: Option<f64>) {
        let duration = sanitize_duration(duration);
        if duration.is_some() || self.session.duration_seconds.is_none() {
            self.session.duration_seconds = duration;
        }
    }

    pub fn on_play(&mut self) {
        self.session.has_started_playing = true;
    }

    /// Evaluate a playback time update
    pub fn on_time_update(&mut self, current_time: f64) -> LockerAction {
        if self.session.trigger_fired || !self.session.has_started_playing {
            return LockerAction::None;
        }
        if !current_time.is_finite() || current_time <= START_GUARD_SECONDS {
            return LockerAction::None;
        }

        let Some(settings) = self.settings.as_ref() else {
            return LockerAction::None;
        };

        let duration = self.session.duration_seconds;
        let eligible = *self
            .eligible
            .get_or_insert_with(|| is_eligible(settings, self.surface, duration));
        if !eligible {
            return LockerAction::None;
        }

        let Some(fire_at) = trigger_time(settings, duration) else {
            return LockerAction::None;
        };
        if current_time < fire_at {
            return LockerAction::None;
        }

        self.session.trigger_fired = true;
        self.session.overlay_visible = true;

        let pause = !self.surface.is_embed();
        if !pause {
            debug!(
                "Locker fired on embed surface at {:.1}s; embed playback cannot be paused",
                current_time
            );
        }
        LockerAction::ShowOverlay { pause }
    }

    /// The unlock document reported completion
    pub fn on_overlay_complete(&mut self) -> LockerAction {
        if !self.session.overlay_visible {
            return LockerAction::None;
        }
        self.session.overlay_visible = false;

        if self.surface.is_embed() {
            LockerAction::None
        } else {
            LockerAction::Resume
        }
    }

    /// Switch to a new source. Resets the session when the URL differs.
    pub fn change_source(&mut self, video_url: impl Into<String>, surface: SurfaceKind) -> bool {
        let video_url = video_url.into();
        if video_url == self.session.video_url {
            return false;
        }

        self.session = PlaybackSession::new(video_url);
        self.surface = surface;
        self.token += 1;
        self.settings = None;
        self.eligible = None;
        true
    }
}
