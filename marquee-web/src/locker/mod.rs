//! Content locker: trigger controller, settings, and settings cache

pub mod cache;
pub mod controller;
pub mod settings;

pub use cache::SettingsCache;
pub use controller::{LockerAction, LockerController, LockerPhase, PlaybackSession};
pub use settings::{LockerSettings, LockerSettingsUpdate};
