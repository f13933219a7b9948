//! Playback surface selection
//!
//! Every source URL maps to exactly one render mode: a native `<video>`
//! element, a YouTube embed, or an external-host iframe embed.

use marquee_common::db::{Server, VideoType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// watch?v=ID (v may follow other params), youtu.be/ID, youtube.com/embed/ID
static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:(?:www|m)\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/)|youtu\.be/)([A-Za-z0-9_-]+)",
    )
    .expect("YouTube pattern is valid")
});

/// Render mode for a source URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Native media element; can be paused and resumed
    Direct,
    /// `youtube.com/embed/{id}` iframe
    Youtube,
    /// Third-party host iframe
    ExternalEmbed,
}

impl SurfaceKind {
    /// Iframe embeds cannot be paused or resumed from the host page
    pub fn is_embed(self) -> bool {
        !matches!(self, SurfaceKind::Direct)
    }
}

/// A classified source ready to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSurface {
    pub kind: SurfaceKind,
    /// URL to put in `src`: normalised for YouTube, unchanged otherwise
    pub src: String,
}

/// Classifies URLs using YouTube patterns and an embed-host allowlist
#[derive(Debug, Clone)]
pub struct SurfaceClassifier {
    embed_hosts: Vec<String>,
}

impl SurfaceClassifier {
    /// `embed_hosts` are matched as case-insensitive substrings of the URL
    pub fn new(embed_hosts: Vec<String>) -> Self {
        let embed_hosts = embed_hosts
            .into_iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        Self { embed_hosts }
    }

    #[cfg(test)]
    fn embed_hosts(&self) -> &[String] {
        &self.embed_hosts
    }

    /// Video ID when `url` is a recognised YouTube link
    pub fn youtube_id<'a>(&self, url: &'a str) -> Option<&'a str> {
        YOUTUBE_URL
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Classify a URL by shape alone
    pub fn classify(&self, url: &str) -> PlaybackSurface {
        let url = url.trim();

        if let Some(id) = self.youtube_id(url) {
            return PlaybackSurface {
                kind: SurfaceKind::Youtube,
                src: format!("https://www.youtube.com/embed/{}", id),
            };
        }

        let lowered = url.to_ascii_lowercase();
        if self.embed_hosts.iter().any(|host| lowered.contains(host.as_str())) {
            return PlaybackSurface {
                kind: SurfaceKind::ExternalEmbed,
                src: url.to_string(),
            };
        }

        PlaybackSurface {
            kind: SurfaceKind::Direct,
            src: url.to_string(),
        }
    }

    /// Classify a server record.
    ///
    /// URL shape wins; an explicit `iframe` type only promotes an otherwise
    /// unrecognised URL to an external embed.
    pub fn classify_server(&self, server: &Server) -> PlaybackSurface {
        let surface = self.classify(&server.url);
        if surface.kind == SurfaceKind::Direct && server.video_type == VideoType::Iframe {
            return PlaybackSurface {
                kind: SurfaceKind::ExternalEmbed,
                src: surface.src,
            };
        }
        surface
    }
}

impl Default for SurfaceClassifier {
    fn default() -> Self {
        Self::new(marquee_common::config::default_embed_hosts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> SurfaceClassifier {
        SurfaceClassifier::default()
    }

    fn server(url: &str, video_type: VideoType) -> Server {
        Server {
            id: 1,
            movie_id: 1,
            position: 0,
            name: "Main".to_string(),
            url: url.to_string(),
            quality: None,
            language: None,
            video_type,
        }
    }

    #[test]
    fn test_youtu_be_normalises_to_embed() {
        let surface = classifier().classify("https://youtu.be/abc123");
        assert_eq!(surface.kind, SurfaceKind::Youtube);
        assert_eq!(surface.src, "https://www.youtube.com/embed/abc123");
        assert!(surface.kind.is_embed());
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        let surface = classifier().classify("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42");
        assert_eq!(surface.kind, SurfaceKind::Youtube);
        assert_eq!(surface.src, "https://www.youtube.com/embed/dQw4w9WgXcQ");
    }

    #[test]
    fn test_embed_url_is_youtube_not_external() {
        let surface = classifier().classify("https://www.youtube.com/embed/xyz_-9?autoplay=1");
        assert_eq!(surface.kind, SurfaceKind::Youtube);
        assert_eq!(surface.src, "https://www.youtube.com/embed/xyz_-9");
    }

    #[test]
    fn test_short_youtu_be_with_query() {
        let surface = classifier().classify("youtu.be/abc123?si=track");
        assert_eq!(surface.src, "https://www.youtube.com/embed/abc123");
    }

    #[test]
    fn test_external_embed_by_substring() {
        let surface = classifier().classify("https://vidhost.example/embed/8812");
        assert_eq!(surface.kind, SurfaceKind::ExternalEmbed);
        assert_eq!(surface.src, "https://vidhost.example/embed/8812");
    }

    #[test]
    fn test_embed_host_match_is_case_insensitive() {
        let c = SurfaceClassifier::new(vec!["StreamBox.TV".to_string()]);
        assert_eq!(
            c.classify("https://streambox.tv/v/991").kind,
            SurfaceKind::ExternalEmbed
        );
    }

    #[test]
    fn test_unmatched_url_is_direct() {
        let surface = classifier().classify("https://cdn.example.com/films/metropolis.mp4");
        assert_eq!(surface.kind, SurfaceKind::Direct);
        assert_eq!(surface.src, "https://cdn.example.com/films/metropolis.mp4");
    }

    #[test]
    fn test_empty_allowlist_entries_are_dropped() {
        let c = SurfaceClassifier::new(vec!["".to_string(), "  ".to_string()]);
        assert!(c.embed_hosts().is_empty());
        assert_eq!(c.classify("https://a.example/x.mp4").kind, SurfaceKind::Direct);
    }

    #[test]
    fn test_lookalike_domain_is_not_youtube() {
        let surface = classifier().classify("https://notyoutube.com/watch?v=abc");
        assert_ne!(surface.kind, SurfaceKind::Youtube);
    }

    #[test]
    fn test_iframe_type_promotes_unmatched_url() {
        let surface = classifier().classify_server(&server("https://host.example/v/1", VideoType::Iframe));
        assert_eq!(surface.kind, SurfaceKind::ExternalEmbed);
    }

    #[test]
    fn test_url_shape_beats_declared_type() {
        let surface = classifier().classify_server(&server("https://youtu.be/abc123", VideoType::Mp4));
        assert_eq!(surface.kind, SurfaceKind::Youtube);

        let surface = classifier().classify_server(&server("https://cdn.example/a.mp4", VideoType::Youtube));
        assert_eq!(surface.kind, SurfaceKind::Direct);
    }
}
