//! Database models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// How a server's URL is meant to be played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum VideoType {
    Mp4,
    Iframe,
    Youtube,
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoType::Mp4 => write!(f, "mp4"),
            VideoType::Iframe => write!(f, "iframe"),
            VideoType::Youtube => write!(f, "youtube"),
        }
    }
}

impl FromStr for VideoType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(VideoType::Mp4),
            "iframe" => Ok(VideoType::Iframe),
            "youtube" => Ok(VideoType::Youtube),
            other => Err(crate::Error::InvalidCatalogEntry(format!("unknown video type {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub release_year: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub poster_url: Option<String>,
}

/// A playback source for a movie. Position orders the server list.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Server {
    pub id: i64,
    pub movie_id: i64,
    pub position: i64,
    pub name: String,
    pub url: String,
    pub quality: Option<String>,
    pub language: Option<String>,
    pub video_type: VideoType,
}

/// Fields needed to insert a movie
#[derive(Debug, Clone, Default)]
pub struct NewMovie {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub release_year: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub poster_url: Option<String>,
}

/// Fields needed to insert a server
#[derive(Debug, Clone)]
pub struct NewServer {
    pub name: String,
    pub url: String,
    pub quality: Option<String>,
    pub language: Option<String>,
    pub video_type: VideoType,
}
