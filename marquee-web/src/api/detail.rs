//! Movie detail page: server picker, playback surface, and locker overlay

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use marquee_common::db::{find_movie_by_slug, list_servers, Movie, Server};
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::PageError;
use super::playback::bind_settings;
use super::ui::{render_template, DETAIL_HTML};
use crate::overlay::{escape_html, render_overlay};
use crate::surface::{PlaybackSurface, SurfaceKind};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    /// Index into the movie's servers, in display order
    pub server: Option<usize>,
}

/// Markup for a playback surface: a native player or an iframe embed, never both
pub fn render_surface(surface: &PlaybackSurface) -> String {
    let src = escape_html(&surface.src);
    match surface.kind {
        SurfaceKind::Direct => format!(
            r#"<video id="player" class="player" data-surface="direct" src="{}" controls playsinline preload="metadata"></video>"#,
            src
        ),
        SurfaceKind::Youtube | SurfaceKind::ExternalEmbed => format!(
            r#"<iframe id="player" class="player" data-surface="{}" src="{}" allow="autoplay; fullscreen; encrypted-media; picture-in-picture" allowfullscreen referrerpolicy="origin"></iframe>"#,
            surface_name(surface.kind),
            src
        ),
    }
}

fn surface_name(kind: SurfaceKind) -> &'static str {
    match kind {
        SurfaceKind::Direct => "direct",
        SurfaceKind::Youtube => "youtube",
        SurfaceKind::ExternalEmbed => "external_embed",
    }
}

fn server_label(server: &Server) -> String {
    let mut label = escape_html(&server.name);
    for extra in [&server.quality, &server.language].into_iter().flatten() {
        label.push_str(" &middot; ");
        label.push_str(&escape_html(extra));
    }
    label
}

fn server_list(servers: &[Server], selected: usize) -> String {
    let items: Vec<String> = servers
        .iter()
        .enumerate()
        .map(|(i, server)| {
            let class = if i == selected { " class=\"active\"" } else { "" };
            format!(
                "<li><a href=\"?server={i}\" data-server=\"{i}\"{class}>{label}</a></li>",
                i = i,
                class = class,
                label = server_label(server),
            )
        })
        .collect();
    format!("<ul class=\"servers\">{}</ul>", items.join(""))
}

fn movie_meta(movie: &Movie) -> String {
    let mut parts = Vec::new();
    if let Some(year) = movie.release_year {
        parts.push(year.to_string());
    }
    if let Some(seconds) = movie.duration_seconds.filter(|d| d.is_finite() && *d > 0.0) {
        parts.push(format!("{} min", (seconds / 60.0).round() as i64));
    }
    parts.join(" &middot; ")
}

/// GET /movies/:slug?server=N
pub async fn movie_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<Html<String>, PageError> {
    let movie = find_movie_by_slug(&state.db, &slug).await?;
    let servers = list_servers(&state.db, movie.id).await?;

    let title = escape_html(&movie.title);
    let description = escape_html(movie.description.as_deref().unwrap_or(""));
    let meta = movie_meta(&movie);

    if servers.is_empty() {
        debug!("Movie {} has no servers", movie.slug);
        return Ok(Html(render_template(
            DETAIL_HTML,
            &[
                ("TITLE", &title),
                ("META", &meta),
                ("DESCRIPTION", &description),
                ("SERVERS", ""),
                ("PLAYER", "<p class=\"no-sources\">No sources available.</p>"),
                ("OVERLAY", ""),
                ("SESSION", ""),
            ],
        )));
    }

    let selected = match query.server {
        Some(i) if i < servers.len() => i,
        Some(i) => {
            warn!("Server {} out of range for {}, using first", i, movie.slug);
            0
        }
        None => 0,
    };
    let server = &servers[selected];
    let surface = state.surfaces.classify_server(server);

    let session_id = state
        .sessions
        .create(movie.id, selected, &server.url, surface.clone(), movie.duration_seconds)
        .await;

    let overlay = match state.sessions.get(&session_id).await {
        Some(entry) => {
            let settings = bind_settings(&state, &entry).await;
            if settings.enabled {
                render_overlay(&settings)
            } else {
                String::new()
            }
        }
        None => String::new(),
    };

    let session = session_id.to_string();
    let player = render_surface(&surface);
    let server_html = server_list(&servers, selected);

    Ok(Html(render_template(
        DETAIL_HTML,
        &[
            ("TITLE", &title),
            ("META", &meta),
            ("DESCRIPTION", &description),
            ("SERVERS", &server_html),
            ("PLAYER", &player),
            ("OVERLAY", &overlay),
            ("SESSION", &session),
        ],
    )))
}
