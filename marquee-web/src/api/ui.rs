//! HTML templates and static assets
//!
//! Templates are embedded at compile time and filled with `{{KEY}}`
//! placeholders.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const PLAYER_JS: &str = include_str!("../ui/player.js");
pub const INDEX_HTML: &str = include_str!("../ui/index.html");
pub const DETAIL_HTML: &str = include_str!("../ui/detail.html");

/// Replace `{{KEY}}` placeholders in one pass.
///
/// Substituted values are never rescanned, so a value containing `{{...}}`
/// stays literal. Unknown placeholders are left as-is.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// GET /static/player.js
///
/// Browser glue between the playback surface and the session endpoints
pub async fn serve_player_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        PLAYER_JS,
    )
        .into_response()
}
