//! Catalog index page

use axum::{
    extract::{Query, State},
    response::Html,
};
use marquee_common::db::{count_movies, list_movies, Movie};
use serde::Deserialize;
use tracing::debug;

use super::error::PageError;
use super::ui::{render_template, INDEX_HTML};
use crate::overlay::escape_html;
use crate::pagination::{calculate_pagination, Pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
}

fn movie_card(movie: &Movie) -> String {
    let year = movie
        .release_year
        .map(|y| format!(" <span class=\"year\">({})</span>", y))
        .unwrap_or_default();
    let poster = movie
        .poster_url
        .as_deref()
        .map(|url| format!("<img src=\"{}\" alt=\"\" loading=\"lazy\">", escape_html(url)))
        .unwrap_or_default();

    format!(
        "<li class=\"movie\"><a href=\"/movies/{slug}\">{poster}<span class=\"title\">{title}</span>{year}</a></li>",
        slug = escape_html(&movie.slug),
        poster = poster,
        title = escape_html(&movie.title),
        year = year,
    )
}

/// Query string for a page link, keeping the search term
fn page_href(search: Option<&str>, page: i64) -> String {
    match search {
        Some(term) => format!("/?q={}&page={}", urlencoding::encode(term), page),
        None => format!("/?page={}", page),
    }
}

fn pager(search: Option<&str>, pagination: &Pagination) -> String {
    if pagination.total_pages <= 1 {
        return String::new();
    }

    let mut html = String::from("<nav class=\"pager\">");
    if pagination.has_previous() {
        html.push_str(&format!(
            "<a rel=\"prev\" href=\"{}\">Previous</a>",
            escape_html(&page_href(search, pagination.page - 1))
        ));
    }
    html.push_str(&format!(
        "<span>Page {} of {}</span>",
        pagination.page, pagination.total_pages
    ));
    if pagination.has_next() {
        html.push_str(&format!(
            "<a rel=\"next\" href=\"{}\">Next</a>",
            escape_html(&page_href(search, pagination.page + 1))
        ));
    }
    html.push_str("</nav>");
    html
}

/// GET /?q=term&page=N
pub async fn catalog_index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, PageError> {
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty());

    let total = count_movies(&state.db, search).await?;
    let pagination = calculate_pagination(total, query.page.unwrap_or(1));
    let movies = list_movies(&state.db, search, PAGE_SIZE, pagination.offset).await?;
    debug!(
        "Catalog page {} of {} ({} movies, search {:?})",
        pagination.page, pagination.total_pages, total, search
    );

    let items = if movies.is_empty() {
        "<li class=\"empty\">No movies found.</li>".to_string()
    } else {
        movies.iter().map(movie_card).collect::<Vec<_>>().join("\n")
    };

    let search_value = escape_html(search.unwrap_or(""));
    let total_text = total.to_string();
    let pager_html = pager(search, &pagination);

    Ok(Html(render_template(
        INDEX_HTML,
        &[
            ("SEARCH", &search_value),
            ("TOTAL", &total_text),
            ("MOVIES", &items),
            ("PAGER", &pager_html),
        ],
    )))
}
