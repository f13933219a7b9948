//! Catalog queries: movies and their playback servers

use crate::db::models::{Movie, NewMovie, NewServer, Server};
use crate::{Error, Result};
use sqlx::SqlitePool;

const MOVIE_COLUMNS: &str =
    "id, title, slug, description, release_year, duration_seconds, poster_url";

/// Build a LIKE pattern matching `search` anywhere, with wildcards escaped
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Number of movies whose title matches `search` (all movies when `None`)
pub async fn count_movies(pool: &SqlitePool, search: Option<&str>) -> Result<i64> {
    let count: i64 = match search {
        Some(term) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE title LIKE ? ESCAPE '\\'")
                .bind(like_pattern(term))
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM movies")
                .fetch_one(pool)
                .await?
        }
    };
    Ok(count)
}

/// One page of movies ordered by title
pub async fn list_movies(
    pool: &SqlitePool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Movie>> {
    let movies = match search {
        Some(term) => {
            let sql = format!(
                "SELECT {} FROM movies WHERE title LIKE ? ESCAPE '\\' \
                 ORDER BY title COLLATE NOCASE, id LIMIT ? OFFSET ?",
                MOVIE_COLUMNS
            );
            sqlx::query_as::<_, Movie>(&sql)
                .bind(like_pattern(term))
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM movies ORDER BY title COLLATE NOCASE, id LIMIT ? OFFSET ?",
                MOVIE_COLUMNS
            );
            sqlx::query_as::<_, Movie>(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(movies)
}

pub async fn find_movie_by_slug(pool: &SqlitePool, slug: &str) -> Result<Movie> {
    let sql = format!("SELECT {} FROM movies WHERE slug = ?", MOVIE_COLUMNS);
    sqlx::query_as::<_, Movie>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::MovieNotFound(slug.to_string()))
}

/// Servers for a movie in display order
pub async fn list_servers(pool: &SqlitePool, movie_id: i64) -> Result<Vec<Server>> {
    let servers = sqlx::query_as::<_, Server>(
        r#"
        SELECT id, movie_id, position, name, url, quality, language, video_type
        FROM servers
        WHERE movie_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;
    Ok(servers)
}

pub async fn insert_movie(pool: &SqlitePool, movie: &NewMovie) -> Result<i64> {
    if movie.title.trim().is_empty() {
        return Err(Error::InvalidCatalogEntry("movie title is empty".to_string()));
    }
    if movie.slug.trim().is_empty() {
        return Err(Error::InvalidCatalogEntry("movie slug is empty".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO movies (title, slug, description, release_year, duration_seconds, poster_url)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movie.title)
    .bind(&movie.slug)
    .bind(&movie.description)
    .bind(movie.release_year)
    .bind(movie.duration_seconds)
    .bind(&movie.poster_url)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Append a server at the end of a movie's server list
pub async fn insert_server(pool: &SqlitePool, movie_id: i64, server: &NewServer) -> Result<i64> {
    let next_position: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM servers WHERE movie_id = ?",
    )
    .bind(movie_id)
    .fetch_one(pool)
    .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO servers (movie_id, position, name, url, quality, language, video_type)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(movie_id)
    .bind(next_position)
    .bind(&server.name)
    .bind(&server.url)
    .bind(&server.quality)
    .bind(&server.language)
    .bind(server.video_type)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}
