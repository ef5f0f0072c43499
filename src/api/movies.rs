//! Movie catalog endpoints.
//!
//! Public:
//! - GET `/movies` - All movies ordered by title
//! - GET `/movies/{id}` - One movie with its genres
//! - GET `/movies/genres/{id}` - Movies in a genre
//! - GET `/genres` - All genres
//!
//! Admin (bearer access token required):
//! - GET `/admin/movies` - All movies
//! - GET `/admin/movies/{id}` - Movie plus every genre with a `checked` flag
//! - PUT `/admin/movies` - Insert a movie
//! - PATCH `/admin/movies/{id}` - Update a movie
//! - DELETE `/admin/movies/{id}` - Delete a movie

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use std::sync::Arc;
use time::{Date, macros::format_description};

use super::error::{ApiError, JsonMessage, ResultExt};
use crate::db::{Database, Genre, Movie, MovieForEdit, MovieInput};
use crate::impl_has_session_config;
use crate::session::{SessionConfig, SessionUser};

#[derive(Clone)]
pub struct CatalogState {
    pub db: Database,
    pub session: Arc<SessionConfig>,
}

impl_has_session_config!(CatalogState);

pub fn router(state: CatalogState) -> Router {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
        .route("/movies/genres/{id}", get(list_movies_by_genre))
        .route("/genres", get(list_genres))
        .with_state(state)
}

pub fn admin_router(state: CatalogState) -> Router {
    Router::new()
        .route("/movies", get(admin_list_movies).put(insert_movie))
        .route(
            "/movies/{id}",
            get(edit_movie).patch(update_movie).delete(delete_movie),
        )
        .with_state(state)
}

async fn list_movies(State(state): State<CatalogState>) -> Result<Json<Vec<Movie>>, ApiError> {
    let movies = state.db.movies().all(None).await.db_err("Failed to list movies")?;
    Ok(Json(movies))
}

async fn get_movie(
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<Movie>, ApiError> {
    state
        .db
        .movies()
        .get_by_id(id)
        .await
        .db_err("Failed to get movie")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("movie not found"))
}

async fn list_movies_by_genre(
    State(state): State<CatalogState>,
    Path(genre_id): Path<i64>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    state
        .db
        .genres()
        .get_by_id(genre_id)
        .await
        .db_err("Failed to get genre")?
        .ok_or_else(|| ApiError::not_found("genre not found"))?;

    let movies = state
        .db
        .movies()
        .all(Some(genre_id))
        .await
        .db_err("Failed to list movies")?;
    Ok(Json(movies))
}

async fn list_genres(State(state): State<CatalogState>) -> Result<Json<Vec<Genre>>, ApiError> {
    let genres = state.db.genres().all().await.db_err("Failed to list genres")?;
    Ok(Json(genres))
}

async fn admin_list_movies(
    _user: SessionUser,
    state: State<CatalogState>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    list_movies(state).await
}

async fn edit_movie(
    _user: SessionUser,
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<MovieForEdit>, ApiError> {
    state
        .db
        .movies()
        .get_for_edit(id)
        .await
        .db_err("Failed to get movie")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("movie not found"))
}

async fn insert_movie(
    SessionUser(user): SessionUser,
    State(state): State<CatalogState>,
    Json(input): Json<MovieInput>,
) -> Result<Json<JsonMessage>, ApiError> {
    validate_movie(&state.db, &input).await?;

    let id = state
        .db
        .movies()
        .insert(&input)
        .await
        .db_err("Failed to insert movie")?;

    tracing::info!(movie_id = id, user_id = user.id, "Movie inserted");
    Ok(Json(JsonMessage::ok("movie added")))
}

async fn update_movie(
    SessionUser(user): SessionUser,
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
    Json(input): Json<MovieInput>,
) -> Result<Json<JsonMessage>, ApiError> {
    validate_movie(&state.db, &input).await?;

    let updated = state
        .db
        .movies()
        .update(id, &input)
        .await
        .db_err("Failed to update movie")?;
    if !updated {
        return Err(ApiError::not_found("movie not found"));
    }

    tracing::info!(movie_id = id, user_id = user.id, "Movie updated");
    Ok(Json(JsonMessage::ok("movie updated")))
}

async fn delete_movie(
    SessionUser(user): SessionUser,
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<JsonMessage>, ApiError> {
    let deleted = state
        .db
        .movies()
        .delete(id)
        .await
        .db_err("Failed to delete movie")?;
    if !deleted {
        return Err(ApiError::not_found("movie not found"));
    }

    tracing::info!(movie_id = id, user_id = user.id, "Movie deleted");
    Ok(Json(JsonMessage::ok("movie deleted")))
}

async fn validate_movie(db: &Database, input: &MovieInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    if Date::parse(&input.release_date, format_description!("[year]-[month]-[day]")).is_err() {
        return Err(ApiError::bad_request("release date must be YYYY-MM-DD"));
    }
    if input.runtime <= 0 {
        return Err(ApiError::bad_request("runtime must be positive"));
    }

    let genres = db.genres();
    for genre_id in &input.genres_array {
        genres
            .get_by_id(*genre_id)
            .await
            .db_err("Failed to get genre")?
            .ok_or_else(|| ApiError::bad_request(format!("unknown genre {}", genre_id)))?;
    }
    Ok(())
}
