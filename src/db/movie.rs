//! Movie catalog storage.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

use super::genre::{Genre, GenreStore};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// `YYYY-MM-DD`
    pub release_date: String,
    /// Minutes
    pub runtime: i64,
    pub mpaa_rating: String,
    pub description: String,
    pub image: String,
    pub created_at: String,
    pub updated_at: String,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<Genre>,
}

/// Fields accepted when inserting or updating a movie.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieInput {
    pub title: String,
    pub release_date: String,
    pub runtime: i64,
    pub mpaa_rating: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genres_array: Vec<i64>,
}

/// A genre with a flag telling whether the movie being edited carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreOption {
    pub id: i64,
    pub genre: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieForEdit {
    pub movie: Movie,
    pub genres: Vec<GenreOption>,
}

#[derive(Clone)]
pub struct MovieStore {
    pool: SqlitePool,
}

impl MovieStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn genres(&self) -> GenreStore {
        GenreStore::new(self.pool.clone())
    }

    /// All movies ordered by title, optionally restricted to one genre.
    pub async fn all(&self, genre_id: Option<i64>) -> Result<Vec<Movie>, sqlx::Error> {
        match genre_id {
            None => {
                sqlx::query_as(
                    "SELECT id, title, release_date, runtime, mpaa_rating, description, image, created_at, updated_at
                     FROM movies ORDER BY title",
                )
                .fetch_all(&self.pool)
                .await
            }
            Some(genre_id) => {
                sqlx::query_as(
                    "SELECT m.id, m.title, m.release_date, m.runtime, m.mpaa_rating, m.description, m.image, m.created_at, m.updated_at
                     FROM movies m
                     JOIN movies_genres mg ON mg.movie_id = m.id
                     WHERE mg.genre_id = ?
                     ORDER BY m.title",
                )
                .bind(genre_id)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    /// A movie with its genres.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Movie>, sqlx::Error> {
        let movie: Option<Movie> = sqlx::query_as(
            "SELECT id, title, release_date, runtime, mpaa_rating, description, image, created_at, updated_at
             FROM movies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut movie) = movie else {
            return Ok(None);
        };
        movie.genres = self.genres().for_movie(id).await?;
        Ok(Some(movie))
    }

    /// A movie plus every genre, flagged with whether the movie has it.
    pub async fn get_for_edit(&self, id: i64) -> Result<Option<MovieForEdit>, sqlx::Error> {
        let Some(movie) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let genres = self
            .genres()
            .all()
            .await?
            .into_iter()
            .map(|g| GenreOption {
                checked: movie.genres.iter().any(|mg| mg.id == g.id),
                id: g.id,
                genre: g.genre,
            })
            .collect();

        Ok(Some(MovieForEdit { movie, genres }))
    }

    /// Insert a movie and link its genres. Returns the new movie ID.
    pub async fn insert(&self, input: &MovieInput) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO movies (title, release_date, runtime, mpaa_rating, description, image)
             VALUES (?, ?, ?, ?, ?, '')",
        )
        .bind(&input.title)
        .bind(&input.release_date)
        .bind(input.runtime)
        .bind(&input.mpaa_rating)
        .bind(&input.description)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        Self::link_genres(&mut tx, id, &input.genres_array).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Update a movie and replace its genre links. Returns false if no such movie.
    pub async fn update(&self, id: i64, input: &MovieInput) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE movies
             SET title = ?, release_date = ?, runtime = ?, mpaa_rating = ?, description = ?,
                 updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(&input.title)
        .bind(&input.release_date)
        .bind(input.runtime)
        .bind(&input.mpaa_rating)
        .bind(&input.description)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM movies_genres WHERE movie_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::link_genres(&mut tx, id, &input.genres_array).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Delete a movie (genre links cascade).
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_genres(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        movie_id: i64,
        genre_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        for genre_id in genre_ids {
            sqlx::query("INSERT OR IGNORE INTO movies_genres (movie_id, genre_id) VALUES (?, ?)")
                .bind(movie_id)
                .bind(genre_id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}
