use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub genre: String,
}

#[derive(Clone)]
pub struct GenreStore {
    pool: SqlitePool,
}

impl GenreStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All genres ordered by name.
    pub async fn all(&self) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as("SELECT id, genre FROM genres ORDER BY genre")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Genre>, sqlx::Error> {
        sqlx::query_as("SELECT id, genre FROM genres WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Genres linked to a movie, ordered by name.
    pub async fn for_movie(&self, movie_id: i64) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as(
            "SELECT g.id, g.genre FROM movies_genres mg
             JOIN genres g ON g.id = mg.genre_id
             WHERE mg.movie_id = ?
             ORDER BY g.genre",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await
    }
}
