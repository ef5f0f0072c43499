mod genre;
mod movie;
mod user;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use genre::{Genre, GenreStore};
pub use movie::{GenreOption, Movie, MovieForEdit, MovieInput, MovieStore};
pub use user::{User, UserStore};

/// Genres present in a fresh catalog.
const SEED_GENRES: &[&str] = &[
    "Comedy",
    "Sci-Fi",
    "Horror",
    "Romance",
    "Action",
    "Thriller",
    "Drama",
    "Mystery",
    "Crime",
    "Animation",
    "Adventure",
    "Fantasy",
    "Superhero",
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        if version < 2 {
            self.migrate_v2().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    password TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE TABLE genres (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    genre TEXT UNIQUE NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE TABLE movies (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    release_date TEXT NOT NULL,
                    runtime INTEGER NOT NULL,
                    mpaa_rating TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    image TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_movies_title ON movies(title)",
                "CREATE TABLE movies_genres (
                    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
                    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
                    PRIMARY KEY (movie_id, genre_id)
                )",
                "CREATE INDEX idx_movies_genres_genre ON movies_genres(genre_id)",
            ],
        )
        .await
    }

    /// Seed the genre list.
    async fn migrate_v2(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for genre in SEED_GENRES {
            sqlx::query("INSERT OR IGNORE INTO genres (genre) VALUES (?)")
                .bind(genre)
                .execute(&mut *tx)
                .await?;
        }
        Self::set_version(&mut tx, 2).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the movie store.
    pub fn movies(&self) -> MovieStore {
        MovieStore::new(self.pool.clone())
    }

    /// Get the genre store.
    pub fn genres(&self) -> GenreStore {
        GenreStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
