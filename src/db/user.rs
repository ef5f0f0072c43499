use sqlx::sqlite::SqlitePool;

use crate::session::{AuthError, CredentialCheck, Identity, UserLookup};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// bcrypt hash
    pub password: String,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user with an already-hashed password. Returns the user ID.
    pub async fn create(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (email, first_name, last_name, password) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, email, first_name, last_name, password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, email, first_name, last_name, password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Delete a user by ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl CredentialCheck for UserStore {
    async fn credential_check(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let user = self
            .get_by_email(email)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to get user");
                AuthError::Storage
            })?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = password.to_string();
        let hash = user.password.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                AuthError::Storage
            })?
            .unwrap_or(false);

        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user.identity())
    }
}

impl UserLookup for UserStore {
    async fn lookup_user(&self, id: i64) -> Result<Identity, AuthError> {
        self.get_by_id(id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to get user");
                AuthError::Storage
            })?
            .map(|user| user.identity())
            .ok_or(AuthError::UnknownUser)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::session::{AuthError, CredentialCheck, Identity, UserLookup};

    async fn db_with_ada() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let hash = bcrypt::hash("correct horse", 4).unwrap();
        let id = db
            .users()
            .create("ada@example.com", "Ada", "Lovelace", &hash)
            .await
            .unwrap();
        (db, id)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let (db, id) = db_with_ada().await;

        let user = db.users().get_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.first_name, "Ada");

        let user = db.users().get_by_email("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(user.id, id);

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let (db, _) = db_with_ada().await;
        let result = db.users().create("ada@example.com", "A", "L", "x").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_credential_check() {
        let (db, id) = db_with_ada().await;
        let users = db.users();

        let identity = users
            .credential_check("ada@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity {
                id,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            }
        );

        assert_eq!(
            users.credential_check("ada@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            users.credential_check("bob@example.com", "correct horse").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_lookup_user() {
        let (db, id) = db_with_ada().await;

        assert_eq!(db.users().lookup_user(id).await.unwrap().id, id);
        assert_eq!(
            db.users().lookup_user(999).await,
            Err(AuthError::UnknownUser)
        );

        db.users().delete(id).await.unwrap();
        assert_eq!(
            db.users().lookup_user(id).await,
            Err(AuthError::UnknownUser)
        );
    }
}
