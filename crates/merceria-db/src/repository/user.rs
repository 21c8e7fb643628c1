//! # User Repository (Account Store)
//!
//! Staff accounts. The coordinator only asks one question here: does this
//! cashier exist and are they still allowed to sell?

use chrono::Utc;
use merceria_core::validation::{validate_full_name, validate_username};
use merceria_core::{User, UserRole};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, ServiceResult};

/// Fields needed to create an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, is_active, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Returns the user only if the account is active.
    pub async fn get_active(&self, id: i64) -> DbResult<Option<User>> {
        Ok(self.get_by_id(id).await?.filter(|u| u.is_active))
    }

    /// Lists all accounts, admins first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, full_name, role, is_active, created_at
            FROM users
            ORDER BY role, username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn insert(&self, user: &NewUser) -> ServiceResult<User> {
        validate_username(&user.username)?;
        validate_full_name(&user.full_name)?;

        let username = user.username.trim();
        debug!(username = %username, role = ?user.role, "Creating user");

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, full_name, role, is_active, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            RETURNING id, username, full_name, role, is_active, created_at
            "#,
        )
        .bind(username)
        .bind(user.full_name.trim())
        .bind(user.role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        Ok(created)
    }

    /// Activates or deactivates an account. Past sales keep their cashier.
    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
