use std::time::Duration;

use log::{debug, info};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::PgConfig;
use crate::db::models::{NewUser, User, UserLookup};
use crate::db::{ProfileStore, parse_sql_statements};
use crate::error::{GymError, Result};

pub(crate) const USERS_SCHEMA: &str = include_str!("../../sql/users.sql");

/// PostgreSQL-backed profile store. Connections are checked out of the pool for
/// a single operation and handed back as soon as it completes.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Builds the pool without connecting; an unreachable server surfaces on
    /// the first operation.
    pub fn connect_lazy(config: &PgConfig) -> Self {
        debug!(
            "PgProfileStore::connect_lazy host={} port={} db={}",
            config.host, config.port, config.database
        );
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy_with(config.connect_options());
        Self { pool }
    }

    /// Creates the `users` table and its username index if they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in parse_sql_statements(USERS_SCHEMA) {
            debug!("ensure_schema executing: {}", statement);
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(GymError::profiles("creating the users schema"))?;
        }
        Ok(())
    }

    /// Empties the table and restarts id generation.
    pub async fn reset(&self) -> Result<()> {
        sqlx::query("TRUNCATE TABLE users RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await
            .map_err(GymError::profiles("truncating users"))?;
        info!("users table truncated");
        Ok(())
    }

    pub async fn insert_user(&self, user: &NewUser) -> Result<i32> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (username, full_name, country) VALUES ($1, $2, $3) RETURNING user_id",
        )
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.country)
        .fetch_one(&self.pool)
        .await
        .map_err(GymError::profiles("inserting a user"))
    }
}

impl ProfileStore for PgProfileStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, username, full_name, country, created_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(GymError::profiles("listing users"))
    }

    async fn get_user(&self, user_id: i32) -> Result<UserLookup> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, username, full_name, country, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map(UserLookup::from)
        .map_err(GymError::profiles("looking up a user"))
    }

    async fn update_country(&self, user_id: i32, country: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET country = $1 WHERE user_id = $2")
            .bind(country)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(GymError::profiles("updating a country"))?;

        if result.rows_affected() == 0 {
            return Err(GymError::UnknownUser(user_id));
        }
        info!("user {} country set to {}", user_id, country);
        Ok(())
    }
}
