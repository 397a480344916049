//! Data access for the two stores.
//!
//! User profiles live in PostgreSQL, workout logs live in MongoDB. Callers talk
//! to both through [`ProfileStore`] and [`WorkoutStore`], so the leaderboard
//! join and the workout builder never see a driver type. The in-memory
//! implementations in [`memory`] follow the same contract and back the tests.

pub mod memory;
pub mod models;
pub mod mongo;
pub mod postgres;

use bson::oid::ObjectId;

use crate::db::models::{HeavySet, User, UserLookup, VolumeTotal, Workout, WorkoutLabel};
use crate::error::{GymError, Result};

pub use memory::{MemoryProfileStore, MemoryWorkoutStore};
pub use mongo::MongoWorkoutStore;
pub use postgres::PgProfileStore;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Relational store of record for user identity and profile fields.
#[allow(async_fn_in_trait)]
pub trait ProfileStore {
    /// All users, ordered by username ascending.
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn get_user(&self, user_id: i32) -> Result<UserLookup>;

    /// Updates `country` on exactly one row. An id with no row is
    /// [`GymError::UnknownUser`].
    async fn update_country(&self, user_id: i32, country: &str) -> Result<()>;
}

/// Document store of record for workout sessions.
#[allow(async_fn_in_trait)]
pub trait WorkoutStore {
    /// Persists a fully formed workout and returns the id the store assigned.
    async fn insert(&self, workout: &Workout) -> Result<ObjectId>;

    async fn get(&self, id: ObjectId) -> Result<Option<Workout>>;

    /// Removes at most one workout. Returns whether anything was removed;
    /// an unknown id is not an error.
    async fn delete(&self, id: ObjectId) -> Result<bool>;

    /// Newest first, at most `limit` entries.
    async fn find_recent(&self, user_id: i32, limit: usize) -> Result<Vec<Workout>>;

    /// Every workout of the user, newest first, reduced to id/date/gym.
    async fn list_labels(&self, user_id: i32) -> Result<Vec<WorkoutLabel>>;

    /// Workouts holding an exercise named exactly `exercise` with
    /// `weight_kg >= min_weight`. Only the first qualifying entry of each
    /// workout is returned.
    async fn find_by_exercise_threshold(
        &self,
        user_id: i32,
        exercise: &str,
        min_weight: f64,
    ) -> Result<Vec<HeavySet>>;

    /// Case-insensitive substring match on `gym_name` or `notes`.
    async fn search_text(&self, user_id: i32, term: &str) -> Result<Vec<Workout>>;

    /// Per-user volume and session count, highest volume first. Equal volumes
    /// are ordered by ascending user id.
    async fn top_by_volume(&self, limit: usize) -> Result<Vec<VolumeTotal>>;
}

/// Parses a workout id as handed out to callers (24 hex characters).
pub fn parse_workout_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw.trim())
        .map_err(|e| GymError::validation(format!("'{}' is not a workout id: {}", raw, e)))
}

fn strip_sql_comment(line: &str) -> &str {
    line.split_once("--").map_or(line, |(code, _)| code).trim()
}

/// Splits a schema file into statements. `--` comments are dropped whether
/// they fill a line or trail one; string literals must not contain `--`.
pub(crate) fn parse_sql_statements(sql: &str) -> Vec<String> {
    let code: Vec<&str> = sql
        .lines()
        .map(strip_sql_comment)
        .filter(|line| !line.is_empty())
        .collect();

    code.join("\n")
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_statements() {
        let statements = parse_sql_statements(postgres::USERS_SCHEMA);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS users"));
        assert!(statements[1].contains("idx_users_username"));
    }

    #[test]
    fn comments_and_blank_lines_are_dropped() {
        let sql = "-- header\n\nSELECT 1;\n  -- inline\nSELECT 2;\n";
        assert_eq!(parse_sql_statements(sql), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn trailing_comments_are_dropped() {
        let sql = "CREATE TABLE t (\n  id INT -- key\n); -- done\nDROP TABLE t;";
        assert_eq!(
            parse_sql_statements(sql),
            vec!["CREATE TABLE t (\nid INT\n)", "DROP TABLE t"]
        );
    }

    #[test]
    fn workout_ids_are_validated_before_use() {
        let id = ObjectId::new();
        assert_eq!(parse_workout_id(&id.to_hex()).unwrap(), id);
        assert!(matches!(
            parse_workout_id("not-an-id"),
            Err(GymError::Validation(_))
        ));
    }
}
