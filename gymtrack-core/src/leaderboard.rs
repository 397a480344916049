//! Volume leaderboard: ranks users from workout data, then resolves each
//! ranked id against the profile store.

use log::{debug, warn};

use crate::db::models::UserLookup;
use crate::db::{ProfileStore, WorkoutStore};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    /// 1-based, counted over resolved users only.
    pub rank: usize,
    pub athlete: String,
    pub country: Option<String>,
    pub volume_kg: i64,
    pub sessions: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Standings {
    /// The workout store holds nothing to rank.
    NoData,
    Ranked(Vec<LeaderboardRow>),
}

/// Builds the leaderboard for the top `limit` users by summed volume.
///
/// Users are resolved one at a time. An id with no profile row is skipped
/// without consuming a rank. A profile store failure aborts the whole call;
/// no partial leaderboard is returned.
pub async fn leaderboard<P, W>(profiles: &P, workouts: &W, limit: usize) -> Result<Standings>
where
    P: ProfileStore,
    W: WorkoutStore,
{
    let totals = workouts.top_by_volume(limit).await?;
    if totals.is_empty() {
        return Ok(Standings::NoData);
    }
    debug!("leaderboard resolving {} ranked users", totals.len());

    let mut rows: Vec<LeaderboardRow> = Vec::with_capacity(totals.len());
    for total in totals {
        match profiles.get_user(total.user_id).await? {
            UserLookup::Found(user) => rows.push(LeaderboardRow {
                rank: rows.len() + 1,
                athlete: user.username,
                country: user.country,
                volume_kg: total.total_lifted,
                sessions: total.sessions,
            }),
            UserLookup::Missing => {
                warn!(
                    "leaderboard skipping user {} with no profile row",
                    total.user_id
                );
            }
        }
    }

    Ok(Standings::Ranked(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewUser, Workout};
    use crate::db::{MemoryProfileStore, MemoryWorkoutStore};
    use chrono::Utc;

    async fn add_user(profiles: &MemoryProfileStore, name: &str, country: &str) -> i32 {
        profiles
            .insert_user(&NewUser {
                username: name.into(),
                full_name: name.into(),
                country: country.into(),
            })
            .await
            .unwrap()
    }

    async fn add_volume(workouts: &MemoryWorkoutStore, user_id: i32, volume: i64) {
        workouts
            .insert(&Workout {
                id: None,
                user_id,
                date: Utc::now(),
                gym_name: "Elixia".into(),
                exercises: vec![],
                total_volume_kg: volume,
                duration_min: None,
                notes: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unresolved_users_do_not_consume_a_rank() {
        let profiles = MemoryProfileStore::new();
        let workouts = MemoryWorkoutStore::new();
        let anna = add_user(&profiles, "anna", "Finland").await;
        let lars = add_user(&profiles, "lars", "Sweden").await;

        add_volume(&workouts, anna, 500).await;
        add_volume(&workouts, 77, 300).await;
        add_volume(&workouts, lars, 800).await;

        let Standings::Ranked(rows) = leaderboard(&profiles, &workouts, 10).await.unwrap() else {
            panic!("expected ranked standings");
        };
        assert_eq!(
            rows,
            vec![
                LeaderboardRow {
                    rank: 1,
                    athlete: "lars".into(),
                    country: Some("Sweden".into()),
                    volume_kg: 800,
                    sessions: 1,
                },
                LeaderboardRow {
                    rank: 2,
                    athlete: "anna".into(),
                    country: Some("Finland".into()),
                    volume_kg: 500,
                    sessions: 1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_workout_store_reports_no_data() {
        let profiles = MemoryProfileStore::new();
        add_user(&profiles, "anna", "Finland").await;
        let workouts = MemoryWorkoutStore::new();

        assert_eq!(
            leaderboard(&profiles, &workouts, 10).await.unwrap(),
            Standings::NoData
        );
    }

    #[tokio::test]
    async fn limit_applies_before_resolution() {
        let profiles = MemoryProfileStore::new();
        let workouts = MemoryWorkoutStore::new();
        let anna = add_user(&profiles, "anna", "Finland").await;
        add_volume(&workouts, 99, 900).await;
        add_volume(&workouts, anna, 100).await;

        let standings = leaderboard(&profiles, &workouts, 1).await.unwrap();
        assert_eq!(standings, Standings::Ranked(vec![]));
    }

    #[tokio::test]
    async fn profile_store_failure_fails_the_whole_call() {
        let profiles = MemoryProfileStore::new();
        let workouts = MemoryWorkoutStore::new();
        let anna = add_user(&profiles, "anna", "Finland").await;
        add_volume(&workouts, anna, 100).await;

        profiles.set_offline(true);
        let err = leaderboard(&profiles, &workouts, 10).await.unwrap_err();
        assert!(err.is_store_failure());
        assert!(err.to_string().starts_with("PostgreSQL"));
    }
}
