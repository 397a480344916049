//! Workout and profile operations for the session's user.

use crate::db::models::{Exercise, HeavySet, Workout, WorkoutLabel};
use crate::db::{ProfileStore, WorkoutStore, parse_workout_id};
use crate::error::Result;
use crate::leaderboard::{Standings, leaderboard};
use crate::session::Session;

impl<P: ProfileStore, W: WorkoutStore> Session<P, W> {
    pub async fn history(&self, limit: usize) -> Result<Vec<Workout>> {
        self.workouts.find_recent(self.user_id(), limit).await
    }

    pub async fn workout_labels(&self) -> Result<Vec<WorkoutLabel>> {
        self.workouts.list_labels(self.user_id()).await
    }

    pub async fn heavy_sets(&self, exercise: &str, min_weight: f64) -> Result<Vec<HeavySet>> {
        self.workouts
            .find_by_exercise_threshold(self.user_id(), exercise, min_weight)
            .await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Workout>> {
        self.workouts.search_text(self.user_id(), term).await
    }

    /// Loads a workout by its hex id.
    pub async fn workout(&self, raw_id: &str) -> Result<Option<Workout>> {
        let id = parse_workout_id(raw_id)?;
        self.workouts.get(id).await
    }

    /// Deletes a workout by its hex id. Returns whether one was removed.
    pub async fn delete_workout(&self, raw_id: &str) -> Result<bool> {
        let id = parse_workout_id(raw_id)?;
        self.workouts.delete(id).await
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Standings> {
        leaderboard(&self.profiles, &self.workouts, limit).await
    }

    pub async fn update_country(&mut self, country: &str) -> Result<()> {
        self.profiles
            .update_country(self.user_id(), country)
            .await?;
        self.user.country = Some(country.to_string());
        Ok(())
    }

    pub fn add_exercise(
        &mut self,
        name: &str,
        sets: i32,
        reps: i32,
        weight_kg: f64,
    ) -> Result<&[Exercise]> {
        self.buffer.add_exercise(name, sets, reps, weight_kg)
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Saves the buffered exercises as one workout for this user.
    pub async fn save_workout(&mut self, gym_name: &str, notes: Option<&str>) -> Result<Workout> {
        let user_id = self.user_id();
        self.buffer
            .commit(&self.workouts, user_id, gym_name, notes)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewUser;
    use crate::db::{MemoryProfileStore, MemoryWorkoutStore};
    use crate::error::GymError;
    use crate::session::DEFAULT_GYM;

    async fn seeded_profiles() -> MemoryProfileStore {
        let profiles = MemoryProfileStore::new();
        for (name, country) in [("anna", "Finland"), ("lars", "Sweden")] {
            profiles
                .insert_user(&NewUser {
                    username: name.into(),
                    full_name: name.into(),
                    country: country.into(),
                })
                .await
                .unwrap();
        }
        profiles
    }

    #[tokio::test]
    async fn open_refuses_an_empty_user_table() {
        let result = Session::open(MemoryProfileStore::new(), MemoryWorkoutStore::new(), 1).await;
        assert!(matches!(result, Err(GymError::NoUsers)));
    }

    #[tokio::test]
    async fn open_rejects_unknown_user() {
        let result = Session::open(seeded_profiles().await, MemoryWorkoutStore::new(), 42).await;
        assert!(matches!(result, Err(GymError::UnknownUser(42))));
    }

    #[tokio::test]
    async fn log_search_and_delete_a_workout() {
        let mut session = Session::open(seeded_profiles().await, MemoryWorkoutStore::new(), 1)
            .await
            .unwrap();
        assert_eq!(session.user().username, "anna");

        session.add_exercise("Squat", 3, 5, 120.0).unwrap();
        session.add_exercise("Squat", 3, 5, 90.0).unwrap();
        let saved = session.save_workout(DEFAULT_GYM, None).await.unwrap();
        assert!(session.buffer().is_empty());

        let history = session.history(10).await.unwrap();
        assert_eq!(history, vec![saved.clone()]);

        let heavy = session.heavy_sets("Squat", 100.0).await.unwrap();
        assert_eq!(heavy.len(), 1);
        assert_eq!(heavy[0].exercise.weight_kg, 120.0);

        assert_eq!(session.search("fit").await.unwrap().len(), 1);
        assert!(session.search("elixia").await.unwrap().is_empty());

        let id = saved.id.unwrap().to_hex();
        assert_eq!(session.workout(&id).await.unwrap(), Some(saved));
        assert!(session.delete_workout(&id).await.unwrap());
        assert!(!session.delete_workout(&id).await.unwrap());
        assert!(session.workout_labels().await.unwrap().is_empty());

        assert!(matches!(
            session.delete_workout("nope").await,
            Err(GymError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn country_update_reaches_the_store_and_the_session() {
        let mut session = Session::open(seeded_profiles().await, MemoryWorkoutStore::new(), 2)
            .await
            .unwrap();
        session.update_country("Norway").await.unwrap();
        assert_eq!(session.user().country.as_deref(), Some("Norway"));

        let stored = session.profiles().get_user(2).await.unwrap().into_option().unwrap();
        assert_eq!(stored.country.as_deref(), Some("Norway"));
    }

    #[tokio::test]
    async fn failed_update_leaves_session_profile_alone() {
        let mut session = Session::open(seeded_profiles().await, MemoryWorkoutStore::new(), 2)
            .await
            .unwrap();
        session.profiles().set_offline(true);
        assert!(session.update_country("Norway").await.is_err());
        assert_eq!(session.user().country.as_deref(), Some("Sweden"));
    }

    #[tokio::test]
    async fn leaderboard_from_session() {
        let mut session = Session::open(seeded_profiles().await, MemoryWorkoutStore::new(), 2)
            .await
            .unwrap();
        assert_eq!(session.leaderboard(10).await.unwrap(), Standings::NoData);

        session.add_exercise("Deadlift", 1, 1, 200.0).unwrap();
        session.save_workout("Elixia", None).await.unwrap();
        let Standings::Ranked(rows) = session.leaderboard(10).await.unwrap() else {
            panic!("expected ranked standings");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].athlete, "lars");
        assert_eq!(rows[0].volume_kg, 200);
    }
}
