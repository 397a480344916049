//! The exercise buffer behind "log a workout".

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, warn};

use crate::db::WorkoutStore;
use crate::db::models::{Exercise, Workout, total_volume};
use crate::error::{GymError, Result};

pub const DEFAULT_GYM: &str = "Fitness24Seven";
pub const DEFAULT_NOTES: &str = "Logged via App";

/// Exercises entered for a session that has not been saved yet, in the order
/// they were entered.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkoutBuilder {
    exercises: Vec<Exercise>,
}

impl WorkoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Appends one entry. Bad input is rejected and leaves the buffer as it was.
    pub fn add_exercise(
        &mut self,
        name: &str,
        sets: i32,
        reps: i32,
        weight_kg: f64,
    ) -> Result<&[Exercise]> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GymError::validation("exercise name is empty"));
        }
        if sets < 1 || reps < 1 {
            return Err(GymError::validation(format!(
                "{}: sets and reps must be at least 1",
                name
            )));
        }
        if !weight_kg.is_finite() || weight_kg < 0.0 {
            return Err(GymError::validation(format!(
                "{}: weight must be a non-negative number",
                name
            )));
        }

        self.exercises.push(Exercise {
            name: name.to_string(),
            sets,
            reps,
            weight_kg,
        });
        debug!("buffer now holds {} exercises", self.exercises.len());
        Ok(&self.exercises)
    }

    pub fn clear(&mut self) {
        self.exercises.clear();
    }

    pub fn total_volume(&self) -> i64 {
        total_volume(&self.exercises)
    }

    /// Assembles the document that `commit` would save.
    pub fn build(
        &self,
        user_id: i32,
        gym_name: &str,
        notes: Option<&str>,
        date: DateTime<Utc>,
    ) -> Workout {
        Workout {
            id: None,
            user_id,
            date,
            gym_name: gym_name.to_string(),
            exercises: self.exercises.clone(),
            total_volume_kg: self.total_volume(),
            duration_min: None,
            notes: Some(notes.unwrap_or(DEFAULT_NOTES).to_string()),
        }
    }

    /// Saves the buffer as one workout and empties it. If the store refuses,
    /// the buffer is kept so the caller can retry.
    pub async fn commit<W: WorkoutStore>(
        &mut self,
        store: &W,
        user_id: i32,
        gym_name: &str,
        notes: Option<&str>,
    ) -> Result<Workout> {
        if self.is_empty() {
            return Err(GymError::validation("no exercises to save"));
        }

        // Stored datetimes only keep milliseconds.
        let date = Utc::now().trunc_subsecs(3);
        let mut workout = self.build(user_id, gym_name, notes, date);

        match store.insert(&workout).await {
            Ok(id) => {
                workout.id = Some(id);
                self.clear();
                Ok(workout)
            }
            Err(e) => {
                warn!(
                    "saving workout failed, keeping {} buffered exercises: {}",
                    self.exercises.len(),
                    e
                );
                Err(e)
            }
        }
    }
}
