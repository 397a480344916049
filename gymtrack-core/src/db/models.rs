use std::fmt;

use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// Profile models (PostgreSQL)
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Label used by user pickers, e.g. `jdoe42 (Finland)`.
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.username,
            self.country.as_deref().unwrap_or("unknown")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub country: String,
}

/// Result of resolving a `user_id` taken from workout data. The workout store
/// does not enforce the reference, so `Missing` is an ordinary outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum UserLookup {
    Found(User),
    Missing,
}

impl UserLookup {
    pub fn into_option(self) -> Option<User> {
        match self {
            UserLookup::Found(user) => Some(user),
            UserLookup::Missing => None,
        }
    }
}

impl From<Option<User>> for UserLookup {
    fn from(user: Option<User>) -> Self {
        user.map(UserLookup::Found).unwrap_or(UserLookup::Missing)
    }
}

// Workout models (MongoDB)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: f64,
}

impl Exercise {
    pub fn volume(&self) -> f64 {
        self.sets as f64 * self.reps as f64 * self.weight_kg
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}x{} @ {}kg",
            self.name, self.sets, self.reps, self.weight_kg
        )
    }
}

/// Sum of sets x reps x weight, rounded to whole kilograms.
pub fn total_volume(exercises: &[Exercise]) -> i64 {
    exercises.iter().map(Exercise::volume).sum::<f64>().round() as i64
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workout {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: i32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub gym_name: String,
    pub exercises: Vec<Exercise>,
    pub total_volume_kg: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: {}kg",
            self.date.format("%Y-%m-%d"),
            self.gym_name,
            self.total_volume_kg
        )
    }
}

/// Just enough of a workout to pick it from a list.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WorkoutLabel {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub gym_name: String,
}

impl fmt::Display for WorkoutLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.date.format("%Y-%m-%d"), self.gym_name)
    }
}

/// A workout reduced to the first exercise entry that passed a weight threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct HeavySet {
    pub workout_id: ObjectId,
    pub date: DateTime<Utc>,
    pub gym_name: String,
    pub exercise: Exercise,
}

impl fmt::Display for HeavySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: {}kg",
            self.date.format("%Y-%m-%d"),
            self.gym_name,
            self.exercise.weight_kg
        )
    }
}

/// One row of the volume aggregation, before profile resolution.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct VolumeTotal {
    #[serde(rename = "_id")]
    pub user_id: i32,
    pub total_lifted: i64,
    pub sessions: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(name: &str, sets: i32, reps: i32, weight_kg: f64) -> Exercise {
        Exercise {
            name: name.into(),
            sets,
            reps,
            weight_kg,
        }
    }

    #[test]
    fn volume_sums_every_entry() {
        let exercises = vec![ex("Squat", 3, 10, 60.0), ex("Bench Press", 5, 5, 80.0)];
        assert_eq!(total_volume(&exercises), 1800 + 2000);
        assert_eq!(total_volume(&[]), 0);
    }

    #[test]
    fn fractional_weights_round_once() {
        let exercises = vec![ex("Curl", 1, 1, 12.25), ex("Curl", 1, 1, 12.25)];
        assert_eq!(total_volume(&exercises), 25);
    }

    #[test]
    fn workout_document_shape() {
        let date = DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let workout = Workout {
            id: None,
            user_id: 7,
            date,
            gym_name: "Elixia".into(),
            exercises: vec![ex("Squat", 3, 10, 60.0)],
            total_volume_kg: 1800,
            duration_min: None,
            notes: Some("Logged via App".into()),
        };

        let doc = bson::to_document(&workout).unwrap();
        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key("duration_min"));
        assert_eq!(doc.get_i32("user_id").unwrap(), 7);
        assert_eq!(doc.get_i64("total_volume_kg").unwrap(), 1800);
        assert!(doc.get_datetime("date").is_ok());
        assert_eq!(doc.get_array("exercises").unwrap().len(), 1);

        let back: Workout = bson::from_document(doc).unwrap();
        assert_eq!(back, workout);
    }

    #[test]
    fn integer_weights_from_seeded_documents_decode() {
        let doc = bson::doc! {
            "name": "Deadlift",
            "sets": 3,
            "reps": 8,
            "weight_kg": 120,
        };
        let exercise: Exercise = bson::from_document(doc).unwrap();
        assert_eq!(exercise.weight_kg, 120.0);
    }

    #[test]
    fn missing_user_converts_from_none() {
        assert_eq!(UserLookup::from(None), UserLookup::Missing);
        assert!(UserLookup::Missing.into_option().is_none());
    }
}
