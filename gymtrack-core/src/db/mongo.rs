use bson::oid::ObjectId;
use bson::{Document, doc};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::{debug, info};
use mongodb::{Client, Collection, IndexModel};
use serde::Deserialize;

use crate::db::WorkoutStore;
use crate::db::models::{Exercise, HeavySet, VolumeTotal, Workout, WorkoutLabel};
use crate::error::{GymError, Result, StoreKind};

pub const WORKOUTS_COLLECTION: &str = "workouts";

/// MongoDB-backed workout store over the `workouts` collection.
#[derive(Clone)]
pub struct MongoWorkoutStore {
    collection: Collection<Workout>,
}

// Shape returned by the positional projection in `find_by_exercise_threshold`.
#[derive(Deserialize)]
struct MatchedWorkout {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    date: DateTime<Utc>,
    gym_name: String,
    #[serde(default)]
    exercises: Vec<Exercise>,
}

fn limit_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

pub(crate) fn user_filter(user_id: i32) -> Document {
    doc! { "user_id": user_id }
}

pub(crate) fn newest_first() -> Document {
    doc! { "date": -1, "_id": -1 }
}

pub(crate) fn heavy_set_filter(user_id: i32, exercise: &str, min_weight: f64) -> Document {
    doc! {
        "user_id": user_id,
        "exercises": {
            "$elemMatch": {
                "name": exercise,
                "weight_kg": { "$gte": min_weight },
            }
        },
    }
}

/// `exercises.$` keeps only the first array element matched by the filter.
pub(crate) fn heavy_set_projection() -> Document {
    doc! { "date": 1, "gym_name": 1, "exercises.$": 1 }
}

pub(crate) fn search_filter(user_id: i32, term: &str) -> Document {
    let pattern = regex::escape(term);
    doc! {
        "user_id": user_id,
        "$or": [
            { "gym_name": { "$regex": pattern.as_str(), "$options": "i" } },
            { "notes": { "$regex": pattern.as_str(), "$options": "i" } },
        ],
    }
}

pub(crate) fn volume_pipeline(limit: usize) -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": "$user_id",
                "total_lifted": { "$sum": "$total_volume_kg" },
                "sessions": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "total_lifted": -1, "_id": 1 } },
        doc! { "$limit": limit_i64(limit) },
    ]
}

impl MongoWorkoutStore {
    /// Parses the URI and prepares the client. The driver connects on first use.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        debug!("MongoWorkoutStore::connect database={}", database);
        let client = Client::with_uri_str(uri)
            .await
            .map_err(GymError::workouts("connecting"))?;
        Ok(Self {
            collection: client.database(database).collection(WORKOUTS_COLLECTION),
        })
    }

    pub async fn reset(&self) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(GymError::workouts("clearing workouts"))?;
        info!("removed {} workouts", result.deleted_count);
        Ok(result.deleted_count)
    }

    pub async fn insert_many(&self, workouts: &[Workout]) -> Result<usize> {
        if workouts.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .insert_many(workouts)
            .await
            .map_err(GymError::workouts("inserting workouts"))?;
        Ok(result.inserted_ids.len())
    }

    /// Creates the `(user_id, date desc)` and `(total_volume_kg desc)` indexes.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "date": -1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "total_volume_kg": -1 })
                .build(),
        ];
        self.collection
            .create_indexes(indexes)
            .await
            .map_err(GymError::workouts("creating indexes"))?;
        Ok(())
    }
}

impl WorkoutStore for MongoWorkoutStore {
    async fn insert(&self, workout: &Workout) -> Result<ObjectId> {
        let result = self
            .collection
            .insert_one(workout)
            .await
            .map_err(GymError::workouts("saving a workout"))?;

        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            GymError::store(
                StoreKind::Workouts,
                "saving a workout",
                format!("unexpected id {}", result.inserted_id),
            )
        })?;
        info!("saved workout {} for user {}", id, workout.user_id);
        Ok(id)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Workout>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(GymError::workouts("loading a workout"))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(GymError::workouts("deleting a workout"))?;
        info!("delete workout {} removed {}", id, result.deleted_count);
        Ok(result.deleted_count > 0)
    }

    async fn find_recent(&self, user_id: i32, limit: usize) -> Result<Vec<Workout>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(user_filter(user_id))
            .sort(newest_first())
            .limit(limit_i64(limit))
            .await
            .map_err(GymError::workouts("loading recent workouts"))?;
        cursor
            .try_collect()
            .await
            .map_err(GymError::workouts("loading recent workouts"))
    }

    async fn list_labels(&self, user_id: i32) -> Result<Vec<WorkoutLabel>> {
        let cursor = self
            .collection
            .clone_with_type::<WorkoutLabel>()
            .find(user_filter(user_id))
            .projection(doc! { "_id": 1, "date": 1, "gym_name": 1 })
            .sort(newest_first())
            .await
            .map_err(GymError::workouts("listing workouts"))?;
        cursor
            .try_collect()
            .await
            .map_err(GymError::workouts("listing workouts"))
    }

    async fn find_by_exercise_threshold(
        &self,
        user_id: i32,
        exercise: &str,
        min_weight: f64,
    ) -> Result<Vec<HeavySet>> {
        let filter = heavy_set_filter(user_id, exercise, min_weight);
        debug!("find_by_exercise_threshold filter={}", filter);
        let cursor = self
            .collection
            .clone_with_type::<MatchedWorkout>()
            .find(filter)
            .projection(heavy_set_projection())
            .sort(newest_first())
            .await
            .map_err(GymError::workouts("searching heavy sets"))?;
        let matched: Vec<MatchedWorkout> = cursor
            .try_collect()
            .await
            .map_err(GymError::workouts("searching heavy sets"))?;

        Ok(matched
            .into_iter()
            .filter_map(|m| {
                let MatchedWorkout {
                    id,
                    date,
                    gym_name,
                    exercises,
                } = m;
                exercises.into_iter().next().map(|exercise| HeavySet {
                    workout_id: id,
                    date,
                    gym_name,
                    exercise,
                })
            })
            .collect())
    }

    async fn search_text(&self, user_id: i32, term: &str) -> Result<Vec<Workout>> {
        let filter = search_filter(user_id, term);
        debug!("search_text filter={}", filter);
        let cursor = self
            .collection
            .find(filter)
            .sort(newest_first())
            .await
            .map_err(GymError::workouts("searching workouts"))?;
        cursor
            .try_collect()
            .await
            .map_err(GymError::workouts("searching workouts"))
    }

    async fn top_by_volume(&self, limit: usize) -> Result<Vec<VolumeTotal>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .aggregate(volume_pipeline(limit))
            .await
            .map_err(GymError::workouts("aggregating volume"))?;
        let rows: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(GymError::workouts("aggregating volume"))?;

        rows.into_iter()
            .map(|row| {
                bson::from_document::<VolumeTotal>(row)
                    .map_err(GymError::workouts("decoding volume totals"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavy_set_filter_matches_within_one_entry() {
        let filter = heavy_set_filter(4, "Squat", 100.0);
        assert_eq!(filter.get_i32("user_id").unwrap(), 4);

        let elem = filter
            .get_document("exercises")
            .unwrap()
            .get_document("$elemMatch")
            .unwrap();
        assert_eq!(elem.get_str("name").unwrap(), "Squat");
        assert_eq!(
            elem.get_document("weight_kg")
                .unwrap()
                .get_f64("$gte")
                .unwrap(),
            100.0
        );
        assert_eq!(heavy_set_projection().get_i32("exercises.$").unwrap(), 1);
    }

    #[test]
    fn search_terms_are_literal_and_case_insensitive() {
        let filter = search_filter(1, "fit (pori)");
        let branches = filter.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);

        let gym = branches[0]
            .as_document()
            .unwrap()
            .get_document("gym_name")
            .unwrap();
        assert_eq!(gym.get_str("$regex").unwrap(), r"fit \(pori\)");
        assert_eq!(gym.get_str("$options").unwrap(), "i");
        assert!(
            branches[1]
                .as_document()
                .unwrap()
                .contains_key("notes")
        );
    }

    #[test]
    fn volume_pipeline_breaks_ties_by_user_id() {
        let pipeline = volume_pipeline(10);
        assert_eq!(pipeline.len(), 3);

        let group = pipeline[0].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$user_id");

        let sort = pipeline[1].get_document("$sort").unwrap();
        let keys: Vec<&String> = sort.keys().collect();
        assert_eq!(keys, vec!["total_lifted", "_id"]);
        assert_eq!(sort.get_i32("total_lifted").unwrap(), -1);
        assert_eq!(sort.get_i32("_id").unwrap(), 1);

        assert_eq!(pipeline[2].get_i64("$limit").unwrap(), 10);
    }
}
