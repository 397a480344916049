//! In-process stores with the same contract as the database-backed ones.
//!
//! Both can be switched offline, after which every call fails the way an
//! unreachable server would. Tests use this to check failure handling.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use bson::oid::ObjectId;
use chrono::Utc;
use regex::RegexBuilder;
use tokio::sync::Mutex;

use crate::db::models::{HeavySet, NewUser, User, UserLookup, VolumeTotal, Workout, WorkoutLabel};
use crate::db::{ProfileStore, WorkoutStore};
use crate::error::{GymError, Result, StoreKind};
use crate::seed::{ProfileSeeder, WorkoutSeeder};

fn offline(store: StoreKind, action: &'static str) -> GymError {
    GymError::store(store, action, "store is offline")
}

#[derive(Default)]
pub struct MemoryProfileStore {
    users: Mutex<BTreeMap<i32, User>>,
    next_id: Mutex<i32>,
    offline: AtomicBool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self, action: &'static str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(offline(StoreKind::Profiles, action));
        }
        Ok(())
    }

    pub async fn insert_user(&self, user: &NewUser) -> Result<i32> {
        self.check("inserting a user")?;
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(GymError::store(
                StoreKind::Profiles,
                "inserting a user",
                format!("username {} already exists", user.username),
            ));
        }

        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let user_id = *next_id;
        users.insert(
            user_id,
            User {
                user_id,
                username: user.username.clone(),
                full_name: Some(user.full_name.clone()),
                country: Some(user.country.clone()),
                created_at: Utc::now().naive_utc(),
            },
        );
        Ok(user_id)
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.check("listing users")?;
        let mut users: Vec<User> = self.users.lock().await.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn get_user(&self, user_id: i32) -> Result<UserLookup> {
        self.check("looking up a user")?;
        Ok(self.users.lock().await.get(&user_id).cloned().into())
    }

    async fn update_country(&self, user_id: i32, country: &str) -> Result<()> {
        self.check("updating a country")?;
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&user_id)
            .ok_or(GymError::UnknownUser(user_id))?;
        user.country = Some(country.to_string());
        Ok(())
    }
}

impl ProfileSeeder for MemoryProfileStore {
    async fn prepare(&self) -> Result<()> {
        self.check("truncating users")?;
        self.users.lock().await.clear();
        *self.next_id.lock().await = 0;
        Ok(())
    }

    async fn add_user(&self, user: &NewUser) -> Result<i32> {
        self.insert_user(user).await
    }
}

#[derive(Default)]
pub struct MemoryWorkoutStore {
    workouts: Mutex<Vec<Workout>>,
    offline: AtomicBool,
}

impl MemoryWorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.workouts.lock().await.len()
    }

    fn check(&self, action: &'static str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(offline(StoreKind::Workouts, action));
        }
        Ok(())
    }

    async fn for_user_newest_first(&self, user_id: i32) -> Vec<Workout> {
        let mut found: Vec<Workout> = self
            .workouts
            .lock()
            .await
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|w| Reverse((w.date, w.id)));
        found
    }
}

impl WorkoutStore for MemoryWorkoutStore {
    async fn insert(&self, workout: &Workout) -> Result<ObjectId> {
        self.check("saving a workout")?;
        let id = ObjectId::new();
        let mut stored = workout.clone();
        stored.id = Some(id);
        self.workouts.lock().await.push(stored);
        Ok(id)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Workout>> {
        self.check("loading a workout")?;
        Ok(self
            .workouts
            .lock()
            .await
            .iter()
            .find(|w| w.id == Some(id))
            .cloned())
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        self.check("deleting a workout")?;
        let mut workouts = self.workouts.lock().await;
        match workouts.iter().position(|w| w.id == Some(id)) {
            Some(idx) => {
                workouts.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_recent(&self, user_id: i32, limit: usize) -> Result<Vec<Workout>> {
        self.check("loading recent workouts")?;
        let mut found = self.for_user_newest_first(user_id).await;
        found.truncate(limit);
        Ok(found)
    }

    async fn list_labels(&self, user_id: i32) -> Result<Vec<WorkoutLabel>> {
        self.check("listing workouts")?;
        Ok(self
            .for_user_newest_first(user_id)
            .await
            .into_iter()
            .filter_map(|w| {
                w.id.map(|id| WorkoutLabel {
                    id,
                    date: w.date,
                    gym_name: w.gym_name,
                })
            })
            .collect())
    }

    async fn find_by_exercise_threshold(
        &self,
        user_id: i32,
        exercise: &str,
        min_weight: f64,
    ) -> Result<Vec<HeavySet>> {
        self.check("searching heavy sets")?;
        Ok(self
            .for_user_newest_first(user_id)
            .await
            .into_iter()
            .filter_map(|w| {
                let hit = w
                    .exercises
                    .iter()
                    .find(|e| e.name == exercise && e.weight_kg >= min_weight)?
                    .clone();
                Some(HeavySet {
                    workout_id: w.id?,
                    date: w.date,
                    gym_name: w.gym_name,
                    exercise: hit,
                })
            })
            .collect())
    }

    async fn search_text(&self, user_id: i32, term: &str) -> Result<Vec<Workout>> {
        self.check("searching workouts")?;
        let pattern = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
            .map_err(GymError::validation)?;
        Ok(self
            .for_user_newest_first(user_id)
            .await
            .into_iter()
            .filter(|w| {
                pattern.is_match(&w.gym_name)
                    || w.notes.as_deref().is_some_and(|n| pattern.is_match(n))
            })
            .collect())
    }

    async fn top_by_volume(&self, limit: usize) -> Result<Vec<VolumeTotal>> {
        self.check("aggregating volume")?;
        let mut groups: BTreeMap<i32, (i64, i64)> = BTreeMap::new();
        for workout in self.workouts.lock().await.iter() {
            let entry = groups.entry(workout.user_id).or_insert((0, 0));
            entry.0 += workout.total_volume_kg;
            entry.1 += 1;
        }

        let mut totals: Vec<VolumeTotal> = groups
            .into_iter()
            .map(|(user_id, (total_lifted, sessions))| VolumeTotal {
                user_id,
                total_lifted,
                sessions,
            })
            .collect();
        totals.sort_by_key(|t| (Reverse(t.total_lifted), t.user_id));
        totals.truncate(limit);
        Ok(totals)
    }
}

impl WorkoutSeeder for MemoryWorkoutStore {
    async fn replace_all(&self, workouts: &[Workout]) -> Result<usize> {
        self.check("clearing workouts")?;
        let mut stored = self.workouts.lock().await;
        stored.clear();
        stored.extend(workouts.iter().map(|w| Workout {
            id: Some(ObjectId::new()),
            ..w.clone()
        }));
        Ok(workouts.len())
    }
}
