//! Synthetic demo data for both stores.
//!
//! Generation is kept apart from the writes so it can be checked with a fixed
//! seed. Every generated workout carries a `total_volume_kg` equal to the sum of
//! its exercises.

use std::collections::HashSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::info;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::db::models::{Exercise, NewUser, Workout, total_volume};
use crate::db::{MongoWorkoutStore, PgProfileStore};
use crate::error::Result;

/// Profile side of a reseed.
#[allow(async_fn_in_trait)]
pub trait ProfileSeeder {
    /// Leaves an empty users table with id generation restarted.
    async fn prepare(&self) -> Result<()>;

    async fn add_user(&self, user: &NewUser) -> Result<i32>;
}

/// Workout side of a reseed.
#[allow(async_fn_in_trait)]
pub trait WorkoutSeeder {
    /// Drops every stored workout and writes `workouts` in their place.
    async fn replace_all(&self, workouts: &[Workout]) -> Result<usize>;
}

impl ProfileSeeder for PgProfileStore {
    async fn prepare(&self) -> Result<()> {
        self.ensure_schema().await?;
        self.reset().await
    }

    async fn add_user(&self, user: &NewUser) -> Result<i32> {
        self.insert_user(user).await
    }
}

impl WorkoutSeeder for MongoWorkoutStore {
    async fn replace_all(&self, workouts: &[Workout]) -> Result<usize> {
        self.reset().await?;
        let inserted = self.insert_many(workouts).await?;
        self.ensure_indexes().await?;
        Ok(inserted)
    }
}

pub const EXERCISES: [&str; 8] = [
    "Bench Press",
    "Squat",
    "Deadlift",
    "Overhead Press",
    "Pull Up",
    "Dumbbell Row",
    "Leg Press",
    "Bicep Curl",
];

pub const GYMS: [&str; 3] = ["Fitness24Seven Pori", "Elixia", "Liikuntakeskus"];

pub const COUNTRIES: [&str; 4] = ["Finland", "Sweden", "Estonia", "Norway"];

const FIRST_NAMES: [&str; 16] = [
    "Aino", "Eero", "Helmi", "Juha", "Kaisa", "Lauri", "Mikko", "Sanna", "Emily", "James",
    "Laura", "Michael", "Olivia", "Robert", "Sarah", "William",
];

const LAST_NAMES: [&str; 16] = [
    "Korhonen", "Virtanen", "Nieminen", "Makinen", "Hamalainen", "Laine", "Heikkinen", "Koskinen",
    "Smith", "Johnson", "Brown", "Miller", "Davis", "Wilson", "Moore", "Taylor",
];

const NOTE_WORDS: [&str; 20] = [
    "felt", "strong", "tired", "good", "pump", "today", "slow", "warmup", "heavy", "light",
    "focus", "form", "tempo", "great", "session", "legs", "back", "grip", "rest", "progress",
];

const HISTORY_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub users: usize,
    pub workouts: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            users: 50,
            workouts: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub users: usize,
    pub workouts: usize,
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

/// `count` users with distinct usernames.
pub fn fake_users<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<NewUser> {
    let mut taken = HashSet::new();
    let mut users = Vec::with_capacity(count);

    while users.len() < count {
        let first = pick(rng, &FIRST_NAMES);
        let last = pick(rng, &LAST_NAMES);
        let mut username = format!(
            "{}{}{}",
            first.to_lowercase(),
            &last[..1].to_lowercase(),
            rng.random_range(1..=99)
        );
        if taken.contains(&username) {
            username = format!("{}_{}", username, users.len());
        }
        if !taken.insert(username.clone()) {
            continue;
        }

        users.push(NewUser {
            username,
            full_name: format!("{} {}", first, last),
            country: pick(rng, &COUNTRIES).to_string(),
        });
    }
    users
}

fn fake_note<R: Rng + ?Sized>(rng: &mut R) -> String {
    let words: Vec<&str> = (0..rng.random_range(4..=8))
        .map(|_| pick(rng, &NOTE_WORDS))
        .collect();
    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// One workout for a random user from `user_ids`, dated within the last 60
/// days before `now`. `None` when there is nobody to assign it to.
pub fn fake_workout<R: Rng + ?Sized>(
    rng: &mut R,
    user_ids: &[i32],
    now: DateTime<Utc>,
) -> Option<Workout> {
    let user_id = *user_ids.choose(rng)?;

    let exercises: Vec<Exercise> = (0..rng.random_range(3..=6))
        .map(|_| Exercise {
            name: pick(rng, &EXERCISES).to_string(),
            sets: rng.random_range(3..=5),
            reps: rng.random_range(6..=12),
            weight_kg: rng.random_range(40..=140) as f64,
        })
        .collect();

    let offset = Duration::seconds(rng.random_range(0..=HISTORY_DAYS * 24 * 3600));

    Some(Workout {
        id: None,
        user_id,
        date: (now - offset).trunc_subsecs(3),
        gym_name: pick(rng, &GYMS).to_string(),
        total_volume_kg: total_volume(&exercises),
        exercises,
        duration_min: Some(rng.random_range(30..=90)),
        notes: Some(fake_note(rng)),
    })
}

pub fn fake_workouts<R: Rng + ?Sized>(
    rng: &mut R,
    user_ids: &[i32],
    count: usize,
    now: DateTime<Utc>,
) -> Vec<Workout> {
    (0..count)
        .filter_map(|_| fake_workout(rng, user_ids, now))
        .collect()
}

/// Rebuilds both stores from scratch. The profile store is populated first;
/// the workout store is left alone unless at least one user was created.
pub async fn seed<P, W, R>(
    profiles: &P,
    workouts: &W,
    plan: SeedPlan,
    rng: &mut R,
) -> Result<SeedReport>
where
    P: ProfileSeeder,
    W: WorkoutSeeder,
    R: Rng + ?Sized,
{
    info!("preparing users table");
    profiles.prepare().await?;

    let mut user_ids = Vec::with_capacity(plan.users);
    for user in fake_users(rng, plan.users) {
        user_ids.push(profiles.add_user(&user).await?);
    }
    info!("inserted {} users", user_ids.len());

    if user_ids.is_empty() {
        return Ok(SeedReport::default());
    }

    let generated = fake_workouts(rng, &user_ids, plan.workouts, Utc::now());
    let inserted = workouts.replace_all(&generated).await?;
    info!("inserted {} workouts and created indexes", inserted);

    Ok(SeedReport {
        users: user_ids.len(),
        workouts: inserted,
    })
}
