use log::info;

use crate::db::models::User;
use crate::db::{ProfileStore, WorkoutStore};
use crate::error::{GymError, Result};
use crate::session::WorkoutBuilder;

/// Everything one caller works with after picking a user: both stores, the
/// selected profile and the unsaved exercise buffer.
pub struct Session<P, W> {
    pub(crate) user: User,
    pub(crate) profiles: P,
    pub(crate) workouts: W,
    pub(crate) buffer: WorkoutBuilder,
}

/// Lists users, refusing to continue when there are none.
pub async fn require_users<P: ProfileStore>(profiles: &P) -> Result<Vec<User>> {
    let users = profiles.list_users().await?;
    if users.is_empty() {
        return Err(GymError::NoUsers);
    }
    Ok(users)
}

impl<P: ProfileStore, W: WorkoutStore> Session<P, W> {
    pub async fn open(profiles: P, workouts: W, user_id: i32) -> Result<Self> {
        let user = require_users(&profiles)
            .await?
            .into_iter()
            .find(|u| u.user_id == user_id)
            .ok_or(GymError::UnknownUser(user_id))?;
        info!("session opened for {}", user.label());

        Ok(Self {
            user,
            profiles,
            workouts,
            buffer: WorkoutBuilder::new(),
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> i32 {
        self.user.user_id
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    pub fn workouts(&self) -> &W {
        &self.workouts
    }

    pub fn buffer(&self) -> &WorkoutBuilder {
        &self.buffer
    }
}
