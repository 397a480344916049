//! Session module for one user's interaction with the stores.
//!
//! This module provides the `Session` struct that owns both stores, the
//! selected user and the exercise buffer used when logging a workout.

mod buffer;
mod session;
mod workouts;

pub use buffer::{DEFAULT_GYM, DEFAULT_NOTES, WorkoutBuilder};
pub use session::{Session, require_users};
