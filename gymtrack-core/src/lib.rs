pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod seed;
pub mod session;

pub use error::{GymError, Result};
