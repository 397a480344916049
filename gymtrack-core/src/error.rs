use std::fmt;

use thiserror::Error as ThisError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which backing store an operation was talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Profiles,
    Workouts,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Profiles => write!(f, "PostgreSQL"),
            StoreKind::Workouts => write!(f, "MongoDB"),
        }
    }
}

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum GymError {
    /// The store was unreachable or rejected the request. Never retried.
    #[error("{store} error while {action}: {source}")]
    Store {
        store: StoreKind,
        action: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("no user with id {0}")]
    UnknownUser(i32),

    #[error("no users found, run `gymtrack seed` to populate the databases first")]
    NoUsers,

    #[error("configuration error: {0}")]
    Config(String),
}

impl GymError {
    pub fn store<E>(store: StoreKind, action: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        GymError::Store {
            store,
            action,
            source: source.into(),
        }
    }

    pub fn profiles<E: Into<BoxError>>(action: &'static str) -> impl FnOnce(E) -> Self {
        move |e| GymError::store(StoreKind::Profiles, action, e)
    }

    pub fn workouts<E: Into<BoxError>>(action: &'static str) -> impl FnOnce(E) -> Self {
        move |e| GymError::store(StoreKind::Workouts, action, e)
    }

    pub fn validation<D: fmt::Display>(d: D) -> Self {
        GymError::Validation(d.to_string())
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, GymError::Store { .. })
    }
}

pub type Result<T> = std::result::Result<T, GymError>;
