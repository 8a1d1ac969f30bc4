use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user's current team/driver selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub user_id: UserId,
    pub team: String,
    pub driver: String,
    pub ea_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pick {
    /// Name shown on the leaderboard: the in-game username when one was
    /// supplied, otherwise `None` so the caller can fall back to a mention.
    pub fn display_name(&self) -> Option<&str> {
        self.ea_username.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickSelection {
    pub user_id: UserId,
    pub team: String,
    pub driver: String,
    pub ea_username: Option<String>,
}

impl PickSelection {
    pub fn new(user_id: UserId, team: impl Into<String>, driver: impl Into<String>) -> Self {
        Self { user_id, team: team.into(), driver: driver.into(), ea_username: None }
    }

    pub fn with_ea_username(mut self, ea_username: impl Into<String>) -> Self {
        self.ea_username = Some(ea_username.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickRejection {
    DriverTaken { driver: String },
}

impl fmt::Display for PickRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriverTaken { driver } => write!(f, "driver already taken: {driver}"),
        }
    }
}

/// Business outcome of a save. Infrastructure failures are reported through
/// the store's error type instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Accepted(Pick),
    Rejected(PickRejection),
}

impl SaveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&Pick> {
        match self {
            Self::Accepted(pick) => Some(pick),
            Self::Rejected(_) => None,
        }
    }

    pub fn is_driver_taken(&self) -> bool {
        matches!(self, Self::Rejected(PickRejection::DriverTaken { .. }))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickStats {
    pub total_picks: u64,
    pub unique_teams: u64,
    pub unique_drivers: u64,
}
