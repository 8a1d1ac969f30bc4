pub mod availability;
pub mod config;
pub mod domain;
pub mod errors;

pub use availability::{
    compute_available, summarize, team_availability, AvailabilitySummary, TeamAvailability,
};
pub use domain::pick::{Pick, PickRejection, PickSelection, PickStats, SaveOutcome, UserId};
pub use domain::roster::{DriverRecord, Roster, Team};
pub use errors::{ApplicationError, DomainError, InterfaceError};
