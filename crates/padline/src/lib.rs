//! padline: three-party one-time-pad index allocation engine.
//!
//! Three requesters draw one-time-pad indices from a shared line of
//! `capacity` slots: one from each end inward, one from the middle outward,
//! all kept more than a safety margin apart. The core state machine lives
//! in [`PadSession`]; everything else is driver machinery around it.

mod party;
mod schedule;
mod session;
mod stats;

pub mod runner;
pub mod service;
pub mod simulation;
pub mod transport;

pub use party::{Party, Role, RoleAssignment};
pub use runner::{RunReport, StepTrace, run_batch};
pub use schedule::{BatchRequest, BlockPolicy, build_schedule};
pub use session::{MiddleInterval, PadSession, PartyStateView, SessionError};
pub use service::{
    PartyFlags, PartyStates, ServiceError, SessionHandle, SessionService, SessionSnapshot,
};
pub use stats::{PartyCounts, SessionStats};

/// Padline version from Cargo.toml.
pub const PADLINE_VERSION: &str = env!("CARGO_PKG_VERSION");
