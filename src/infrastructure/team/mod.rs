//! Team coordination: state cache, display snapshot and the coordinator

mod coordinator;
mod snapshot;
mod state;

pub use coordinator::TeamCoordinator;
pub use snapshot::{MemberProgress, TeamSnapshot, TeamView};
pub use state::{ActionKey, ActionOutcome, CoordinatorState, InFlightActions, InFlightGuard};
