//! Team domain module
//!
//! Teams group learners under one creator. Membership is owned by the team
//! directory; everything here is a read-only view plus pure derivations.

mod entity;
mod validation;

pub use entity::{Member, MemberStatus, Team, TeamId};
pub use validation::{validate_team_id, validate_team_name, TeamValidationError};
