//! Domain layer - Core entities, derivations and service contracts

pub mod directory;
pub mod error;
pub mod identity;
pub mod invite;
pub mod notification;
pub mod progress;
pub mod team;

pub use directory::{CancelToken, DirectoryEvent, EventHandler, SubscriptionKey, TeamDirectory};
pub use error::DomainError;
pub use identity::{validate_npub, IdentityValidationError, Npub};
pub use invite::{pending_invites, Invite, InviteId, InviteStatus};
pub use notification::{Confirmer, Notification, NotificationLevel, Notifier};
pub use progress::{
    progress_color, progress_percentage, Curriculum, ProgressColor, ProgressEntry, Step,
};
pub use team::{Member, MemberStatus, Team, TeamId, TeamValidationError};

#[cfg(test)]
pub use directory::MockTeamDirectory;
