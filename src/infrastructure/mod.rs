//! Infrastructure layer - Directory, identity, notification and coordinator implementations

pub mod directory;
pub mod identity;
pub mod logging;
pub mod notification;
pub mod team;
