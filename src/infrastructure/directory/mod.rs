//! Team directory implementations

mod fixture;
mod in_memory;

pub use fixture::DirectoryFixture;
pub use in_memory::{DirectoryOperation, InMemoryTeamDirectory};
