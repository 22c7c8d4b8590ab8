pub mod hasher;
pub mod provider;

pub use hasher::{HashedPassword, LegacyHasher};
pub use provider::{Credentials, LegacyUserProvider};
