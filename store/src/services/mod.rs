//! Domain services behind [`crate::Store`].
//!
//! ARCHITECTURE
//! ============
//! Each module owns the queries and rules for one entity (or one concern,
//! for `migration`, `preview` and `transfer`). Functions take the pool and
//! clock explicitly so tests can drive them without the facade.

pub mod collection;
pub mod image;
pub mod migration;
pub mod preview;
pub mod region;
pub mod transfer;
