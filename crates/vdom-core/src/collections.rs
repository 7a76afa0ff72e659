//! Map types used by the engine's pools and registries.
//!
//! The `std-hash` feature swaps hashbrown for the std collections, which is
//! handy when comparing allocation profiles.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}
