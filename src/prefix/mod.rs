//! Prefix handling: the Prefix Manager (component A) and the Extended
//! Prefix Map (component B).

pub mod epm;
pub mod manager;

pub use epm::{ExtendedPrefixMap, PrefixRecord};
pub use manager::PrefixManager;
