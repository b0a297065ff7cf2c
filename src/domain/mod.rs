//! Domain layer types and invariants.

pub mod collections;
pub mod dictionary;
pub mod error;
pub mod icons;
pub mod locale;
pub mod posts;
pub mod slug;
