//! Infrastructure adapters and runtime bootstrap.

pub mod analytics;
pub mod assets;
pub mod error;
pub mod fonts;
pub mod http;
pub mod media;
pub mod telemetry;
