//! Markdown rendering for blog posts and dictionary prose.
//!
//! The pipeline is pure: Markdown in, sanitised HTML plus content metrics out.

mod service;
mod types;

pub use service::{ComrakRenderService, render_service};
pub use types::{ContentMetrics, RenderError, RenderOutput, RenderRequest, RenderService};
