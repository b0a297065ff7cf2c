use thiserror::Error;

/// Markdown input for the rendering pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub markdown: String,
    /// Normalised public site URL; absolute links under it count as internal.
    pub public_site_url: Option<String>,
}

impl RenderRequest {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            public_site_url: None,
        }
    }

    pub fn with_public_site_url(mut self, public_site_url: impl Into<String>) -> Self {
        let normalized = normalize_public_site_url(public_site_url.into().as_str());
        if !normalized.is_empty() {
            self.public_site_url = Some(normalized);
        }
        self
    }
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let without_trailing = trimmed.trim_end_matches('/');
    format!("{without_trailing}/")
}

/// Counters gathered while post-processing rendered HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentMetrics {
    pub word_count: u32,
    pub reading_time_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// Sanitised HTML with heading ids and link attributes applied.
    pub html: String,
    pub content_metrics: ContentMetrics,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown parsing failed: {message}")]
    Markdown { message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
}

/// Pure Markdown to HTML conversion.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}
