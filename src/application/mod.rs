//! Application services: content loading, page assembly, syndication and previews.

pub mod analytics;
pub mod chrome;
pub mod content;
pub mod dates;
pub mod error;
pub mod jsonld;
pub mod locale;
pub mod metadata;
pub mod og_image;
pub mod page;
pub mod pagination;
pub mod render;
pub mod site;
pub mod sitemap;
pub mod syndication;
pub mod toc;
pub mod view_count;
