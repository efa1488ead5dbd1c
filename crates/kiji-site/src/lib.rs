//! Presentation layer for kiji blogs.
//!
//! Turns catalog query results into HTML pages, an RSS feed, sitemaps and
//! Open Graph images, either on demand (the dev server) or written to disk
//! by the static builder.

pub mod assets;
pub mod builder;
pub mod config;
pub mod feed;
pub mod og;
pub mod render;
pub mod sitemap;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use config::SiteConfig;
pub use og::OgError;
pub use render::{RenderError, RenderTarget, SiteRenderer};
