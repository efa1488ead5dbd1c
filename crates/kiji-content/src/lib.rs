//! Content store and catalog for kiji blog posts.
//!
//! Posts live on disk as `<root>/<YYYY>/<MM>/<file>.mdx` with a YAML
//! frontmatter block. This crate scans that tree, validates every file's
//! frontmatter, derives descriptions, and answers the queries the site
//! renders from: all posts, a single post, and posts by tag.

pub mod catalog;
pub mod date;
pub mod description;
pub mod frontmatter;
pub mod post;
pub mod store;
pub mod visibility;

#[cfg(test)]
mod fixtures;

pub use catalog::{Catalog, TagCount};
pub use description::{generate_description, DEFAULT_MAX_LENGTH};
pub use frontmatter::{Frontmatter, FrontmatterError};
pub use post::{Post, PostLocation, PostMeta};
pub use store::{ContentError, ContentStore};
pub use visibility::{RuntimeMode, Visibility};
