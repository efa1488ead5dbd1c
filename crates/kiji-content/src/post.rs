//! Post types produced by the content store.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::description::resolve_description;
use crate::frontmatter::Frontmatter;

/// Where a post lives in the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PostLocation {
    /// Four-digit year directory
    pub year: String,
    /// Two-digit month directory
    pub month: String,
    /// Slug derived from the file name
    pub slug: String,
}

impl PostLocation {
    pub fn new(year: impl Into<String>, month: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
            slug: slug.into(),
        }
    }
}

/// Metadata of a post, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    pub slug: String,
    pub year: String,
    pub month: String,

    /// Ordering prefix from the file name (`01_slug.mdx`)
    pub day: Option<u8>,

    pub title: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub is_test: Option<bool>,

    /// Authored or generated excerpt, never empty unless the body is
    pub description: String,

    /// Parsed `created_at`
    #[serde(skip)]
    pub created: NaiveDateTime,
}

impl PostMeta {
    /// The `(year, month, slug)` triple identifying this post.
    pub fn location(&self) -> PostLocation {
        PostLocation::new(&self.year, &self.month, &self.slug)
    }

    pub fn is_at(&self, location: &PostLocation) -> bool {
        self.year == location.year && self.month == location.month && self.slug == location.slug
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// `updated_at` when authored, else `created_at`.
    pub fn last_modified(&self) -> &str {
        self.updated_at.as_deref().unwrap_or(&self.created_at)
    }
}

/// A post with its body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub meta: PostMeta,

    /// Markdown body without the frontmatter block
    pub content: String,
}

impl Post {
    /// Merge validated frontmatter with the file's location.
    pub fn from_parts(
        location: PostLocation,
        day: Option<u8>,
        frontmatter: Frontmatter,
        content: &str,
    ) -> Self {
        let description = resolve_description(frontmatter.description.as_deref(), content);

        Self {
            meta: PostMeta {
                slug: location.slug,
                year: location.year,
                month: location.month,
                day,
                title: frontmatter.title,
                created_at: frontmatter.created_at,
                updated_at: frontmatter.updated_at,
                tags: frontmatter.tags,
                published: frontmatter.published,
                is_test: frontmatter.is_test,
                description,
                created: frontmatter.created,
            },
            content: content.to_string(),
        }
    }
}
