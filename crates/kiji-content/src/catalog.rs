//! Filtered, ordered queries over the content store.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::post::{Post, PostLocation, PostMeta};
use crate::store::{ContentError, ContentStore};
use crate::visibility::Visibility;

/// A tag and the number of visible posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Read-through catalog of posts.
///
/// Every query rescans the store; visibility is passed per call.
#[derive(Debug, Clone)]
pub struct Catalog {
    store: ContentStore,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: ContentStore::new(root),
        }
    }

    pub fn from_store(store: ContentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// All visible posts with their bodies, newest first, from a single
    /// read of the content tree.
    pub fn all_posts(&self, visibility: Visibility) -> Result<Vec<Post>, ContentError> {
        let mut posts: Vec<Post> = self
            .store
            .list_raw_posts()?
            .into_iter()
            .filter(|post| visibility.allows(&post.meta))
            .collect();

        posts.sort_by_key(|post| Reverse((post.meta.created, post.meta.day)));

        Ok(posts)
    }

    /// All visible posts, newest first.
    pub fn all_posts_meta(&self, visibility: Visibility) -> Result<Vec<PostMeta>, ContentError> {
        Ok(self
            .all_posts(visibility)?
            .into_iter()
            .map(|post| post.meta)
            .collect())
    }

    /// A single post with its body. Not filtered by visibility.
    pub fn post(&self, year: &str, month: &str, slug: &str) -> Result<Option<Post>, ContentError> {
        self.store.raw_post(year, month, slug)
    }

    /// Visible posts carrying exactly `tag`, newest first.
    pub fn posts_by_tag(&self, tag: &str, visibility: Visibility) -> Result<Vec<PostMeta>, ContentError> {
        if tag.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .all_posts_meta(visibility)?
            .into_iter()
            .filter(|meta| meta.has_tag(tag))
            .collect())
    }

    /// Distinct tags of visible posts, most used first.
    pub fn tags(&self, visibility: Visibility) -> Result<Vec<TagCount>, ContentError> {
        Ok(count_tags(&self.all_posts_meta(visibility)?))
    }

    /// The newest `limit` visible posts other than `exclude`.
    pub fn recent_posts(
        &self,
        limit: usize,
        exclude: Option<&PostLocation>,
        visibility: Visibility,
    ) -> Result<Vec<PostMeta>, ContentError> {
        Ok(self
            .all_posts_meta(visibility)?
            .into_iter()
            .filter(|meta| exclude.is_none_or(|location| !meta.is_at(location)))
            .take(limit)
            .collect())
    }
}

/// Count tag usage across posts, counting a tag once per post.
pub fn count_tags(posts: &[PostMeta]) -> Vec<TagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for post in posts {
        let mut seen: Vec<&str> = Vec::new();
        for tag in &post.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag);
                *counts.entry(tag).or_default() += 1;
            }
        }
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(name, count)| TagCount {
            name: name.to_string(),
            count,
        })
        .collect();

    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    tags
}
