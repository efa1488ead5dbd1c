//! Filesystem-backed content store.
//!
//! The store reads `<root>/<YYYY>/<MM>/<file>` on every call and keeps no
//! state between calls.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::frontmatter::{extract_frontmatter, FrontmatterError};
use crate::post::{Post, PostLocation};

/// File extensions read as posts.
const EXTENSIONS: &[&str] = &["mdx", "md"];

/// Errors that can occur while reading content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Content directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid frontmatter in post {}: {source}", .path.display())]
    Validation {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error(
        "Duplicate post {year}/{month}/{slug}: {} and {}",
        .first.display(),
        .second.display()
    )]
    DuplicateSlug {
        year: String,
        month: String,
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Reads posts from a `year/month/file` directory tree.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every post in the tree.
    ///
    /// Fails on the first file whose frontmatter does not validate.
    pub fn list_raw_posts(&self) -> Result<Vec<Post>, ContentError> {
        if !self.root.is_dir() {
            return Err(ContentError::RootNotFound(self.root.clone()));
        }

        let mut posts = Vec::new();
        let mut seen: HashMap<PostLocation, PathBuf> = HashMap::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .min_depth(1)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_layout_entry);

        for entry in walker {
            let entry = entry?;

            if entry.depth() != 3 || !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some((slug, day)) = content_file_slug(path) else {
                tracing::debug!("Skipping non-post file {}", path.display());
                continue;
            };

            let (year, month) = parent_dirs(path);
            let location = PostLocation::new(year, month, slug);

            if let Some(first) = seen.insert(location.clone(), path.to_path_buf()) {
                return Err(duplicate(location, first, path.to_path_buf()));
            }

            posts.push(read_post(path, location, day)?);
        }

        tracing::debug!("Read {} posts from {}", posts.len(), self.root.display());

        Ok(posts)
    }

    /// Read the post at `year/month/slug`.
    ///
    /// `slug` may be the canonical slug or the full file stem including
    /// its ordering prefix. A missing directory or file is `Ok(None)`.
    pub fn raw_post(&self, year: &str, month: &str, slug: &str) -> Result<Option<Post>, ContentError> {
        if !is_year(year) || !is_month(month) || !is_safe_component(slug) {
            return Ok(None);
        }

        let dir = self.root.join(year).join(month);
        if !dir.is_dir() {
            return Ok(None);
        }

        let entries = fs::read_dir(&dir).map_err(|source| ContentError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut matched: Option<(PathBuf, String, Option<u8>)> = None;

        for entry in entries {
            let entry = entry.map_err(|source| ContentError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let Some((canonical, day)) = content_file_slug(&path) else {
                continue;
            };

            let stem_matches = path.file_stem().and_then(|s| s.to_str()) == Some(slug);
            if canonical != slug && !stem_matches {
                continue;
            }

            if let Some((first, _, _)) = matched.take() {
                let location = PostLocation::new(year, month, canonical);
                return Err(duplicate(location, first, path));
            }

            matched = Some((path, canonical, day));
        }

        let Some((path, canonical, day)) = matched else {
            return Ok(None);
        };

        let location = PostLocation::new(year, month, canonical);
        read_post(&path, location, day).map(Some)
    }
}

/// Read and validate a single post file.
fn read_post(path: &Path, location: PostLocation, day: Option<u8>) -> Result<Post, ContentError> {
    let source = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (frontmatter, body) =
        extract_frontmatter(&source).map_err(|source| ContentError::Validation {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Post::from_parts(location, day, frontmatter, body))
}

fn duplicate(location: PostLocation, first: PathBuf, second: PathBuf) -> ContentError {
    ContentError::DuplicateSlug {
        year: location.year,
        month: location.month,
        slug: location.slug,
        first,
        second,
    }
}

/// Prune the walk to `YYYY/MM/*`.
fn is_layout_entry(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_str().unwrap_or("");
    let keep = match entry.depth() {
        1 => entry.file_type().is_dir() && is_year(name),
        2 => entry.file_type().is_dir() && is_month(name),
        _ => true,
    };

    if !keep {
        tracing::debug!("Skipping {} outside the year/month layout", entry.path().display());
    }
    keep
}

fn parent_dirs(path: &Path) -> (String, String) {
    let name = |p: Option<&Path>| {
        p.and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    let month_dir = path.parent();
    let year_dir = month_dir.and_then(Path::parent);
    (name(year_dir), name(month_dir))
}

/// Canonical slug and ordering prefix of a post file, if it is one.
fn content_file_slug(path: &Path) -> Option<(String, Option<u8>)> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    if !EXTENSIONS.contains(&ext) {
        return None;
    }

    let stem = path.file_stem().and_then(|s| s.to_str())?;
    if stem.is_empty() {
        return None;
    }

    Some(parse_stem(stem))
}

/// Split `01_some-slug` into `("some-slug", Some(1))`.
fn parse_stem(stem: &str) -> (String, Option<u8>) {
    let bytes = stem.as_bytes();
    let prefixed = bytes.len() > 3
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b'_';

    if prefixed {
        if let Ok(day) = stem[..2].parse::<u8>() {
            return (stem[3..].to_string(), Some(day));
        }
    }

    (stem.to_string(), None)
}

fn is_year(name: &str) -> bool {
    name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit())
}

fn is_month(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|b| b.is_ascii_digit())
}

fn is_safe_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
