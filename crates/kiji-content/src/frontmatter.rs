//! Frontmatter extraction and validation.

use chrono::NaiveDateTime;
use serde_yaml::{Mapping, Value};

use crate::date::parse_date;

/// Validated frontmatter of a post file.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    /// Post title (required)
    pub title: String,

    /// Creation date as authored (required)
    pub created_at: String,

    /// Parsed `created_at`, used for ordering
    pub created: NaiveDateTime,

    /// Last update date as authored
    pub updated_at: Option<String>,

    /// Tags in authored order
    pub tags: Vec<String>,

    /// Whether the post may be listed at all
    pub published: bool,

    /// Marks fixture posts that production hides
    pub is_test: Option<bool>,

    /// Authored description, overrides the generated excerpt
    pub description: Option<String>,
}

/// Split a source file into its frontmatter YAML and body.
///
/// A leading byte order mark is ignored. The body has leading blank lines
/// removed.
pub fn split_frontmatter(source: &str) -> Result<(&str, &str), FrontmatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let trimmed = source.trim_start();

    if !trimmed.starts_with("---") {
        return Err(FrontmatterError::Missing);
    }

    // Find the closing ---
    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml = &after_open[..close_pos];
    let rest = &after_open[close_pos + 4..];

    // Drop the remainder of the closing fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => "",
    };

    Ok((yaml, body.trim_start_matches(['\n', '\r'])))
}

/// Parse and validate a frontmatter YAML block.
pub fn parse_frontmatter(yaml: &str) -> Result<Frontmatter, FrontmatterError> {
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    let Value::Mapping(map) = value else {
        return Err(FrontmatterError::NotAMapping);
    };

    let title = required_string(&map, "title")?;
    let created_at = required_string(&map, "createdAt")?;
    let created = parse_date(&created_at).ok_or_else(|| FrontmatterError::InvalidDate {
        field: "createdAt",
        value: created_at.clone(),
    })?;

    let updated_at = optional_string(&map, "updatedAt")?;
    if let Some(updated) = &updated_at {
        if parse_date(updated).is_none() {
            return Err(FrontmatterError::InvalidDate {
                field: "updatedAt",
                value: updated.clone(),
            });
        }
    }

    let tags = match map.get("tags") {
        None => return Err(FrontmatterError::MissingField("tags")),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(tag) => Ok(tag.clone()),
                _ => Err(FrontmatterError::InvalidField {
                    field: "tags",
                    expected: "an array of strings",
                }),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(FrontmatterError::InvalidField {
                field: "tags",
                expected: "an array of strings",
            })
        }
    };

    let published = match map.get("published") {
        None => return Err(FrontmatterError::MissingField("published")),
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(FrontmatterError::InvalidField {
                field: "published",
                expected: "a boolean",
            })
        }
    };

    let is_test = match map.get("isTest") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            return Err(FrontmatterError::InvalidField {
                field: "isTest",
                expected: "a boolean",
            })
        }
    };

    let description = optional_string(&map, "description")?;

    Ok(Frontmatter {
        title,
        created_at,
        created,
        updated_at,
        tags,
        published,
        is_test,
        description,
    })
}

/// Split and validate in one step, returning the frontmatter and body.
pub fn extract_frontmatter(source: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let (yaml, body) = split_frontmatter(source)?;
    Ok((parse_frontmatter(yaml)?, body))
}

fn required_string(map: &Mapping, field: &'static str) -> Result<String, FrontmatterError> {
    optional_string(map, field)?.ok_or(FrontmatterError::MissingField(field))
}

fn optional_string(map: &Mapping, field: &'static str) -> Result<Option<String>, FrontmatterError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(FrontmatterError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Missing frontmatter block - file must start with ---")]
    Missing,

    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter must be a mapping of fields")]
    NotAMapping,

    #[error("Missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field `{field}` is not a recognised date: {value:?}")]
    InvalidDate { field: &'static str, value: String },
}
