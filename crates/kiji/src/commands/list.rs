//! Print the posts a deployment would publish.

use std::path::Path;

use anyhow::Result;
use kiji_content::{Catalog, PostMeta, RuntimeMode, Visibility};
use kiji_site::SiteConfig;

use crate::config::load_config;

/// Run the list command.
pub fn run(config_path: &Path, tag: Option<String>, production: bool) -> Result<()> {
    let file_config = load_config(config_path)?;

    let visibility = list_visibility(production, |key| std::env::var(key).ok());

    let catalog = Catalog::new(&file_config.content.dir);
    let posts = match tag.as_deref() {
        Some(tag) => catalog.posts_by_tag(tag, visibility)?,
        None => catalog.all_posts_meta(visibility)?,
    };

    for post in &posts {
        println!("{}", post_line(&file_config.site, post));
    }

    tracing::info!("{} posts ({:?})", posts.len(), visibility.mode);

    Ok(())
}

/// `--production` wins over the environment; otherwise the environment
/// decides, defaulting to development.
fn list_visibility(production: bool, lookup: impl Fn(&str) -> Option<String>) -> Visibility {
    if production {
        Visibility::production()
    } else {
        Visibility::from_lookup(RuntimeMode::Development, lookup)
    }
}

fn post_line(site: &SiteConfig, meta: &PostMeta) -> String {
    let mut line = format!(
        "{}  {}  {}",
        meta.created.format("%Y-%m-%d"),
        site.post_path(meta),
        meta.title
    );

    if !meta.tags.is_empty() {
        line.push_str(&format!("  [{}]", meta.tags.join(", ")));
    }
    if meta.is_test == Some(true) {
        line.push_str("  (test)");
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiji_content::date::parse_date;
    use pretty_assertions::assert_eq;

    fn meta(tags: &[&str], is_test: Option<bool>) -> PostMeta {
        PostMeta {
            slug: "hello-world".to_string(),
            year: "2024".to_string(),
            month: "05".to_string(),
            day: Some(10),
            title: "Hello, world".to_string(),
            created_at: "2024-5-10".to_string(),
            updated_at: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published: true,
            is_test,
            description: String::new(),
            created: parse_date("2024-5-10").unwrap(),
        }
    }

    #[test]
    fn production_flag_overrides_environment() {
        let env = |key: &str| match key {
            "KIJI_ENV" => Some("development".to_string()),
            "KIJI_SHOW_TEST_POSTS" => Some("true".to_string()),
            _ => None,
        };

        assert_eq!(list_visibility(true, env), Visibility::production());
        assert!(!list_visibility(true, env).shows_test_posts());
        assert!(list_visibility(false, env).shows_test_posts());
        assert_eq!(
            list_visibility(false, |_| None),
            Visibility::development()
        );
    }

    #[test]
    fn formats_post_line() {
        assert_eq!(
            post_line(&SiteConfig::default(), &meta(&["Rust", "ブログ"], None)),
            "2024-05-10  /posts/2024/05/hello-world  Hello, world  [Rust, ブログ]"
        );
    }

    #[test]
    fn marks_test_posts() {
        assert_eq!(
            post_line(&SiteConfig::default(), &meta(&[], Some(true))),
            "2024-05-10  /posts/2024/05/hello-world  Hello, world  (test)"
        );
    }
}
