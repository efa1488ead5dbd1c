//! Scaffold a new blog.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing kiji...");

    let today = Local::now().date_naive();
    let created = scaffold(config_path, Path::new("content/posts"), today, yes)?;

    for path in &created {
        tracing::info!("Created {}", path.display());
    }

    if created.is_empty() {
        tracing::warn!("Nothing created; files already exist. Use --yes to overwrite.");
        return Ok(());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'kiji dev' to start the development server.");

    Ok(())
}

/// Write the config file and a first post dated `today`.
///
/// Existing files are kept unless `overwrite` is set. Returns the files written.
fn scaffold(config_path: &Path, content_dir: &Path, today: NaiveDate, overwrite: bool) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    if !config_path.exists() || overwrite {
        fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        created.push(config_path.to_path_buf());
    }

    let month_dir = content_dir
        .join(today.format("%Y").to_string())
        .join(today.format("%m").to_string());
    let post_path = month_dir.join(format!("{}_hello-world.mdx", today.format("%d")));

    if !post_path.exists() || overwrite {
        fs::create_dir_all(&month_dir)
            .with_context(|| format!("Failed to create {}", month_dir.display()))?;

        let post = DEFAULT_POST.replace("{{date}}", &today.format("%Y-%m-%d").to_string());
        fs::write(&post_path, post)
            .with_context(|| format!("Failed to write {}", post_path.display()))?;
        created.push(post_path);
    }

    Ok(created)
}

const DEFAULT_CONFIG: &str = r#"# kiji configuration

[site]
title = "Tech Blog"
description = "技術的な学びを共有するブログです"
# Overridden by KIJI_BASE_URL
base_url = "http://localhost:3000"
language = "ja"
author = "Tech Blog Author"

[content]
# Posts live at <dir>/<YYYY>/<MM>/<file>.mdx
dir = "content/posts"
# public_dir = "public"

[build]
output = "dist"
minify = true

[server]
port = 3000
live_reload = true
"#;

const DEFAULT_POST: &str = r#"---
title: はじめての投稿
createdAt: '{{date}}'
tags: ['お知らせ']
published: true
---

ブログを始めました。

## 書き方

`content/posts/<年>/<月>/` にフロントマター付きの `.mdx` ファイルを置くと記事になります。

<LinkCard url="https://github.com/himi/kiji" />
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use kiji_content::{Catalog, Visibility};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    #[test]
    fn scaffolds_config_and_post() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("blog.toml");
        let content = temp.path().join("content/posts");

        let created = scaffold(&config, &content, today(), false).unwrap();

        assert_eq!(
            created,
            vec![config.clone(), content.join("2024/05/10_hello-world.mdx")]
        );

        let posts = Catalog::new(&content)
            .all_posts_meta(Visibility::production())
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "hello-world");
        assert_eq!(posts[0].created_at, "2024-05-10");
    }

    #[test]
    fn keeps_existing_files() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("blog.toml");
        let content = temp.path().join("content/posts");
        fs::write(&config, "[site]\ntitle = \"Mine\"\n").unwrap();

        scaffold(&config, &content, today(), false).unwrap();
        let second = scaffold(&config, &content, today(), false).unwrap();

        assert!(second.is_empty());
        assert_eq!(fs::read_to_string(&config).unwrap(), "[site]\ntitle = \"Mine\"\n");
    }

    #[test]
    fn default_config_parses() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("blog.toml");
        fs::write(&config, DEFAULT_CONFIG).unwrap();

        let parsed = crate::config::load_config(&config).unwrap();

        assert_eq!(parsed.site.title, "Tech Blog");
        assert_eq!(parsed.server.port, 3000);
    }
}
