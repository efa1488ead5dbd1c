//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kiji_content::{RuntimeMode, Visibility};
use kiji_site::{BuildConfig, StaticBuilder};

use crate::config::load_config;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static site...");

    let file_config = load_config(config_path)?;
    let visibility = Visibility::from_env(RuntimeMode::Production);

    tracing::debug!("Visibility: {:?}", visibility);

    let config = BuildConfig {
        content_dir: file_config.content.dir,
        output_dir: output.unwrap_or(file_config.build.output),
        public_dir: file_config.content.public_dir,
        minify: minify.unwrap_or(file_config.build.minify),
        site: file_config.site.with_env_overrides(),
        visibility,
    };

    let result = StaticBuilder::new(config)
        .build()
        .await
        .context("Build failed")?;

    tracing::info!(
        "Built {} pages ({} posts, {} tags) in {}ms",
        result.pages,
        result.posts,
        result.tags,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
