//! Static site builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use walkdir::WalkDir;

use kiji_content::catalog::count_tags;
use kiji_content::{Catalog, ContentError, Post, PostMeta, Visibility};

use crate::assets::AssetPipeline;
use crate::config::{is_static_tag, SiteConfig};
use crate::og::OgError;
use crate::render::{RenderError, RenderTarget, SiteRenderer};
use crate::sitemap::sitemap_ids;

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Content root laid out as `YYYY/MM/<file>`
    pub content_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Static files copied verbatim to the output root
    pub public_dir: Option<PathBuf>,

    /// Minify CSS output
    pub minify: bool,

    /// Site metadata
    pub site: SiteConfig,

    /// Which posts are published in this build
    pub visibility: Visibility,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content/posts"),
            output_dir: PathBuf::from("dist"),
            public_dir: None,
            minify: true,
            site: SiteConfig::default(),
            visibility: Visibility::production(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of HTML pages generated
    pub pages: usize,

    /// Number of posts published
    pub posts: usize,

    /// Number of tag pages generated
    pub tags: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Failed to render {page}: {source}")]
    Render {
        page: String,
        #[source]
        source: RenderError,
    },

    #[error(transparent)]
    Og(#[from] OgError),

    #[error("Failed to copy public files: {0}")]
    Copy(#[from] walkdir::Error),

    #[error("Failed to remove {}: {source}", .path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output subdirectories owned by the builder.
const GENERATED_DIRS: &[&str] = &["posts", "tags", "og", "sitemap"];

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    renderer: SiteRenderer,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig) -> Self {
        let renderer = SiteRenderer::new(config.site.clone(), RenderTarget::Static);
        Self { config, renderer }
    }

    /// Build the static site.
    ///
    /// Content is read once up front; every page renders from that snapshot.
    /// Generated directories left by an earlier build are removed first.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let out = &self.config.output_dir;

        let catalog = Catalog::new(&self.config.content_dir);
        let posts = catalog.all_posts(self.config.visibility)?;
        let metas: Vec<PostMeta> = posts.iter().map(|post| post.meta.clone()).collect();

        tracing::info!(
            "Building {} posts from {}",
            posts.len(),
            self.config.content_dir.display()
        );

        self.clean_output()?;

        fs::create_dir_all(out).map_err(|source| BuildError::Write {
            path: out.clone(),
            source,
        })?;

        // Render post pages in parallel
        posts
            .par_iter()
            .map(|post| self.build_post(post, &metas))
            .collect::<Result<Vec<()>, BuildError>>()?;

        let home = self.renderer.home(&metas).map_err(render_error("index"))?;
        write_output(&out.join("index.html"), home)?;

        let tag_pages = self.build_tags(&metas)?;

        let not_found = self.renderer.not_found().map_err(render_error("404"))?;
        write_output(&out.join("404.html"), not_found)?;

        self.generate_feeds(&metas)?;
        self.generate_assets()?;
        self.copy_public()?;

        let duration = start.elapsed();

        Ok(BuildResult {
            pages: posts.len() + tag_pages + 2,
            posts: posts.len(),
            tags: tag_pages,
            duration_ms: duration.as_millis() as u64,
            output_dir: out.clone(),
        })
    }

    /// Remove directories written by a previous build. Files outside
    /// [`GENERATED_DIRS`] are left alone.
    fn clean_output(&self) -> Result<(), BuildError> {
        for dir in GENERATED_DIRS {
            let path = self.config.output_dir.join(dir);
            if !path.is_dir() {
                continue;
            }

            tracing::debug!("Removing {}", path.display());
            fs::remove_dir_all(&path).map_err(|source| BuildError::Clean { path, source })?;
        }

        Ok(())
    }

    /// Write a post page and its OG image.
    fn build_post(&self, post: &Post, metas: &[PostMeta]) -> Result<(), BuildError> {
        let meta = &post.meta;
        let out = &self.config.output_dir;

        let html = self
            .renderer
            .post(post, metas)
            .map_err(render_error(&self.config.site.post_path(meta)))?;

        write_output(
            &out.join("posts")
                .join(&meta.year)
                .join(&meta.month)
                .join(&meta.slug)
                .join("index.html"),
            html,
        )?;

        let svg = self
            .renderer
            .og_post(Some(meta.title.as_str()), Some(meta.created_at.as_str()))?;

        write_output(
            &out.join("og")
                .join("posts")
                .join(&meta.year)
                .join(&meta.month)
                .join(format!("{}.svg", meta.slug)),
            svg,
        )?;

        tracing::debug!("Built {}", self.config.site.post_path(meta));

        Ok(())
    }

    /// Write one page per tag. Returns the number of pages written.
    fn build_tags(&self, metas: &[PostMeta]) -> Result<usize, BuildError> {
        let mut written = 0;

        for tag in count_tags(metas) {
            if !is_static_tag(&tag.name) {
                tracing::warn!("Skipping tag page for {:?}: not a valid directory name", tag.name);
                continue;
            }

            let tagged: Vec<PostMeta> = metas
                .iter()
                .filter(|meta| meta.has_tag(&tag.name))
                .cloned()
                .collect();

            let html = self
                .renderer
                .tag(&tag.name, &tagged)
                .map_err(render_error(&self.config.site.tag_path(&tag.name)))?;

            write_output(
                &self.config.output_dir.join("tags").join(&tag.name).join("index.html"),
                html,
            )?;
            written += 1;
        }

        Ok(written)
    }

    /// Generate the RSS feed, sitemaps and robots.txt.
    fn generate_feeds(&self, metas: &[PostMeta]) -> Result<(), BuildError> {
        let out = &self.config.output_dir;
        let now = Utc::now();

        write_output(&out.join("rss.xml"), self.renderer.rss(metas, now))?;

        let index = self
            .renderer
            .sitemap_index(metas.len())
            .map_err(render_error("sitemap.xml"))?;
        write_output(&out.join("sitemap.xml"), index)?;

        for id in sitemap_ids(metas.len()) {
            let sitemap = self
                .renderer
                .sitemap(id, metas, now)
                .map_err(render_error("sitemap"))?;

            if let Some(sitemap) = sitemap {
                write_output(&out.join("sitemap").join(format!("{id}.xml")), sitemap)?;
            }
        }

        write_output(&out.join("robots.txt"), self.renderer.robots())?;

        Ok(())
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let out = &self.config.output_dir;

        write_output(&out.join("og").join("default.svg"), self.renderer.og_default()?)?;
        write_output(&out.join("assets").join("main.css"), AssetPipeline::css(self.config.minify))?;
        write_output(&out.join("assets").join("main.js"), AssetPipeline::js())?;

        Ok(())
    }

    /// Copy `public_dir` into the output root.
    fn copy_public(&self) -> Result<(), BuildError> {
        let Some(public) = &self.config.public_dir else {
            return Ok(());
        };

        if !public.is_dir() {
            tracing::warn!("Public directory {} not found, skipping", public.display());
            return Ok(());
        }

        for entry in WalkDir::new(public) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(public) else {
                continue;
            };

            let bytes = fs::read(entry.path()).map_err(|source| BuildError::Write {
                path: entry.path().to_path_buf(),
                source,
            })?;
            write_output(&self.config.output_dir.join(relative), bytes)?;
        }

        Ok(())
    }
}

fn render_error(page: &str) -> impl FnOnce(RenderError) -> BuildError + '_ {
    move |source| BuildError::Render {
        page: page.to_string(),
        source,
    }
}

/// Write a file, creating parent directories.
fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), BuildError> {
    let write_error = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    fs::write(path, contents).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_post(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn write_content(root: &Path) {
        write_post(
            root,
            "2024/05/10_hello-world.mdx",
            "---\ntitle: Hello, world\ncreatedAt: '2024-05-10'\ntags: [Rust, ブログ]\npublished: true\n---\n\n# Hello\n\nFirst post.\n",
        );
        write_post(
            root,
            "2024/06/second.mdx",
            "---\ntitle: Second\ncreatedAt: '2024-06-01'\nupdatedAt: '2024-06-03'\ntags: [Rust]\npublished: true\n---\n\nMore.\n",
        );
        write_post(
            root,
            "2024/06/draft.mdx",
            "---\ntitle: Draft\ncreatedAt: '2024-06-02'\ntags: [Rust]\npublished: false\n---\n\nWIP.\n",
        );
        write_post(
            root,
            "2099/01/01_markdown-test.mdx",
            "---\ntitle: テスト\ncreatedAt: '2099-01-01'\ntags: [テスト]\npublished: true\nisTest: true\n---\n\nテスト本文\n",
        );
    }

    fn config(root: &Path, visibility: Visibility) -> BuildConfig {
        BuildConfig {
            content_dir: root.join("content"),
            output_dir: root.join("dist"),
            visibility,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn builds_blog() {
        let temp = tempdir().unwrap();
        write_content(&temp.path().join("content"));
        let out = temp.path().join("dist");

        let builder = StaticBuilder::new(config(temp.path(), Visibility::production()));
        let result = builder.build().await.unwrap();

        assert_eq!(result.posts, 2);
        assert_eq!(result.tags, 2);
        assert_eq!(result.pages, 6);

        for file in [
            "index.html",
            "404.html",
            "posts/2024/05/hello-world/index.html",
            "posts/2024/06/second/index.html",
            "tags/Rust/index.html",
            "tags/ブログ/index.html",
            "rss.xml",
            "sitemap.xml",
            "sitemap/0.xml",
            "sitemap/1.xml",
            "robots.txt",
            "og/default.svg",
            "og/posts/2024/05/hello-world.svg",
            "assets/main.css",
            "assets/main.js",
        ] {
            assert!(out.join(file).is_file(), "missing {file}");
        }

        assert!(!out.join("posts/2024/06/draft").exists());
        assert!(!out.join("posts/2099").exists());
    }

    #[tokio::test]
    async fn pages_reflect_content() {
        let temp = tempdir().unwrap();
        write_content(&temp.path().join("content"));
        let out = temp.path().join("dist");

        StaticBuilder::new(config(temp.path(), Visibility::production()))
            .build()
            .await
            .unwrap();

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("Hello, world"));
        assert!(index.contains("Second"));
        assert!(!index.contains("Draft"));

        let post = fs::read_to_string(out.join("posts/2024/05/hello-world/index.html")).unwrap();
        assert!(post.contains("<h1>Hello</h1>"));
        assert!(post.contains("他の記事も読む"));

        let tag = fs::read_to_string(out.join("tags/Rust/index.html")).unwrap();
        assert!(tag.contains("このタグが付いた記事: 2件"));

        let rss = fs::read_to_string(out.join("rss.xml")).unwrap();
        assert_eq!(rss.matches("<item>").count(), 2);
    }

    #[tokio::test]
    async fn development_build_includes_test_posts() {
        let temp = tempdir().unwrap();
        write_content(&temp.path().join("content"));
        let out = temp.path().join("dist");

        let result = StaticBuilder::new(config(temp.path(), Visibility::development()))
            .build()
            .await
            .unwrap();

        assert_eq!(result.posts, 3);
        assert!(out.join("posts/2099/01/markdown-test/index.html").is_file());
        assert!(out.join("tags/テスト/index.html").is_file());
    }

    #[tokio::test]
    async fn malformed_post_fails_the_build() {
        let temp = tempdir().unwrap();
        let content = temp.path().join("content");
        write_content(&content);
        write_post(&content, "2024/07/broken.mdx", "---\ntitle: Broken\n---\n");

        let result = StaticBuilder::new(config(temp.path(), Visibility::production()))
            .build()
            .await;

        assert!(matches!(
            result,
            Err(BuildError::Content(ContentError::Validation { .. }))
        ));
    }

    #[tokio::test]
    async fn missing_content_dir_fails_the_build() {
        let temp = tempdir().unwrap();

        let result = StaticBuilder::new(config(temp.path(), Visibility::production()))
            .build()
            .await;

        assert!(matches!(
            result,
            Err(BuildError::Content(ContentError::RootNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn copies_public_files() {
        let temp = tempdir().unwrap();
        write_content(&temp.path().join("content"));
        write_post(&temp.path().join("public"), "images/sample.png", "png");

        let config = BuildConfig {
            public_dir: Some(temp.path().join("public")),
            ..config(temp.path(), Visibility::production())
        };
        StaticBuilder::new(config).build().await.unwrap();

        let copied = fs::read_to_string(temp.path().join("dist/images/sample.png")).unwrap();
        assert_eq!(copied, "png");
    }

    #[tokio::test]
    async fn narrower_rebuild_removes_stale_pages() {
        let temp = tempdir().unwrap();
        write_content(&temp.path().join("content"));
        let out = temp.path().join("dist");

        StaticBuilder::new(config(temp.path(), Visibility::development()))
            .build()
            .await
            .unwrap();
        assert!(out.join("posts/2099/01/markdown-test/index.html").is_file());

        fs::write(out.join("CNAME"), "blog.example").unwrap();

        StaticBuilder::new(config(temp.path(), Visibility::production()))
            .build()
            .await
            .unwrap();

        assert!(!out.join("posts/2099").exists());
        assert!(!out.join("og/posts/2099").exists());
        assert!(!out.join("tags/テスト").exists());
        assert!(out.join("posts/2024/05/hello-world/index.html").is_file());
        assert!(out.join("og/default.svg").is_file());
        assert_eq!(fs::read_to_string(out.join("CNAME")).unwrap(), "blog.example");
    }

    #[tokio::test]
    async fn tags_without_a_page_are_not_linked() {
        let temp = tempdir().unwrap();
        let content = temp.path().join("content");
        write_post(
            &content,
            "2024/05/cpp.mdx",
            "---\ntitle: Templates\ncreatedAt: '2024-05-01'\ntags: ['C/C++', Rust]\npublished: true\n---\n\nBody\n",
        );
        let out = temp.path().join("dist");

        let result = StaticBuilder::new(config(temp.path(), Visibility::production()))
            .build()
            .await
            .unwrap();

        assert_eq!(result.tags, 1);
        assert!(out.join("tags/Rust/index.html").is_file());
        assert!(!out.join("tags/C").exists());

        let index = fs::read_to_string(out.join("index.html"))
            .unwrap()
            .replace("&#x2f;", "/");
        assert!(!index.contains("/tags/C%2FC++"));
        assert!(index.contains(r#"<span class="tag">C/C++</span>"#));
        assert!(index.contains(r#"href="/tags/Rust""#));
    }
}
