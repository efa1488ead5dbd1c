//! Page renderer shared by the dev server and the static builder.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use minijinja::context;
use regex::Regex;
use serde::Serialize;

use kiji_content::{Post, PostMeta};

use crate::config::{is_static_tag, SiteConfig};
use crate::feed;
use crate::og::{self, OgError};
use crate::sitemap;
use crate::templates::TemplateEngine;

/// Number of other posts listed under a post.
pub const OTHER_POSTS_LIMIT: usize = 3;

static LINK_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<LinkCard\s+url=["'](https?://[^"'\s<>]+)["']\s*/>"#).unwrap()
});

/// Where rendered pages are going to be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Rendered per request by the server
    Server { live_reload: bool },

    /// Written to disk by the static builder
    Static,
}

impl RenderTarget {
    pub fn feed_path(&self) -> &'static str {
        match self {
            Self::Server { .. } => "/api/rss",
            Self::Static => "/rss.xml",
        }
    }

    pub fn live_reload(&self) -> bool {
        matches!(self, Self::Server { live_reload: true })
    }

    /// Whether `tag` has a page to link to.
    pub fn has_tag_page(&self, tag: &str) -> bool {
        match self {
            Self::Server { .. } => !tag.is_empty(),
            Self::Static => is_static_tag(tag),
        }
    }

    fn default_og_image(&self, site: &SiteConfig) -> String {
        match self {
            Self::Server { .. } => site.absolute_url("/api/og"),
            Self::Static => site.absolute_url("/og/default.svg"),
        }
    }

    fn post_og_image(&self, site: &SiteConfig, meta: &PostMeta) -> String {
        match self {
            Self::Server { .. } => site.og_post_query_url(meta),
            Self::Static => site.og_post_file_url(meta),
        }
    }
}

/// Errors that can occur while rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to render template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Failed to serialize structured data: {0}")]
    Json(#[from] serde_json::Error),
}

/// `<head>` metadata of a page.
#[derive(Debug, Serialize)]
struct PageHead {
    title: String,
    description: String,
    canonical: Option<String>,
    og_title: String,
    og_type: &'static str,
    og_image: String,
    published_time: Option<String>,
    article_tags: Vec<String>,
    json_ld: Option<String>,
}

#[derive(Debug, Serialize)]
struct TagLink {
    name: String,
    /// `None` when the tag has no page on this target
    url: Option<String>,
}

/// A post as shown in lists.
#[derive(Debug, Serialize)]
struct PostCard {
    title: String,
    url: String,
    date: String,
    date_short: String,
    date_iso: String,
    description: String,
    tags: Vec<TagLink>,
}

/// Renders pages, feeds, sitemaps and OG images for one site.
pub struct SiteRenderer {
    site: SiteConfig,
    target: RenderTarget,
    templates: TemplateEngine,
}

impl SiteRenderer {
    pub fn new(site: SiteConfig, target: RenderTarget) -> Self {
        Self {
            site,
            target,
            templates: TemplateEngine::new(),
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// Home page listing `posts`.
    pub fn home(&self, posts: &[PostMeta]) -> Result<String, RenderError> {
        let head = PageHead {
            title: format!("{} - {}", self.site.title, self.site.description),
            description: self.site.description.clone(),
            canonical: Some(self.site.absolute_url("/")),
            og_title: self.site.title.clone(),
            og_type: "website",
            og_image: self.target.default_og_image(&self.site),
            published_time: None,
            article_tags: Vec::new(),
            json_ld: None,
        };

        self.page("home.html", head, context! { posts => self.cards(posts) })
    }

    /// Post page with up to [`OTHER_POSTS_LIMIT`] other posts.
    pub fn post(&self, post: &Post, others: &[PostMeta]) -> Result<String, RenderError> {
        let meta = &post.meta;
        let url = self.site.absolute_url(&self.site.post_path(meta));
        let og_image = self.target.post_og_image(&self.site, meta);

        let head = PageHead {
            title: format!("{} | {}", meta.title, self.site.title),
            description: meta.description.clone(),
            canonical: Some(url.clone()),
            og_title: meta.title.clone(),
            og_type: "article",
            og_image: og_image.clone(),
            published_time: Some(iso_timestamp(&meta.created)),
            article_tags: meta.tags.clone(),
            json_ld: Some(self.json_ld(meta, &url, &og_image)?),
        };

        let others: Vec<PostCard> = others
            .iter()
            .filter(|other| !other.is_at(&meta.location()))
            .take(OTHER_POSTS_LIMIT)
            .map(|other| self.card(other))
            .collect();

        self.page(
            "post.html",
            head,
            context! {
                post => self.card(meta),
                content => render_markdown(&post.content),
                others => others,
            },
        )
    }

    /// Tag page listing `posts`.
    pub fn tag(&self, tag: &str, posts: &[PostMeta]) -> Result<String, RenderError> {
        let title = format!("{}に関する記事 | {}", tag, self.site.title);

        let head = PageHead {
            title: title.clone(),
            description: format!("{tag}タグが付いた記事の一覧です。"),
            canonical: Some(self.site.absolute_url(&self.site.tag_path(tag))),
            og_title: title,
            og_type: "website",
            og_image: self.target.default_og_image(&self.site),
            published_time: None,
            article_tags: Vec::new(),
            json_ld: None,
        };

        self.page("tag.html", head, context! { tag => tag, posts => self.cards(posts) })
    }

    pub fn not_found(&self) -> Result<String, RenderError> {
        let head = PageHead {
            title: format!("記事が見つかりません | {}", self.site.title),
            description: "指定された記事は存在しないか、削除された可能性があります。".to_string(),
            canonical: None,
            og_title: "記事が見つかりません".to_string(),
            og_type: "website",
            og_image: self.target.default_og_image(&self.site),
            published_time: None,
            article_tags: Vec::new(),
            json_ld: None,
        };

        self.page("not_found.html", head, context! {})
    }

    /// Error page showing `message`.
    pub fn error(&self, message: &str) -> Result<String, RenderError> {
        let head = PageHead {
            title: format!("エラー | {}", self.site.title),
            description: self.site.description.clone(),
            canonical: None,
            og_title: self.site.title.clone(),
            og_type: "website",
            og_image: self.target.default_og_image(&self.site),
            published_time: None,
            article_tags: Vec::new(),
            json_ld: None,
        };

        self.page("error.html", head, context! { message => message })
    }

    /// RSS 2.0 feed of the newest posts.
    pub fn rss(&self, posts: &[PostMeta], now: DateTime<Utc>) -> String {
        feed::build_rss(&self.site, posts, self.target.feed_path(), now)
    }

    pub fn sitemap_index(&self, post_count: usize) -> Result<String, RenderError> {
        Ok(sitemap::render_index(&self.templates, &self.site, post_count)?)
    }

    /// Sitemap chunk `id`, or `None` past the last chunk.
    pub fn sitemap(&self, id: usize, posts: &[PostMeta], now: DateTime<Utc>) -> Result<Option<String>, RenderError> {
        Ok(sitemap::render_sitemap(&self.templates, &self.site, id, posts, now)?)
    }

    pub fn robots(&self) -> String {
        sitemap::robots_txt(&self.site)
    }

    pub fn og_default(&self) -> Result<String, OgError> {
        og::render_default(&self.templates, &self.site)
    }

    pub fn og_post(&self, title: Option<&str>, date: Option<&str>) -> Result<String, OgError> {
        og::render_post(&self.templates, &self.site, title, date)
    }

    fn page(
        &self,
        template: &str,
        head: PageHead,
        extra: minijinja::Value,
    ) -> Result<String, RenderError> {
        let context = context! {
            site => &self.site,
            page => head,
            feed_path => self.target.feed_path(),
            live_reload => self.target.live_reload(),
            year => Utc::now().year(),
            ..extra
        };

        Ok(self.templates.render(template, context)?)
    }

    fn cards(&self, posts: &[PostMeta]) -> Vec<PostCard> {
        posts.iter().map(|meta| self.card(meta)).collect()
    }

    fn card(&self, meta: &PostMeta) -> PostCard {
        PostCard {
            title: meta.title.clone(),
            url: self.site.post_path(meta),
            date: format_date_ja(&meta.created),
            date_short: format_date_ja_short(&meta.created),
            date_iso: meta.created.format("%Y-%m-%d").to_string(),
            description: meta.description.clone(),
            tags: meta
                .tags
                .iter()
                .map(|tag| TagLink {
                    name: tag.clone(),
                    url: self.target.has_tag_page(tag).then(|| self.site.tag_path(tag)),
                })
                .collect(),
        }
    }

    /// `BlogPosting` structured data, safe to embed in a `<script>` element.
    fn json_ld(&self, meta: &PostMeta, url: &str, image: &str) -> Result<String, RenderError> {
        let data = serde_json::json!({
            "@context": "https://schema.org",
            "@type": "BlogPosting",
            "headline": meta.title,
            "description": meta.description,
            "datePublished": meta.created_at,
            "dateModified": meta.last_modified(),
            "image": image,
            "author": {
                "@type": "Person",
                "name": self.site.author,
            },
            "publisher": {
                "@type": "Organization",
                "name": self.site.title,
            },
            "mainEntityOfPage": {
                "@type": "WebPage",
                "@id": url,
            },
            "keywords": meta.tags.join(", "),
        });

        Ok(serde_json::to_string(&data)?.replace("</", "<\\/"))
    }
}

/// Render a post body to HTML.
///
/// `<LinkCard url="..." />` becomes a plain link; other inline HTML passes
/// through unchanged.
pub fn render_markdown(content: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let content = LINK_CARD.replace_all(content, r#"<a class="link-card" href="$1">$1</a>"#);

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(&content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

/// `2024年5月10日`
pub fn format_date_ja(date: &NaiveDateTime) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// `2024/5/10`
pub fn format_date_ja_short(date: &NaiveDateTime) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day())
}

fn iso_timestamp(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
