//! Paginated sitemaps and robots.txt.
//!
//! Sitemap `0` lists the static pages; sitemaps `1..=n` list posts in
//! chunks of [`POSTS_PER_SITEMAP`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use kiji_content::date::parse_date;
use kiji_content::PostMeta;

use crate::config::SiteConfig;
use crate::templates::TemplateEngine;

pub const POSTS_PER_SITEMAP: usize = 100;

/// One `<url>` of a sitemap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

#[derive(Serialize)]
struct SitemapRef {
    loc: String,
}

/// Ids of every sitemap for `post_count` posts.
pub fn sitemap_ids(post_count: usize) -> Vec<usize> {
    (0..=post_count.div_ceil(POSTS_PER_SITEMAP)).collect()
}

/// Site path of sitemap `id`.
pub fn sitemap_path(id: usize) -> String {
    format!("/sitemap/{id}.xml")
}

/// Entries of sitemap `id`, or `None` when there is no such sitemap.
pub fn entries(site: &SiteConfig, id: usize, posts: &[PostMeta], now: DateTime<Utc>) -> Option<Vec<SitemapEntry>> {
    if id == 0 {
        return Some(vec![SitemapEntry {
            loc: site.absolute_url("/"),
            lastmod: w3c_datetime(&now.naive_utc()),
            changefreq: "weekly",
            priority: "1.0",
        }]);
    }

    let start = (id - 1).checked_mul(POSTS_PER_SITEMAP)?;
    if start >= posts.len() {
        return None;
    }

    let chunk = &posts[start..posts.len().min(start + POSTS_PER_SITEMAP)];

    Some(
        chunk
            .iter()
            .map(|meta| SitemapEntry {
                loc: site.absolute_url(&site.post_path(meta)),
                lastmod: w3c_datetime(&parse_date(meta.last_modified()).unwrap_or(meta.created)),
                changefreq: "monthly",
                priority: "0.7",
            })
            .collect(),
    )
}

/// The sitemap index listing every chunk.
pub fn render_index(engine: &TemplateEngine, site: &SiteConfig, post_count: usize) -> Result<String, minijinja::Error> {
    let sitemaps: Vec<SitemapRef> = sitemap_ids(post_count)
        .into_iter()
        .map(|id| SitemapRef {
            loc: site.absolute_url(&sitemap_path(id)),
        })
        .collect();

    engine.render("sitemap_index.xml", minijinja::context! { sitemaps => sitemaps })
}

/// Sitemap `id`, or `None` when there is no such sitemap.
pub fn render_sitemap(
    engine: &TemplateEngine,
    site: &SiteConfig,
    id: usize,
    posts: &[PostMeta],
    now: DateTime<Utc>,
) -> Result<Option<String>, minijinja::Error> {
    let Some(entries) = entries(site, id, posts, now) else {
        return Ok(None);
    };

    engine
        .render("sitemap.xml", minijinja::context! { entries => entries })
        .map(Some)
}

pub fn robots_txt(site: &SiteConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\nSitemap: {}\n",
        site.absolute_url("/sitemap.xml")
    )
}

fn w3c_datetime(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn meta(index: usize, updated_at: Option<&str>) -> PostMeta {
        PostMeta {
            slug: format!("post-{index}"),
            year: "2024".to_string(),
            month: "01".to_string(),
            day: None,
            title: format!("Post {index}"),
            created_at: "2024-01-15".to_string(),
            updated_at: updated_at.map(str::to_string),
            tags: vec![],
            published: true,
            is_test: None,
            description: String::new(),
            created: parse_date("2024-01-15").unwrap(),
        }
    }

    fn site() -> SiteConfig {
        SiteConfig {
            base_url: "https://blog.example".to_string(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn counts_sitemaps() {
        assert_eq!(sitemap_ids(0), vec![0]);
        assert_eq!(sitemap_ids(1), vec![0, 1]);
        assert_eq!(sitemap_ids(100), vec![0, 1]);
        assert_eq!(sitemap_ids(101), vec![0, 1, 2]);
    }

    #[test]
    fn static_pages_sitemap() {
        let entries = entries(&site(), 0, &[], now()).unwrap();

        assert_eq!(
            entries,
            vec![SitemapEntry {
                loc: "https://blog.example/".to_string(),
                lastmod: "2024-06-01T00:00:00Z".to_string(),
                changefreq: "weekly",
                priority: "1.0",
            }]
        );
    }

    #[test]
    fn chunks_posts() {
        let posts: Vec<PostMeta> = (0..150).map(|i| meta(i, None)).collect();

        let first = entries(&site(), 1, &posts, now()).unwrap();
        let second = entries(&site(), 2, &posts, now()).unwrap();

        assert_eq!(first.len(), 100);
        assert_eq!(second.len(), 50);
        assert_eq!(second[0].loc, "https://blog.example/posts/2024/01/post-100");
        assert_eq!(second[0].changefreq, "monthly");
        assert_eq!(second[0].priority, "0.7");
        assert!(entries(&site(), 3, &posts, now()).is_none());
    }

    #[test]
    fn lastmod_prefers_updated_at() {
        let posts = vec![meta(0, Some("2024-03-02")), meta(1, None)];

        let entries = entries(&site(), 1, &posts, now()).unwrap();

        assert_eq!(entries[0].lastmod, "2024-03-02T00:00:00Z");
        assert_eq!(entries[1].lastmod, "2024-01-15T00:00:00Z");
    }

    #[test]
    fn renders_index_and_chunks() {
        let engine = TemplateEngine::new();
        let posts = vec![meta(0, None)];

        let index = render_index(&engine, &site(), posts.len()).unwrap().replace("&#x2f;", "/");
        let chunk = render_sitemap(&engine, &site(), 1, &posts, now())
            .unwrap()
            .unwrap()
            .replace("&#x2f;", "/");

        assert!(index.contains("<sitemapindex"));
        assert!(index.contains("<loc>https://blog.example/sitemap/0.xml</loc>"));
        assert!(index.contains("<loc>https://blog.example/sitemap/1.xml</loc>"));
        assert!(chunk.contains("<loc>https://blog.example/posts/2024/01/post-0</loc>"));
        assert!(render_sitemap(&engine, &site(), 2, &posts, now()).unwrap().is_none());
    }

    #[test]
    fn robots_points_at_index() {
        assert_eq!(
            robots_txt(&site()),
            "User-agent: *\nAllow: /\nSitemap: https://blog.example/sitemap.xml\n"
        );
    }
}
