//! Site metadata and URL helpers.

use serde::{Deserialize, Serialize};
use url::form_urlencoded::Serializer;
use url::Url;

use kiji_content::PostMeta;

/// Overrides `base_url` when set.
pub const ENV_BASE_URL: &str = "KIJI_BASE_URL";

/// Metadata describing the blog as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title, shown in the header and page titles
    pub title: String,

    /// One-line description of the blog
    pub description: String,

    /// Absolute origin the site is served from, e.g. `https://example.com`
    pub base_url: String,

    /// `lang` attribute and RSS language
    pub language: String,

    /// Author named in structured data
    pub author: String,

    /// Link shown in the footer
    pub social_url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Tech Blog".to_string(),
            description: "技術的な学びを共有するブログです".to_string(),
            base_url: "http://localhost:3000".to_string(),
            language: "ja".to_string(),
            author: "Tech Blog Author".to_string(),
            social_url: None,
        }
    }
}

impl SiteConfig {
    /// Apply `KIJI_BASE_URL` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(ENV_BASE_URL).ok())
    }

    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(base_url) = base_url.filter(|b| !b.trim().is_empty()) {
            tracing::debug!("Using base URL {} from {}", base_url, ENV_BASE_URL);
            self.base_url = base_url;
        }
        self
    }

    /// Join a site path onto `base_url`. A missing leading `/` is added.
    pub fn absolute_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// `/posts/<year>/<month>/<slug>`, percent-encoded.
    pub fn post_path(&self, meta: &PostMeta) -> String {
        encode_path(&["posts", &meta.year, &meta.month, &meta.slug])
    }

    /// `/tags/<tag>`, percent-encoded.
    pub fn tag_path(&self, tag: &str) -> String {
        encode_path(&["tags", tag])
    }

    /// Dynamic OG image endpoint for a post.
    pub fn og_post_query_url(&self, meta: &PostMeta) -> String {
        let query = Serializer::new(String::new())
            .append_pair("title", &meta.title)
            .append_pair("date", &meta.created_at)
            .finish();
        format!("{}?{}", self.absolute_url("/api/og/post"), query)
    }

    /// Pre-rendered OG image for a post, as written by the static builder.
    pub fn og_post_file_url(&self, meta: &PostMeta) -> String {
        let path = encode_path(&["og", "posts", &meta.year, &meta.month, &format!("{}.svg", meta.slug)]);
        self.absolute_url(&path)
    }
}

/// Whether `tag` can be written as a `tags/<tag>/` directory by the static
/// builder. Other tags get no static page and are not linked.
pub fn is_static_tag(tag: &str) -> bool {
    !tag.is_empty() && tag != "." && tag != ".." && !tag.contains(['/', '\\'])
}

/// Build an absolute path from raw segments, percent-encoding each one.
pub fn encode_path(segments: &[&str]) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return format!("/{}", segments.join("/"));
    };

    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }

    url.path().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(slug: &str, title: &str) -> PostMeta {
        PostMeta {
            slug: slug.to_string(),
            year: "2024".to_string(),
            month: "05".to_string(),
            day: None,
            title: title.to_string(),
            created_at: "2024-05-10".to_string(),
            updated_at: None,
            tags: vec![],
            published: true,
            is_test: None,
            description: String::new(),
            created: kiji_content::date::parse_date("2024-05-10").unwrap(),
        }
    }

    fn site(base_url: &str) -> SiteConfig {
        SiteConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn static_tags_are_plain_directory_names() {
        assert!(is_static_tag("Rust"));
        assert!(is_static_tag("テスト"));
        assert!(is_static_tag("C++"));
        assert!(!is_static_tag(".."));
        assert!(!is_static_tag("C/C++"));
        assert!(!is_static_tag(r"a\b"));
        assert!(!is_static_tag(""));
    }

    #[test]
    fn joins_absolute_urls() {
        let site = site("https://example.com/");

        assert_eq!(site.absolute_url("/posts"), "https://example.com/posts");
        assert_eq!(site.absolute_url("posts"), "https://example.com/posts");
        assert_eq!(site.absolute_url("/"), "https://example.com/");
    }

    #[test]
    fn encodes_post_and_tag_paths() {
        let site = site("https://example.com");

        assert_eq!(site.post_path(&meta("hello-world", "t")), "/posts/2024/05/hello-world");
        assert_eq!(site.tag_path("Rust"), "/tags/Rust");
        assert_eq!(site.tag_path("テスト"), "/tags/%E3%83%86%E3%82%B9%E3%83%88");
        assert_eq!(site.tag_path("a b"), "/tags/a%20b");
        assert_eq!(site.tag_path("C/C++"), "/tags/C%2FC++");
    }

    #[test]
    fn builds_og_urls() {
        let site = site("https://example.com");
        let meta = meta("hello", "Hello & goodbye");

        assert_eq!(
            site.og_post_query_url(&meta),
            "https://example.com/api/og/post?title=Hello+%26+goodbye&date=2024-05-10"
        );
        assert_eq!(
            site.og_post_file_url(&meta),
            "https://example.com/og/posts/2024/05/hello.svg"
        );
    }

    #[test]
    fn base_url_override() {
        let site = site("http://localhost:3000");

        let same = site.clone().with_base_url_override(Some("  ".to_string()));
        assert_eq!(same.base_url, "http://localhost:3000");

        let changed = site.with_base_url_override(Some("https://blog.example".to_string()));
        assert_eq!(changed.base_url, "https://blog.example");
    }

    #[test]
    fn deserializes_partial_config() {
        let site: SiteConfig = serde_json::from_str(r#"{"title": "My Blog"}"#).unwrap();

        assert_eq!(site.title, "My Blog");
        assert_eq!(site.language, "ja");
    }
}
