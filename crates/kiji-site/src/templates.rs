//! Template engine for rendering pages, sitemaps and OG images.

use minijinja::{AutoEscape, Environment};
use serde::Serialize;

/// Template engine using minijinja.
///
/// `.html`, `.xml` and `.svg` templates are HTML-escaped.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.set_auto_escape_callback(|name| {
            if name.ends_with(".svg") {
                AutoEscape::Html
            } else {
                minijinja::default_auto_escape_callback(name)
            }
        });

        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .unwrap_or_else(|e| panic!("Failed to add template {name}: {e}"));
        }

        Self { env }
    }

    /// Render the named template with `context`.
    pub fn render(&self, template: &str, context: impl Serialize) -> Result<String, minijinja::Error> {
        self.env.get_template(template)?.render(context)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", BASE_TEMPLATE),
    ("post_list.html", POST_LIST_TEMPLATE),
    ("home.html", HOME_TEMPLATE),
    ("post.html", POST_TEMPLATE),
    ("tag.html", TAG_TEMPLATE),
    ("not_found.html", NOT_FOUND_TEMPLATE),
    ("error.html", ERROR_TEMPLATE),
    ("sitemap_index.xml", SITEMAP_INDEX_TEMPLATE),
    ("sitemap.xml", SITEMAP_TEMPLATE),
    ("og_default.svg", OG_DEFAULT_TEMPLATE),
    ("og_post.svg", OG_POST_TEMPLATE),
];

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ page.title }}</title>
  <meta name="description" content="{{ page.description }}">
  {% if page.canonical %}<link rel="canonical" href="{{ page.canonical }}">
  <meta property="og:url" content="{{ page.canonical }}">
  {% endif %}<meta property="og:title" content="{{ page.og_title }}">
  <meta property="og:description" content="{{ page.description }}">
  <meta property="og:type" content="{{ page.og_type }}">
  <meta property="og:site_name" content="{{ site.title }}">
  <meta property="og:image" content="{{ page.og_image }}">
  <meta property="og:image:width" content="1200">
  <meta property="og:image:height" content="630">
  <meta property="og:image:alt" content="{{ page.og_title }}">
  {% if page.published_time %}<meta property="article:published_time" content="{{ page.published_time }}">
  {% endif %}{% for tag in page.article_tags %}<meta property="article:tag" content="{{ tag }}">
  {% endfor %}<meta name="twitter:card" content="summary_large_image">
  <meta name="twitter:title" content="{{ page.og_title }}">
  <meta name="twitter:description" content="{{ page.description }}">
  <meta name="twitter:image" content="{{ page.og_image }}">
  <link rel="alternate" type="application/rss+xml" title="{{ site.title }}" href="{{ feed_path }}">
  <link rel="stylesheet" href="/assets/main.css">
  {% if page.json_ld %}<script type="application/ld+json">{{ page.json_ld | safe }}</script>
  {% endif %}
</head>
<body>
  <header class="site-header">
    <div class="container header-inner">
      <a href="/" class="site-title">{{ site.title }}</a>
      <div class="header-actions">
        <button type="button" class="theme-toggle" aria-label="テーマを切り替える">◐</button>
        <button type="button" class="menu-btn" aria-label="メニューを開く" aria-expanded="false" aria-controls="mobile-menu">☰</button>
      </div>
    </div>
    <nav id="mobile-menu" class="mobile-menu" hidden>
      <ul>
        <li><a href="/">ホーム</a></li>
        <li><a href="{{ feed_path }}">RSS</a></li>
      </ul>
    </nav>
  </header>
  <main class="container main">
    {% block content %}{% endblock %}
  </main>
  <footer class="site-footer">
    <div class="container">
      <div class="footer-inner">
        <div>
          <a href="/" class="footer-title">{{ site.title }}</a>
          <p class="footer-description">{{ site.description }}</p>
        </div>
        {% if site.social_url %}<a href="{{ site.social_url }}" class="social-link" target="_blank" rel="noopener noreferrer" aria-label="SNS">SNS</a>{% endif %}
      </div>
      <p class="copyright">© {{ year }} {{ site.title }}. All rights reserved.</p>
    </div>
  </footer>
  <script src="/assets/main.js"></script>
  {% if live_reload %}<script src="/__livereload.js"></script>
  {% endif %}
</body>
</html>"##;

const POST_LIST_TEMPLATE: &str = r##"{% if posts %}
<div class="post-list">
{% for post in posts %}
  <article class="post-card">
    <a href="{{ post.url }}" class="post-card-link"><h2>{{ post.title }}</h2></a>
    <div class="post-meta"><time datetime="{{ post.date_iso }}">{{ post.date }}</time></div>
    <p class="post-description">{{ post.description }}</p>
    <div class="tags">
    {% for tag in post.tags %}{% if tag.url %}<a href="{{ tag.url }}" class="tag">{{ tag.name }}</a>{% else %}<span class="tag">{{ tag.name }}</span>{% endif %}
    {% endfor %}</div>
    <a href="{{ post.url }}" class="read-more">記事を読む →</a>
  </article>
{% endfor %}
</div>
{% else %}
<div class="empty">
  <h2>記事はまだありません</h2>
  <p>これから記事を投稿していきます。</p>
</div>
{% endif %}"##;

const HOME_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<div class="hero">
  <h1>{{ site.title }}</h1>
  <p>{{ site.description }}</p>
</div>
<section>
  <h2 class="section-title">最新の投稿</h2>
  {% include "post_list.html" %}
</section>
{% endblock %}"##;

const POST_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="post">
  <header class="post-header">
    <h1>{{ post.title }}</h1>
    <div class="post-meta"><time datetime="{{ post.date_iso }}">{{ post.date }}</time></div>
    <div class="tags">
    {% for tag in post.tags %}{% if tag.url %}<a href="{{ tag.url }}" class="tag">{{ tag.name }}</a>{% else %}<span class="tag">{{ tag.name }}</span>{% endif %}
    {% endfor %}</div>
    <p class="post-description">{{ post.description }}</p>
  </header>
  <div class="content">
    {{ content | safe }}
  </div>
</article>

{% if others %}
<aside class="other-posts">
  <h2>他の記事も読む</h2>
  <div class="other-posts-grid">
  {% for other in others %}
    <a href="{{ other.url }}" class="other-post">
      <h3>{{ other.title }}</h3>
      <p>{{ other.description }}</p>
      <time datetime="{{ other.date_iso }}">{{ other.date_short }}</time>
    </a>
  {% endfor %}
  </div>
</aside>
{% endif %}

<div class="back-link"><a href="/">← 記事一覧に戻る</a></div>
{% endblock %}"##;

const TAG_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<div class="tag-header">
  <h1>#{{ tag }}</h1>
  <p>このタグが付いた記事: {{ posts | length }}件</p>
  <div class="back-link"><a href="/">← 記事一覧に戻る</a></div>
</div>
{% include "post_list.html" %}
{% endblock %}"##;

const NOT_FOUND_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<div class="not-found">
  <h2>記事が見つかりません</h2>
  <p>お探しの記事は削除されたか、URLが間違っている可能性があります。</p>
  <a href="/" class="button">記事一覧に戻る</a>
</div>
{% endblock %}"##;

const ERROR_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<div class="not-found">
  <h2>エラーが発生しました</h2>
  <pre class="error-message">{{ message }}</pre>
  <a href="/" class="button">記事一覧に戻る</a>
</div>
{% endblock %}"##;

const SITEMAP_INDEX_TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{% for sitemap in sitemaps %}  <sitemap>
    <loc>{{ sitemap.loc }}</loc>
  </sitemap>
{% endfor %}</sitemapindex>
"##;

const SITEMAP_TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{% for entry in entries %}  <url>
    <loc>{{ entry.loc }}</loc>
    <lastmod>{{ entry.lastmod }}</lastmod>
    <changefreq>{{ entry.changefreq }}</changefreq>
    <priority>{{ entry.priority }}</priority>
  </url>
{% endfor %}</urlset>
"##;

const OG_DEFAULT_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="#E6E6E6"/>
      <stop offset="50%" stop-color="#F3F4F6"/>
      <stop offset="100%" stop-color="#D1D5DB"/>
    </linearGradient>
  </defs>
  <rect width="100%" height="100%" fill="url(#bg)"/>
  <rect x="60" y="31" width="1080" height="567" rx="24" fill="#FFFFFF"/>
  <text x="120" y="330" font-family="sans-serif" font-size="64" font-weight="bold" fill="#111827">{{ title }}</text>
  <text x="1080" y="540" font-family="sans-serif" font-size="32" fill="#4B5563" text-anchor="end">{{ description }}</text>
</svg>
"##;

const OG_POST_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="0" y2="1">
      <stop offset="0%" stop-color="#3b82f6"/>
      <stop offset="100%" stop-color="#1e3a8a"/>
    </linearGradient>
  </defs>
  <rect width="100%" height="100%" fill="url(#bg)"/>
  <text font-family="sans-serif" font-size="70" font-weight="bold" fill="#FFFFFF">
  {% for line in lines %}  <tspan x="80" y="{{ line.y }}">{{ line.text }}</tspan>
  {% endfor %}</text>
  {% if date %}<text x="80" y="{{ date_y }}" font-family="sans-serif" font-size="36" fill="#FFFFFF" fill-opacity="0.8">{{ date }}</text>
  {% endif %}<text x="80" y="570" font-family="sans-serif" font-size="32" fill="#FFFFFF" fill-opacity="0.8">{{ site_title }}</text>
</svg>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn registers_all_templates() {
        let engine = TemplateEngine::new();

        for &(name, _) in TEMPLATES {
            assert!(engine.env.get_template(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn escapes_svg_text() {
        let engine = TemplateEngine::new();

        let svg = engine
            .render(
                "og_post.svg",
                context! {
                    width => 1200,
                    height => 630,
                    lines => vec![context! { text => "<script> & more", y => 150 }],
                    date => "",
                    date_y => 0,
                    site_title => "Blog",
                },
            )
            .unwrap();

        assert!(svg.contains("&lt;script&gt; &amp; more"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn missing_template_is_an_error() {
        let engine = TemplateEngine::new();

        assert!(engine.render("nope.html", context! {}).is_err());
    }
}
