//! Asset pipeline for the theme stylesheet and script.

/// Errors from CSS processing.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("CSS parse error: {0}")]
    Parse(String),

    #[error("CSS minify error: {0}")]
    Minify(String),
}

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// The theme stylesheet, minified when `minify` is set.
    ///
    /// Falls back to the unminified source if minification fails.
    pub fn css(minify: bool) -> String {
        if !minify {
            return DEFAULT_CSS.to_string();
        }

        Self::minify_css(DEFAULT_CSS).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            DEFAULT_CSS.to_string()
        })
    }

    /// Theme toggle and mobile menu script.
    pub fn js() -> &'static str {
        DEFAULT_JS
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, AssetError> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| AssetError::Parse(e.to_string()))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| AssetError::Minify(e.to_string()))?;

        Ok(minified.code)
    }
}

const DEFAULT_CSS: &str = r#"/* kiji blog theme */

:root {
  --background: #ffffff;
  --foreground: #111827;
  --muted: #f9fafb;
  --muted-foreground: #4b5563;
  --border: #e5e7eb;
  --primary: #2563eb;
  --primary-hover: #1d4ed8;
  --tag-background: #f3f4f6;
  --content-max-width: 48rem;
  --radius: 0.375rem;
}

:root[data-theme="dark"] {
  --background: #0f172a;
  --foreground: #f1f5f9;
  --muted: #1e293b;
  --muted-foreground: #94a3b8;
  --border: #334155;
  --primary: #60a5fa;
  --primary-hover: #93c5fd;
  --tag-background: #1e293b;
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: system-ui, -apple-system, "Hiragino Sans", "Noto Sans JP", sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.7;
  min-height: 100vh;
  display: flex;
  flex-direction: column;
}

a {
  color: var(--primary);
}

a:hover {
  color: var(--primary-hover);
}

.container {
  width: 100%;
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 0 1rem;
}

/* Header */
.site-header {
  border-bottom: 1px solid var(--border);
  padding: 1rem 0;
}

.header-inner {
  display: flex;
  justify-content: space-between;
  align-items: center;
}

.site-title {
  font-size: 1.5rem;
  font-weight: 700;
  color: var(--foreground);
  text-decoration: none;
}

.header-actions {
  display: flex;
  gap: 0.5rem;
}

.theme-toggle,
.menu-btn {
  background: none;
  border: 1px solid var(--border);
  border-radius: var(--radius);
  color: var(--foreground);
  padding: 0.25rem 0.6rem;
  cursor: pointer;
}

.menu-btn {
  display: none;
}

.mobile-menu ul {
  list-style: none;
  padding: 1rem;
}

.mobile-menu li {
  margin-bottom: 0.5rem;
}

/* Main */
.main {
  flex-grow: 1;
  padding-top: 2rem;
  padding-bottom: 2rem;
}

.hero {
  text-align: center;
  margin-bottom: 3rem;
}

.hero h1 {
  font-size: 2.25rem;
  margin-bottom: 1rem;
}

.hero p {
  color: var(--muted-foreground);
  font-size: 1.125rem;
}

.section-title {
  font-size: 1.5rem;
  border-bottom: 1px solid var(--border);
  padding-bottom: 0.5rem;
  margin-bottom: 1.5rem;
}

/* Post list */
.post-card {
  border-bottom: 1px solid var(--border);
  padding-bottom: 2rem;
  margin-bottom: 2.5rem;
}

.post-card:last-child {
  border-bottom: none;
}

.post-card-link {
  color: var(--foreground);
  text-decoration: none;
}

.post-card-link h2 {
  font-size: 1.5rem;
  margin-bottom: 0.5rem;
}

.post-card-link:hover h2 {
  color: var(--primary);
}

.post-meta {
  color: var(--muted-foreground);
  font-size: 0.875rem;
  margin-bottom: 0.75rem;
}

.post-description {
  margin-bottom: 1rem;
}

.tags {
  display: flex;
  flex-wrap: wrap;
  gap: 0.5rem;
}

.tag {
  font-size: 0.75rem;
  padding: 0.25rem 0.5rem;
  background: var(--tag-background);
  color: var(--muted-foreground);
  border-radius: var(--radius);
  text-decoration: none;
}

.read-more {
  display: inline-block;
  margin-top: 1rem;
  font-size: 0.875rem;
}

.empty,
.not-found,
.tag-header {
  text-align: center;
  padding: 2rem 0;
}

.not-found h2,
.tag-header h1 {
  font-size: 1.875rem;
  margin-bottom: 1rem;
}

.button {
  display: inline-block;
  background: var(--primary);
  color: #ffffff;
  padding: 0.5rem 1.5rem;
  border-radius: var(--radius);
  text-decoration: none;
}

/* Post */
.post-header {
  margin-bottom: 2rem;
}

.post-header h1 {
  font-size: 1.875rem;
  margin-bottom: 0.75rem;
}

.post-header .tags {
  margin-bottom: 1rem;
}

.content h1,
.content h2,
.content h3 {
  margin: 2rem 0 1rem;
}

.content p,
.content ul,
.content ol,
.content table,
.content pre {
  margin-bottom: 1rem;
}

.content ul,
.content ol {
  padding-left: 1.5rem;
}

.content pre {
  background: #1e1e1e;
  color: #d4d4d4;
  padding: 1rem;
  border-radius: var(--radius);
  overflow-x: auto;
}

.content code {
  font-family: ui-monospace, monospace;
  font-size: 0.875em;
}

.content table {
  border-collapse: collapse;
}

.content th,
.content td {
  border: 1px solid var(--border);
  padding: 0.25rem 0.75rem;
}

.link-card {
  display: block;
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 1rem;
  word-break: break-all;
}

.other-posts {
  border-top: 1px solid var(--border);
  margin-top: 2.5rem;
  padding-top: 2rem;
}

.other-posts h2 {
  margin-bottom: 1rem;
}

.other-posts-grid {
  display: grid;
  gap: 1.5rem;
  grid-template-columns: repeat(auto-fill, minmax(12rem, 1fr));
}

.other-post {
  display: block;
  border: 1px solid var(--border);
  border-radius: 0.5rem;
  padding: 1rem;
  color: var(--foreground);
  text-decoration: none;
}

.other-post p {
  color: var(--muted-foreground);
  font-size: 0.875rem;
}

.other-post time {
  color: var(--muted-foreground);
  font-size: 0.75rem;
}

.back-link {
  margin-top: 2rem;
  text-align: center;
}

/* Footer */
.site-footer {
  border-top: 1px solid var(--border);
  background: var(--muted);
  padding: 1.5rem 0;
}

.footer-inner {
  display: flex;
  justify-content: space-between;
  align-items: center;
}

.footer-title {
  font-weight: 500;
  color: var(--foreground);
  text-decoration: none;
}

.footer-description,
.copyright {
  color: var(--muted-foreground);
  font-size: 0.875rem;
}

.copyright {
  margin-top: 1.5rem;
  text-align: center;
}

@media (max-width: 640px) {
  .menu-btn {
    display: block;
  }

  .footer-inner {
    flex-direction: column;
    gap: 1rem;
  }
}
"#;

const DEFAULT_JS: &str = r#"// kiji blog runtime
(function() {
  'use strict';

  const root = document.documentElement;
  const stored = localStorage.getItem('theme');
  const prefersDark = window.matchMedia('(prefers-color-scheme: dark)').matches;

  root.dataset.theme = stored || (prefersDark ? 'dark' : 'light');

  // Theme toggle
  const toggle = document.querySelector('.theme-toggle');
  if (toggle) {
    toggle.addEventListener('click', () => {
      const next = root.dataset.theme === 'dark' ? 'light' : 'dark';
      root.dataset.theme = next;
      localStorage.setItem('theme', next);
    });
  }

  // Mobile menu
  const menuBtn = document.querySelector('.menu-btn');
  const menu = document.getElementById('mobile-menu');

  if (menuBtn && menu) {
    menuBtn.addEventListener('click', () => {
      const open = menu.hidden;
      menu.hidden = !open;
      menuBtn.setAttribute('aria-expanded', String(open));
    });

    document.addEventListener('keydown', (event) => {
      if (event.key === 'Escape' && !menu.hidden) {
        menu.hidden = true;
        menuBtn.setAttribute('aria-expanded', 'false');
        menuBtn.focus();
      }
    });
  }
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_css() {
        let css = AssetPipeline::css(false);
        assert!(css.contains(":root"));
        assert!(css.contains("--background"));
        assert!(css.contains("data-theme"));
    }

    #[test]
    fn generates_js() {
        let js = AssetPipeline::js();
        assert!(js.contains("theme-toggle"));
        assert!(js.contains("aria-expanded"));
    }

    #[test]
    fn minifies_css() {
        let css = r#"
.button {
    background-color: blue;
    padding: 10px;
}
        "#;

        let minified = AssetPipeline::minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".button"));
    }

    #[test]
    fn minified_theme_is_smaller() {
        assert!(AssetPipeline::css(true).len() < AssetPipeline::css(false).len());
    }
}
