//! Which posts a deployment may list.
//!
//! Unpublished posts are never listed. Test posts (`isTest: true`) are
//! listed everywhere except production, unless explicitly forced on.

use crate::post::PostMeta;

/// Selects the runtime mode.
pub const ENV_MODE: &str = "KIJI_ENV";

/// Forces test posts to be shown even in production.
pub const ENV_SHOW_TEST_POSTS: &str = "KIJI_SHOW_TEST_POSTS";

/// Deployment mode of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Production,
    #[default]
    Development,
}

impl RuntimeMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" | "test" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Visibility rules for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility {
    pub mode: RuntimeMode,
    pub show_test_posts: bool,
}

impl Visibility {
    pub fn production() -> Self {
        Self {
            mode: RuntimeMode::Production,
            show_test_posts: false,
        }
    }

    pub fn development() -> Self {
        Self {
            mode: RuntimeMode::Development,
            show_test_posts: false,
        }
    }

    /// Enable the test-post override.
    pub fn with_test_posts(mut self, show: bool) -> Self {
        self.show_test_posts = show;
        self
    }

    /// Resolve from the process environment.
    ///
    /// Reads the environment on every call so a change takes effect on the
    /// next query.
    pub fn from_env(default_mode: RuntimeMode) -> Self {
        Self::from_lookup(default_mode, |key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable lookup.
    pub fn from_lookup(default_mode: RuntimeMode, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = match lookup(ENV_MODE) {
            Some(value) => RuntimeMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Unknown {} value {:?}, using {:?}", ENV_MODE, value, default_mode);
                default_mode
            }),
            None => default_mode,
        };

        let show_test_posts = lookup(ENV_SHOW_TEST_POSTS)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Self {
            mode,
            show_test_posts,
        }
    }

    pub fn shows_test_posts(&self) -> bool {
        self.mode == RuntimeMode::Development || self.show_test_posts
    }

    /// Whether a post may appear in listings.
    pub fn allows(&self, meta: &PostMeta) -> bool {
        if !meta.published {
            return false;
        }
        meta.is_test != Some(true) || self.shows_test_posts()
    }
}
