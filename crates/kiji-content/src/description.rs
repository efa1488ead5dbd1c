//! Plain-text excerpts generated from post bodies.

use std::sync::LazyLock;

use regex::Regex;

/// Default excerpt length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 160;

const ELLIPSIS: &str = "...";

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Generate a plain-text description of at most `max_length` characters
/// (plus the ellipsis) from a Markdown/MDX body.
pub fn generate_description(content: &str, max_length: usize) -> String {
    let text = HTML_TAG.replace_all(content, "");
    let text = IMAGE.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.trim();

    let Some((cut, _)) = text.char_indices().nth(max_length) else {
        return text.to_string();
    };

    let window = &text[..cut];
    let truncated = match window.rfind(' ') {
        Some(space) => &window[..space],
        None => window,
    };

    format!("{truncated}{ELLIPSIS}")
}

/// The authored description when it has content, else a generated one.
pub fn resolve_description(authored: Option<&str>, content: &str) -> String {
    match authored.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => generate_description(content, DEFAULT_MAX_LENGTH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_input_is_unchanged() {
        assert_eq!(generate_description("Hello world", 160), "Hello world");
    }

    #[test]
    fn empty_input_has_no_ellipsis() {
        assert_eq!(generate_description("", 160), "");
        assert_eq!(generate_description("  \n\n ", 160), "");
    }

    #[test]
    fn exact_length_is_not_truncated() {
        let text = "a".repeat(10);
        assert_eq!(generate_description(&text, 10), text);
    }

    #[test]
    fn truncates_at_word_boundary() {
        let result = generate_description("the quick brown fox jumps", 12);
        assert_eq!(result, "the quick...");
    }

    #[test]
    fn truncates_hard_without_space() {
        let result = generate_description("abcdefghijkl", 5);
        assert_eq!(result, "abcde...");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let result = generate_description("あいうえおかきくけこ", 4);
        assert_eq!(result, "あいうえ...");
    }

    #[test]
    fn strips_markup() {
        let content = r#"# Title

Some <strong>bold</strong> text with a [link](https://example.com).

![alt text](/img.png)

## Section
Next   line"#;

        let result = generate_description(content, 160);

        assert_eq!(result, "Title Some bold text with a link. Section Next line");
    }

    #[test]
    fn keeps_inline_hashes() {
        assert_eq!(generate_description("C# and F#", 160), "C# and F#");
    }

    #[test]
    fn prefers_authored_description() {
        assert_eq!(resolve_description(Some("Authored"), "Body"), "Authored");
        assert_eq!(resolve_description(Some("   "), "Body"), "Body");
        assert_eq!(resolve_description(None, "Body"), "Body");
    }
}
