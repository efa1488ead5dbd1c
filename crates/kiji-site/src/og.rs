//! Open Graph images rendered as SVG.

use serde::Serialize;

use kiji_content::date::parse_date;

use crate::config::SiteConfig;
use crate::render::format_date_ja;
use crate::templates::TemplateEngine;

pub const OG_WIDTH: u32 = 1200;
pub const OG_HEIGHT: u32 = 630;

/// Title line width in columns; wide (CJK) characters take two.
const TITLE_COLUMNS: usize = 28;
const TITLE_MAX_LINES: usize = 3;
const TITLE_TOP: u32 = 150;
const TITLE_LINE_HEIGHT: u32 = 84;
const ELLIPSIS: char = '…';

/// Errors that can occur while rendering an OG image.
#[derive(Debug, thiserror::Error)]
pub enum OgError {
    #[error("Missing title parameter")]
    MissingTitle,

    #[error("Failed to generate OG image: {0}")]
    Render(#[from] minijinja::Error),
}

#[derive(Serialize)]
struct TitleLine {
    text: String,
    y: u32,
}

/// The site-wide card used by pages without their own image.
pub fn render_default(engine: &TemplateEngine, site: &SiteConfig) -> Result<String, OgError> {
    Ok(engine.render(
        "og_default.svg",
        minijinja::context! {
            width => OG_WIDTH,
            height => OG_HEIGHT,
            title => &site.title,
            description => &site.description,
        },
    )?)
}

/// A post card with its wrapped title and optional date.
///
/// A blank or missing title is [`OgError::MissingTitle`]. Dates that parse
/// are shown as `YYYY年M月D日`, anything else verbatim.
pub fn render_post(
    engine: &TemplateEngine,
    site: &SiteConfig,
    title: Option<&str>,
    date: Option<&str>,
) -> Result<String, OgError> {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(OgError::MissingTitle)?;

    let lines: Vec<TitleLine> = wrap_title(title, TITLE_COLUMNS, TITLE_MAX_LINES)
        .into_iter()
        .zip(0u32..)
        .map(|(text, index)| TitleLine {
            text,
            y: TITLE_TOP + index * TITLE_LINE_HEIGHT,
        })
        .collect();

    let date = date
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| parse_date(d).map(|dt| format_date_ja(&dt)).unwrap_or_else(|| d.to_string()));

    let date_y = TITLE_TOP + lines.len() as u32 * TITLE_LINE_HEIGHT + 40;

    Ok(engine.render(
        "og_post.svg",
        minijinja::context! {
            width => OG_WIDTH,
            height => OG_HEIGHT,
            lines => lines,
            date => date,
            date_y => date_y,
            site_title => &site.title,
        },
    )?)
}

/// Greedily wrap `title` into at most `max_lines` lines of `columns` width.
///
/// Latin words are kept whole where possible. Overflow is cut with `…`.
pub fn wrap_title(title: &str, columns: usize, max_lines: usize) -> Vec<String> {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut width = 0;

    for c in title.chars() {
        let w = char_columns(c);

        if width + w > columns && !current.is_empty() {
            let mut carry = String::new();
            let mid_word = c != ' ' && w == 1 && current.chars().last().is_some_and(|l| l != ' ' && char_columns(l) == 1);

            if mid_word {
                if let Some(space) = current.rfind(' ') {
                    carry = current.split_off(space + 1);
                }
                if text_columns(&carry) + w > columns {
                    current.push_str(&carry);
                    carry.clear();
                }
            }

            lines.push(current.trim_end().to_string());
            width = text_columns(&carry);
            current = carry;
        }

        if current.is_empty() && c == ' ' {
            continue;
        }

        current.push(c);
        width += w;
    }

    if !current.trim().is_empty() {
        lines.push(current.trim_end().to_string());
    }

    if max_lines > 0 && lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            while !last.is_empty() && text_columns(last) + 1 > columns {
                last.pop();
            }
            last.push(ELLIPSIS);
        }
    }

    lines
}

fn text_columns(text: &str) -> usize {
    text.chars().map(char_columns).sum()
}

fn char_columns(c: char) -> usize {
    match c as u32 {
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD => 2,
        _ => 1,
    }
}
