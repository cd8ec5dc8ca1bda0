use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use feed_rs::{model::Entry, parser};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::{
    error::{FeedError, Result},
    util::truncate,
};

pub const NO_TITLE: &str = "No title";
pub const MAX_BODY_CHARS: usize = 3500;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static LINE_PADDING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Parses a feed document. Entries without an identifier keep an empty id
/// instead of a generated one, so the link fallback in [`clean`] applies.
pub fn parse(content: &[u8]) -> Result<feed_rs::model::Feed> {
    parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(content)
        .map_err(|e| FeedError::invalid(format!("Invalid feed: {}", e)))
}

/// A feed entry after cleanup. Timestamp and identifier are optional until
/// [`normalize`] has vetted the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub title: String,
    pub link: Option<String>,
    pub body: String,
    pub published: Option<DateTime<Utc>>,
    pub id: Option<String>,
}

/// Cleans `entry`, keeping it only if it has both a timestamp and an identifier.
pub fn normalize(entry: &Entry) -> Option<NormalizedEntry> {
    let cleaned = clean(entry);
    if cleaned.published.is_some() && cleaned.id.is_some() {
        Some(cleaned)
    } else {
        None
    }
}

pub fn clean(entry: &Entry) -> NormalizedEntry {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(NO_TITLE)
        .to_string();

    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty());

    let id = Some(entry.id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| link.clone());

    let html = entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .filter(|body| !body.trim().is_empty())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.as_str()))
        .unwrap_or_default();

    NormalizedEntry {
        title,
        link,
        body: truncate(&text(html), MAX_BODY_CHARS),
        published: entry.published.or(entry.updated),
        id,
    }
}

/// Renders an HTML fragment as chat-friendly text with inline `[text](url)` links.
pub fn text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    walk(fragment.root_element(), &mut out);

    let out = LINE_PADDING.replace_all(&out, "\n");
    let out = BLANK_LINES.replace_all(&out, "\n\n");
    out.trim().to_string()
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&WHITESPACE.replace_all(text, " "));
            continue;
        }

        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        match child.value().name() {
            "br" => out.push('\n'),
            "a" => anchor(child, out),
            "script" | "style" => {}
            "p" | "div" | "li" | "blockquote" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                walk(child, out);
                out.push('\n');
            }
            _ => walk(child, out),
        }
    }
}

fn anchor(element: ElementRef<'_>, out: &mut String) {
    let label = element.text().collect::<String>();
    let label = WHITESPACE.replace_all(label.trim(), " ");
    let href = element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty());

    match href {
        Some(href) if label.is_empty() => out.push_str(href),
        Some(href) => out.push_str(&format!("[{}]({})", label, href)),
        None => out.push_str(&label),
    }
}
