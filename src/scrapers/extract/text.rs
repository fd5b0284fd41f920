//! Text cleanup and tolerant numeric parsing.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node, Selector};

/// Elements that start a new line when flattened to text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5",
    "h6", "tr", "table", "hr", "section", "article",
];

/// Separators between a thread title and the site name in `<title>`.
const TITLE_SEPARATORS: &[&str] = &[" - ", " | ", " :: ", " – ", " — "];

static ABBREVIATED_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*([km])\b").unwrap());

/// Collapse runs of spaces within lines and drop blank lines.
pub fn normalize_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-line text of an element.
pub fn inline_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flatten an element to readable text, skipping subtrees that match `skip`
/// (scripts, styles, quoted replies).
pub fn clean_text(element: ElementRef<'_>, skip: &Selector) -> String {
    let mut out = String::new();
    collect_text(element, skip, &mut out);
    normalize_whitespace(&out)
}

fn collect_text(element: ElementRef<'_>, skip: &Selector, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip.matches(&child_el) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&el.name());
                if block {
                    out.push('\n');
                }
                collect_text(child_el, skip, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Parse a count like `1,234`, `Replies: 12` or `1.2K`; 0 when nothing parses.
pub fn parse_count(raw: &str) -> u64 {
    if let Some(caps) = ABBREVIATED_COUNT.captures(raw) {
        let number = caps[1].replace(',', "");
        if let Ok(value) = number.parse::<f64>() {
            let multiplier = match caps[2].to_ascii_lowercase().as_str() {
                "k" => 1_000.0,
                _ => 1_000_000.0,
            };
            return (value * multiplier).round() as u64;
        }
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Drop the trailing site-name segment from a page `<title>`.
pub fn strip_title_suffix(title: &str) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.rfind(sep))
        .max();
    match cut {
        Some(idx) if idx > 0 => title[..idx].trim().to_string(),
        _ => title.trim().to_string(),
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
