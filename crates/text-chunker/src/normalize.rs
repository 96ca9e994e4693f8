//! Clean-up applied to model-generated summaries before they are chunked.

use once_cell::sync::Lazy;
use regex::Regex;

struct Rewrite {
    pattern: Regex,
    replacement: &'static str,
}

fn rewrite(pattern: &str, replacement: &'static str) -> Rewrite {
    Rewrite {
        pattern: Regex::new(pattern).expect("static markdown pattern"),
        replacement,
    }
}

// Order matters: fenced code before inline code, triple emphasis before
// double before single.
static MARKDOWN_REWRITES: Lazy<Vec<Rewrite>> = Lazy::new(|| {
    vec![
        rewrite(r"```(.+?)```", "~~~${1}~~~"),
        rewrite(r"`(.+?)`", "${1}"),
        rewrite(r"\*\*\*(.*?)\*\*\*", "${1}"),
        rewrite(r"___(.*?)___", "${1}"),
        rewrite(r"\*\*(.*?)\*\*", "${1}"),
        rewrite(r"__(.*?)__", "${1}"),
        rewrite(r"\*(.*?)\*", "${1}"),
        rewrite(r"_(.*?)_", "${1}"),
        rewrite(r"!\[(.*?)\]\(.*?\)", "${1}"),
        rewrite(r"\[(.*?)\]\(.*?\)", "${1}"),
        rewrite(r"(?m)^#{1,6}\s+", ""),
        rewrite(r"(?m)^>\s+", ""),
        rewrite(r"(?m)^[*\-_]{3,}\s*$", ""),
    ]
});

/// Remove markdown markup, keeping the visible text. List markers are kept.
#[must_use]
pub fn strip_markdown(text: &str) -> String {
    let mut out = text.to_string();
    for rule in MARKDOWN_REWRITES.iter() {
        if rule.pattern.is_match(&out) {
            out = rule
                .pattern
                .replace_all(&out, rule.replacement)
                .into_owned();
        }
    }
    out.trim().to_string()
}

/// Drop full-width spaces, carriage returns and tabs
#[must_use]
pub fn strip_layout_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{3000}' | '\r' | '\t'))
        .collect()
}

/// Trim every line and drop the empty ones
#[must_use]
pub fn collapse_blank_lines(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full summary clean-up: markdown, layout characters, blank lines
#[must_use]
pub fn normalize_summary(text: &str) -> String {
    collapse_blank_lines(&strip_layout_chars(&strip_markdown(text)))
}
