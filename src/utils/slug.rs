// src/utils/slug.rs

use regex::Regex;
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Derive a URL-safe slug from a human-readable title.
///
/// Lowercase, every run of non-alphanumeric characters collapsed to a single
/// hyphen, leading/trailing hyphens stripped. "Hello, World!" -> "hello-world".
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let hyphenated = NON_ALNUM.replace_all(&lower, "-");
    hyphenated.trim_matches('-').to_string()
}

/// Disambiguate a colliding slug with a millisecond timestamp suffix.
/// The posts.slug unique constraint remains the backstop.
pub fn dedupe_slug(slug: &str) -> String {
    format!("{}-{}", slug, chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_title() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("Rust --- & Axum!!!"), "rust-axum");
    }

    #[test]
    fn slugify_strips_edges() {
        assert_eq!(slugify("  ...Leading and trailing...  "), "leading-and-trailing");
    }

    #[test]
    fn slugify_keeps_digits() {
        assert_eq!(slugify("Top 10 Tips for 2025"), "top-10-tips-for-2025");
    }

    #[test]
    fn slugify_all_symbols_is_empty() {
        assert_eq!(slugify("!!!???"), "");
    }

    #[test]
    fn dedupe_appends_suffix() {
        let deduped = dedupe_slug("hello-world");
        assert!(deduped.starts_with("hello-world-"));
        assert!(deduped.len() > "hello-world-".len());
    }
}
