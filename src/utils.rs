// src/utils.rs

/// Derive a URL-safe slug: lowercase, non-alphanumeric runs collapsed to `-`,
/// no leading or trailing hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapse all whitespace runs to single spaces
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the bare host from a URL or a domain-ish string
pub fn host_of(url_or_domain: &str) -> Option<String> {
    let trimmed = url_or_domain.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);

    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .trim_start_matches("www.")
        .to_lowercase();

    if host.contains('.') && !host.contains(' ') {
        Some(host)
    } else {
        None
    }
}

/// Title-case a single hostname label, e.g. `acmecorp` -> `Acmecorp`
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  --Standard Bank (Pty) Ltd.-- "), "standard-bank-pty-ltd");
        assert_eq!(slugify("MTN"), "mtn");
        assert_eq!(slugify("Café & Co"), "caf-co");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slug_shape_holds_for_awkward_names() {
        let names = [
            "Acme Corp",
            "-Leading Hyphen",
            "Trailing Hyphen-",
            "Naspers/Prosus",
            "O'Reilly  Media",
            "ÄÖÜ GmbH",
            "   ",
            "Takealot.com",
            "100% Remote Inc.",
            "日本語 Company",
        ];

        for name in names {
            let slug = slugify(name);
            assert!(
                slug.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "bad chars in {slug:?}"
            );
            assert!(!slug.starts_with('-'), "leading hyphen in {slug:?}");
            assert!(!slug.ends_with('-'), "trailing hyphen in {slug:?}");
            assert!(!slug.contains("--"), "double hyphen in {slug:?}");
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 2), "");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a \n\t b   c "), "a b c");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://www.acme.com/jobs/1"), Some("acme.com".to_string()));
        assert_eq!(host_of("takealot.com"), Some("takealot.com".to_string()));
        assert_eq!(host_of("not a host"), None);
        assert_eq!(capitalize("acme"), "Acme");
    }
}
