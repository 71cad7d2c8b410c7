//! URL extraction from free-form chat text.

use regex::Regex;
use std::sync::LazyLock;

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:https?://[^\s<>"]+|(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,24}(?::\d{1,5})?(?:[/?#][^\s<>"]*)?)"#,
    )
    .unwrap()
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '*', '~'];

/// Every URL-looking substring of `text`, in order of appearance.
/// Duplicates are kept. Email addresses are skipped and trailing
/// sentence punctuation is trimmed.
pub fn extract_urls(text: &str) -> Vec<String> {
    RE_URL
        .find_iter(text)
        .filter(|m| !is_email_part(text, m.start(), m.end()))
        .map(|m| trim_trailing(m.as_str()))
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_email_part(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before == Some('@') || after == Some('@')
}

fn trim_trailing(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(last) = url.chars().next_back() else {
            return url;
        };
        let unbalanced = match last {
            ')' => url.matches('(').count() < url.matches(')').count(),
            ']' => url.matches('[').count() < url.matches(']').count(),
            '}' => url.matches('{').count() < url.matches('}').count(),
            c => TRAILING_PUNCTUATION.contains(&c),
        };
        if !unbalanced {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}
