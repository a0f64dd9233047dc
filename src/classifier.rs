//! Maps the text in the link field to a supported site.
//!
//! Hosts are compared exactly as typed: `www.youtube.com` matches, while
//! `youtube.com`, `m.youtube.com` and `WWW.YOUTUBE.COM` do not.

use tracing::trace;
use url::Url;

use crate::model::{Category, Classification};

/// Ordered host table; the first entry containing the host wins.
const HOST_TABLE: &[(&[&str], Category)] = &[
    (&["www.youtube.com"], Category::YouTube),
    (&["www.reddit.com"], Category::Reddit),
];

/// Classifies `text` without touching the network.
pub fn classify(text: &str) -> Classification {
    let link = text.trim_matches([' ', '\n']);
    if link.is_empty() {
        return Classification::Invalid;
    }

    let Some(host) = resolve_host(link) else {
        return Classification::Invalid;
    };

    let result = HOST_TABLE
        .iter()
        .find(|(hosts, _)| hosts.contains(&host))
        .map_or(Classification::Unrecognized, |(_, category)| Classification::Recognized(*category));
    trace!(host, ?result, "classified link");
    result
}

/// Returns the host of `link` as the user typed it, or `None` when `link` is
/// not an absolute URL with a host.
pub fn resolve_host(link: &str) -> Option<&str> {
    // `Url` silently strips or repairs these, so reject them up front.
    if link.chars().any(|c| c.is_ascii_whitespace() || c.is_control() || c == '\\') {
        return None;
    }
    let parsed = Url::parse(link).ok()?;
    if !parsed.host_str().is_some_and(|h| !h.is_empty()) {
        return None;
    }
    // `Url` lower-cases and punycodes the host, so slice the original text.
    let host = raw_host(link)?;
    (!host.is_empty()).then_some(host)
}

fn raw_host(link: &str) -> Option<&str> {
    let (_, rest) = link.split_once(':')?;
    let rest = rest.strip_prefix("//")?;
    if rest.starts_with('/') {
        return None;
    }
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    if host_port.starts_with('[') {
        let close = host_port.find(']')?;
        return Some(&host_port[..=close]);
    }
    host_port.split(':').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_urls_are_invalid() {
        for text in [
            "",
            " ",
            "\n",
            "   \n  ",
            "not a url",
            "garbage",
            "www.youtube.com",
            "http://",
            "mailto:a@b.c",
            "https:www.youtube.com",
            "https:/www.youtube.com/watch?v=abc",
            "https:///www.youtube.com/watch?v=abc",
            "https:\\\\www.youtube.com\\watch",
            "https://www.youtube.com\\watch",
            "https://www.youtube.com/watch?v=a b c",
            "\thttps://www.youtube.com/watch?v=abc",
            "https://www.youtube.com/watch?v=abc\r",
            "https://www.you\ttube.com/",
        ] {
            assert_eq!(classify(text), Classification::Invalid, "{text:?}");
        }
    }

    #[test]
    fn youtube_host_is_recognized() {
        for text in [
            "https://www.youtube.com/watch?v=abc",
            "http://www.youtube.com",
            "https://www.youtube.com:443/shorts/xyz",
            "ftp://user:pw@www.youtube.com/",
            "  https://www.youtube.com/watch?v=abc\n",
        ] {
            assert_eq!(classify(text), Classification::Recognized(Category::YouTube), "{text:?}");
        }
    }

    #[test]
    fn reddit_host_is_recognized() {
        assert_eq!(
            classify("https://www.reddit.com/r/test"),
            Classification::Recognized(Category::Reddit)
        );
        assert_eq!(
            classify("https://www.reddit.com/r/videos/comments/abc/title/"),
            Classification::Recognized(Category::Reddit)
        );
    }

    #[test]
    fn other_hosts_are_unrecognized() {
        for text in [
            "https://example.com",
            "https://youtube.com/watch?v=abc",
            "https://m.youtube.com/watch?v=abc",
            "https://youtu.be/abc",
            "https://old.reddit.com/r/test",
            "https://WWW.YOUTUBE.COM/watch?v=abc",
            "https://www.youtube.com.evil.net/",
            "https://example.com/?next=https://www.youtube.com/",
            "https://www.youtube.com@example.com/",
        ] {
            assert_eq!(classify(text), Classification::Unrecognized, "{text:?}");
        }
    }

    #[test]
    fn classification_is_idempotent() {
        for text in ["", "https://www.youtube.com/watch?v=abc", "https://example.com", "nope"] {
            assert_eq!(classify(text), classify(text));
        }
    }

    #[test]
    fn host_keeps_original_case() {
        assert_eq!(resolve_host("https://WwW.Reddit.com/r/x"), Some("WwW.Reddit.com"));
        assert_eq!(resolve_host("http://[::1]:8080/"), Some("[::1]"));
        assert_eq!(resolve_host("not a url"), None);
    }
}
