//! URL normalization and filesystem-safe slug derivation.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hard cap on slugs derived from URLs.
pub const MAX_SLUG_LEN: usize = 140;

/// Runs of characters that may not appear in a slug.
static UNSAFE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("slug regex"));

fn is_junk(c: char) -> bool {
    c.is_whitespace() || c == '"' || c == '\''
}

/// Canonicalize a user-supplied URL.
///
/// Strips surrounding whitespace and quotes, prepends `https://` when no
/// `http(s)://` prefix is present and drops trailing slashes. Returns an empty
/// string when nothing usable remains; callers must check for it.
///
/// The function is idempotent: `normalize_url(&normalize_url(u)) == normalize_url(u)`.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim_matches(is_junk);

    let lower = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();
    let (scheme, rest) = if lower.starts_with("https://") {
        trimmed.split_at(8)
    } else if lower.starts_with("http://") {
        trimmed.split_at(7)
    } else {
        ("https://", trimmed)
    };

    let rest = rest.trim_end_matches(|c: char| c == '/' || is_junk(c));
    if rest.is_empty() {
        return String::new();
    }

    format!("{scheme}{rest}")
}

/// Replace every run of characters outside `[A-Za-z0-9._-]` with `_` and trim
/// underscores from both ends. Falls back to `default` when nothing is left.
pub fn safe_slug(value: &str, default: &str) -> String {
    let replaced = UNSAFE_RUN_RE.replace_all(value, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Slug identifying a whole site: `host[_port]__path`, capped at [`MAX_SLUG_LEN`].
pub fn slug_from_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return truncate(safe_slug(url, "site"));
    };

    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}_{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let path = parsed.path().trim_matches('/');

    let slug = if path.is_empty() {
        safe_slug(&host, "site")
    } else {
        safe_slug(&format!("{host}__{path}"), "site")
    };
    truncate(slug)
}

/// Slug for a single page file, derived from the URL path (`index` at the root).
pub fn page_slug(url: &Url) -> String {
    let path = url.path().trim_matches('/');
    let path = if path.is_empty() { "index" } else { path };
    truncate(safe_slug(path, "root"))
}

/// Same host and explicit port. The scheme is not compared, so `http://` and
/// `https://` links to the same host match.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

fn truncate(mut slug: String) -> String {
    // slugs are ASCII-only, so any byte index is a char boundary
    slug.truncate(MAX_SLUG_LEN);
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_adds_scheme_and_strips_slash() {
        assert_eq!(normalize_url("example.com/docs/"), "https://example.com/docs");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("HTTPS://Example.com//"), "HTTPS://Example.com");
    }

    #[test]
    fn normalize_strips_quotes_and_whitespace() {
        assert_eq!(
            normalize_url("  'https://vercel.com/docs'\" "),
            "https://vercel.com/docs"
        );
    }

    #[test]
    fn normalize_empty_sentinel() {
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("   \"\"  "), "");
        assert_eq!(normalize_url("https://"), "");
        assert_eq!(normalize_url("///"), "");
    }

    #[test]
    fn safe_slug_replaces_and_trims() {
        assert_eq!(safe_slug("docs/getting started!", "site"), "docs_getting_started");
        assert_eq!(safe_slug("__a__", "site"), "a");
        assert_eq!(safe_slug("???", "site"), "site");
        assert_eq!(safe_slug("", "root"), "root");
    }

    #[test]
    fn slug_from_url_combines_host_and_path() {
        assert_eq!(slug_from_url("https://vercel.com/docs"), "vercel.com__docs");
        assert_eq!(slug_from_url("https://vercel.com"), "vercel.com");
        assert_eq!(
            slug_from_url("https://example.com/docs/api/v2"),
            "example.com__docs_api_v2"
        );
    }

    #[test]
    fn slug_from_url_is_capped() {
        let long = format!("https://example.com/{}", "a".repeat(400));
        assert_eq!(slug_from_url(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn page_slug_uses_path() {
        let url = Url::parse("https://example.com/docs/intro").unwrap();
        assert_eq!(page_slug(&url), "docs_intro");

        let root = Url::parse("https://example.com/").unwrap();
        assert_eq!(page_slug(&root), "index");

        let long = Url::parse(&format!("https://example.com/{}", "x/".repeat(200))).unwrap();
        assert_eq!(page_slug(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn same_origin_compares_host_and_port() {
        let a = Url::parse("https://example.com/docs").unwrap();
        let b = Url::parse("https://example.com:443/other").unwrap();
        let c = Url::parse("https://example.com:8443/docs").unwrap();
        let d = Url::parse("https://other.com/docs").unwrap();
        assert!(same_origin(&a, &b));
        assert!(!same_origin(&a, &c));
        assert!(!same_origin(&a, &d));

        let plain = Url::parse("http://example.com/docs").unwrap();
        assert!(same_origin(&a, &plain));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(input in any::<String>()) {
            let once = normalize_url(&input);
            prop_assert_eq!(normalize_url(&once), once);
        }

        #[test]
        fn normalize_is_idempotent_on_urlish(input in "[ '\"]{0,2}(https?://)?[a-z./:_-]{0,20}[ '\"/]{0,3}") {
            let once = normalize_url(&input);
            prop_assert_eq!(normalize_url(&once), once);
        }

        #[test]
        fn slugs_are_safe_and_non_empty(input in any::<String>()) {
            let re = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
            let slug = safe_slug(&input, "site");
            prop_assert!(re.is_match(&slug));
            let url_slug = slug_from_url(&input);
            prop_assert!(re.is_match(&url_slug));
            prop_assert!(url_slug.len() <= MAX_SLUG_LEN);
        }
    }
}
