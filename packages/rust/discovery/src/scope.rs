//! Host and base-path filtering shared by every probe.

use docgrab_shared::{SiteTarget, same_origin};
use url::Url;

/// Same host as the target and a path equal to or nested under its base path.
pub fn in_scope(url: &Url, target: &SiteTarget) -> bool {
    same_origin(url, target.base()) && path_within(url.path(), target.base_path())
}

/// `path == base` or `path` starts with `base/`. An empty base admits everything.
pub fn path_within(path: &str, base_path: &str) -> bool {
    if base_path.is_empty() {
        return true;
    }
    match path.strip_prefix(base_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Drop the `#fragment` part of a URL.
pub fn without_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
