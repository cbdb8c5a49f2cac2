//! Ordered, case-insensitive response header map.

use reqwest::header::HeaderMap;

/// Response headers in arrival order; a repeated name keeps its first
/// position but takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing the value of an existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a header value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// `Content-Type` value, or `""` when absent.
    pub fn content_type(&self) -> &str {
        self.get("content-type").unwrap_or("")
    }

    /// Iterate over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_value_wins_first_position_kept() {
        let headers: Headers = [
            ("Content-Type", "text/plain"),
            ("X-Trace", "a"),
            ("content-type", "text/html"),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.content_type(), "text/html");
        let names: Vec<_> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["content-type", "x-trace"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let headers: Headers = [("Content-Encoding", "gzip")].into_iter().collect();
        assert_eq!(headers.get("CONTENT-ENCODING"), Some("gzip"));
        assert_eq!(headers.get("content-type"), None);
        assert_eq!(headers.content_type(), "");
    }
}
