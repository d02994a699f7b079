//! Origin whitelist for download offers
//!
//! Entries are bare host names (`example.com`). Anything after `#` on a line
//! is a comment.

use url::Url;

fn strip_comment(entry: &str) -> &str {
    entry.split('#').next().unwrap_or_default().trim()
}

/// Parse whitelist text, one host per line.
pub fn parse_whitelist_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(strip_comment)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a download from the page at `url` may trigger an offer.
///
/// An empty whitelist or an unknown page allows everything. So does a URL
/// that cannot be parsed. A page without a host is rejected by a non-empty
/// whitelist.
pub fn is_url_allowed(url: Option<&str>, entries: &[String], include_subdomains: bool) -> bool {
    let Some(url) = url.filter(|u| !u.is_empty()) else {
        return true;
    };
    if entries.is_empty() {
        return true;
    }

    let hostname = match Url::parse(url) {
        // file: and data: pages have no host and match no entry
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
        Err(e) => {
            tracing::warn!("Could not parse origin URL {}: {}", url, e);
            return true;
        }
    };

    entries.iter().any(|entry| {
        let entry = strip_comment(entry).to_lowercase();
        if entry.is_empty() {
            return false;
        }

        if include_subdomains {
            hostname == entry || hostname.ends_with(&format!(".{}", entry))
        } else {
            hostname == entry
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_whitelist_text() {
        let text = "# trusted portals\nexample.com\n\n  data.go.kr  # public data\n#disabled.org\n";
        assert_eq!(
            parse_whitelist_text(text),
            list(&["example.com", "data.go.kr"])
        );
    }

    #[test]
    fn test_empty_whitelist_allows_all() {
        assert!(is_url_allowed(Some("https://anything.net/x"), &[], true));
        assert!(is_url_allowed(None, &list(&["example.com"]), true));
    }

    #[test]
    fn test_subdomain_matching() {
        let entries = list(&["example.com"]);
        assert!(is_url_allowed(Some("https://example.com/a.csv"), &entries, true));
        assert!(is_url_allowed(Some("https://Reports.Example.com/"), &entries, true));
        assert!(!is_url_allowed(Some("https://notexample.com/"), &entries, true));

        assert!(is_url_allowed(Some("https://example.com/"), &entries, false));
        assert!(!is_url_allowed(Some("https://reports.example.com/"), &entries, false));
    }

    #[test]
    fn test_inline_comments_in_entries() {
        let entries = list(&["Example.com # work", "# only a comment"]);
        assert!(is_url_allowed(Some("https://example.com/"), &entries, false));
        assert!(!is_url_allowed(Some("https://other.com/"), &entries, false));
    }

    #[test]
    fn test_hostless_url_is_rejected() {
        let entries = list(&["example.com"]);
        assert!(!is_url_allowed(Some("file:///C:/page.html"), &entries, true));
        assert!(!is_url_allowed(Some("file:///C:/page.html"), &entries, false));
        assert!(is_url_allowed(Some("file:///C:/page.html"), &[], true));
    }

    #[test]
    fn test_unparseable_url_is_allowed() {
        assert!(is_url_allowed(Some("not a url"), &list(&["example.com"]), true));
    }
}
