//! HTTP cache control module
//!
//! Decides the `Cache-Control` lifetime attached to static and fallback responses.

/// One year, in seconds
pub const LONG_LIVED_MAX_AGE: u32 = 31_536_000;

/// Cache lifetime of a rendered static response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Revalidate on every use (entry documents)
    NoCache,
    /// Fingerprinted build output, cached publicly for a year
    LongLived,
}

impl CachePolicy {
    /// Pick the policy for a request path
    ///
    /// The site root and anything ending in `.html` must always be revalidated,
    /// since they reference the hashed asset names of the current build.
    pub fn for_path(pathname: &str) -> Self {
        if pathname == "/" || pathname.ends_with(".html") {
            Self::NoCache
        } else {
            Self::LongLived
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::NoCache => "no-cache".to_string(),
            Self::LongLived => format!("public, max-age={LONG_LIVED_MAX_AGE}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_html_are_not_cached() {
        assert_eq!(CachePolicy::for_path("/"), CachePolicy::NoCache);
        assert_eq!(CachePolicy::for_path("/index.html"), CachePolicy::NoCache);
        assert_eq!(CachePolicy::for_path("/docs/page.html"), CachePolicy::NoCache);
    }

    #[test]
    fn test_assets_are_long_lived() {
        assert_eq!(
            CachePolicy::for_path("/assets/index-3f2a.js"),
            CachePolicy::LongLived
        );
        assert_eq!(CachePolicy::for_path("/logo.svg"), CachePolicy::LongLived);
        // Only the suffix counts, not a substring
        assert_eq!(CachePolicy::for_path("/page.html.gz"), CachePolicy::LongLived);
        assert_eq!(CachePolicy::for_path("/index.htm"), CachePolicy::LongLived);
    }

    #[test]
    fn test_cache_policy() {
        assert_eq!(CachePolicy::NoCache.to_header_value(), "no-cache");
        assert_eq!(
            CachePolicy::LongLived.to_header_value(),
            "public, max-age=31536000"
        );
    }
}
