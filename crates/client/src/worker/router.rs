//! Request routing: exclusion filter and strategy classification.
//!
//! The exclusion filter is a plain substring match against the full request
//! URL, so `googleapis.com` also matches `fonts.googleapis.com` and any URL
//! whose path or query happens to contain that text.

use serde::Serialize;
use swcache_core::{Request, RequestMode};
use url::Url;

/// How a request is resolved against network and cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Documents: latest from the network, cache only when offline.
    NetworkFirst,
    /// Static assets: cache hit short-circuits the network.
    CacheFirst,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network_first",
            Strategy::CacheFirst => "cache_first",
        }
    }
}

/// URL patterns that are never intercepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BypassFilter {
    patterns: Vec<String>,
}

impl BypassFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { patterns: patterns.into_iter().map(Into::into).filter(|p: &String| !p.is_empty()).collect() }
    }

    /// The first pattern contained in the URL, if any.
    pub fn matches(&self, url: &Url) -> Option<&str> {
        let url = url.as_str();
        self.patterns
            .iter()
            .find(|pattern| url.contains(pattern.as_str()))
            .map(String::as_str)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Pick the strategy for a request.
///
/// Document-like: a top-level navigation, or a GET whose `Accept` header
/// includes `text/html`. Everything else is resource-like.
pub fn classify(request: &Request) -> Strategy {
    if request.mode == RequestMode::Navigate {
        return Strategy::NetworkFirst;
    }

    let wants_html = request
        .header("accept")
        .is_some_and(|accept| accept.contains("text/html"));

    if request.is_get() && wants_html { Strategy::NetworkFirst } else { Strategy::CacheFirst }
}
