/// Topic classification and citation link selection.
///
/// The rule table is plain data: an ordered list of keyword buckets, one
/// fallback pool per tilt, and the tilt hints. It is validated once when
/// loaded and never mutated afterwards.
///
/// Matching is literal substring containment on the lowercased query. There
/// is no tokenization, so a keyword also matches inside longer words
/// ("ate" hits "cruciate").
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RouterError;
use crate::model::{FallbackPool, FallbackPools, Tilt, TopicBucket};

/// Upper bound on links returned for a matched query.
pub const MAX_LINKS: usize = 4;

const BUILTIN_RULES: &str = include_str!("../rules/default_rules.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub version: String,
    pub buckets: Vec<TopicBucket>,
    pub fallbacks: FallbackPools,
    #[serde(default)]
    pub tilt_hints: Vec<String>,
}

/// Outcome of routing one query, with enough detail to log or inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSelection<'a> {
    pub links: Vec<String>,
    /// Tags of matched buckets, in definition order
    pub matched: Vec<&'a str>,
    /// Set when no bucket matched and a fallback pool was used
    pub fallback: Option<Tilt>,
}

impl RuleTable {
    /// The curated table shipped with the crate.
    pub fn builtin() -> Result<Self, RouterError> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn load(path: &Path) -> Result<Self, RouterError> {
        let content = std::fs::read_to_string(path).map_err(|source| RouterError::RulesIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, RouterError> {
        let table: RuleTable = serde_json::from_str(content)?;
        table.validated()
    }

    /// Checks table shape and lowercases keywords and hints.
    pub fn validated(mut self) -> Result<Self, RouterError> {
        let mut seen_tags = HashSet::new();
        for (index, bucket) in self.buckets.iter_mut().enumerate() {
            let invalid = |message: &str| RouterError::InvalidBucket {
                index,
                message: message.to_string(),
            };

            bucket.tag = bucket.tag.trim().to_string();
            if bucket.tag.is_empty() {
                return Err(invalid("missing tag"));
            }
            if bucket.keywords.is_empty() {
                return Err(invalid(&format!("'{}' has no keywords", bucket.tag)));
            }
            if bucket.keywords.iter().any(|k| k.is_empty()) {
                return Err(invalid(&format!("'{}' has an empty keyword", bucket.tag)));
            }
            if bucket.urls.is_empty() {
                return Err(invalid(&format!("'{}' has no urls", bucket.tag)));
            }
            if let Some(url) = bucket.urls.iter().find(|u| !is_absolute_url(u)) {
                return Err(invalid(&format!(
                    "'{}' has a non-absolute url: {url}",
                    bucket.tag
                )));
            }
            for keyword in bucket.keywords.iter_mut() {
                *keyword = keyword.to_lowercase();
            }
            if !seen_tags.insert(bucket.tag.clone()) {
                return Err(RouterError::DuplicateTag(bucket.tag.clone()));
            }
        }

        for tilt in Tilt::ALL {
            validate_pool(tilt, self.fallbacks.get(tilt))?;
        }

        if self.tilt_hints.is_empty() {
            return Err(RouterError::InvalidTiltHints(
                "at least one tilt hint is required".to_string(),
            ));
        }
        if self.tilt_hints.iter().any(|h| h.is_empty()) {
            return Err(RouterError::InvalidTiltHints(
                "hints must not be empty strings".to_string(),
            ));
        }
        for hint in self.tilt_hints.iter_mut() {
            *hint = hint.to_lowercase();
        }

        Ok(self)
    }

    /// Approved links for `query`: 1 to [`MAX_LINKS`] unique URLs.
    pub fn select_links(&self, query: &str) -> Vec<String> {
        self.select(query).links
    }

    pub fn select(&self, query: &str) -> LinkSelection<'_> {
        let text = query.to_lowercase();

        let matched = self.classify(&text);
        let mut links: Vec<String> = Vec::new();
        for bucket in self.buckets.iter().filter(|b| matched.contains(&b.tag.as_str())) {
            for url in &bucket.urls {
                if !links.contains(url) {
                    links.push(url.clone());
                }
            }
        }

        if links.is_empty() {
            let tilt = self.tilt_of(&text);
            debug!(%tilt, "no bucket matched, using fallback pool");
            return LinkSelection {
                links: self.fallbacks.get(tilt).capped().to_vec(),
                matched,
                fallback: Some(tilt),
            };
        }

        links.truncate(MAX_LINKS);
        LinkSelection {
            links,
            matched,
            fallback: None,
        }
    }

    /// Tags of every bucket the query hits, in definition order.
    pub fn classify(&self, query: &str) -> Vec<&str> {
        let text = query.to_lowercase();
        self.buckets
            .iter()
            .filter(|b| b.matches(&text))
            .map(|b| b.tag.as_str())
            .collect()
    }

    pub fn tilt(&self, query: &str) -> Tilt {
        self.tilt_of(&query.to_lowercase())
    }

    fn tilt_of(&self, text: &str) -> Tilt {
        if self.tilt_hints.iter().any(|h| text.contains(h.as_str())) {
            Tilt::Training
        } else {
            Tilt::Health
        }
    }

    /// Every URL the table can hand out.
    pub fn all_links(&self) -> HashSet<&str> {
        self.buckets
            .iter()
            .flat_map(|b| b.urls.iter())
            .chain(self.fallbacks.health.links.iter())
            .chain(self.fallbacks.training.links.iter())
            .map(|s| s.as_str())
            .collect()
    }
}

fn validate_pool(tilt: Tilt, pool: &FallbackPool) -> Result<(), RouterError> {
    let invalid = |message: String| RouterError::InvalidFallback { tilt, message };

    if pool.links.is_empty() {
        return Err(invalid("pool is empty".to_string()));
    }
    if pool.cap == 0 {
        return Err(invalid("cap must be at least 1".to_string()));
    }
    if let Some(url) = pool.links.iter().find(|u| !is_absolute_url(u)) {
        return Err(invalid(format!("non-absolute url: {url}")));
    }
    let unique: HashSet<&String> = pool.links.iter().collect();
    if unique.len() != pool.links.len() {
        return Err(invalid("pool contains duplicate links".to_string()));
    }
    Ok(())
}

fn is_absolute_url(url: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}
