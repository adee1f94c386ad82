use std::fmt;

use serde::{Deserialize, Serialize};

/// A named rule tying trigger keywords to a fixed set of citation links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBucket {
    /// Unique identifier, e.g. "parasites"
    #[serde(default)]
    pub tag: String,
    /// Lowercase substrings; any hit selects the bucket
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Absolute citation URLs, emitted in this order
    #[serde(default, alias = "links")]
    pub urls: Vec<String>,
}

impl TopicBucket {
    /// `text` must already be lowercased.
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Default citation set used when no bucket matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPool {
    #[serde(default, alias = "urls")]
    pub links: Vec<String>,
    /// Maximum number of links handed out from this pool
    pub cap: usize,
}

impl FallbackPool {
    pub fn capped(&self) -> &[String] {
        &self.links[..self.cap.min(self.links.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPools {
    pub health: FallbackPool,
    pub training: FallbackPool,
}

impl FallbackPools {
    pub fn get(&self, tilt: Tilt) -> &FallbackPool {
        match tilt {
            Tilt::Health => &self.health,
            Tilt::Training => &self.training,
        }
    }
}

/// Which fallback pool applies to an unmatched query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tilt {
    Health,
    Training,
}

impl Tilt {
    pub const ALL: [Tilt; 2] = [Tilt::Health, Tilt::Training];

    pub fn as_str(self) -> &'static str {
        match self {
            Tilt::Health => "health",
            Tilt::Training => "training",
        }
    }
}

impl fmt::Display for Tilt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A first-party guidance document used as private grounding context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceNote {
    /// Source file name, e.g. "xylitol.md"
    pub id: String,
    /// Title from metadata, or the file stem
    pub title: String,
    /// Ordered set; duplicates dropped at load
    pub tags: Vec<String>,
    /// Ordered set; duplicates dropped at load
    pub keywords: Vec<String>,
    /// Document text after the metadata block, trimmed
    pub body: String,
}

/// A note paired with its score for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredNote<'a> {
    pub note: &'a GuidanceNote,
    pub score: u32,
}
