//! Curated source routing for the canine assistant.
//!
//! Two independent, read-only components are built once at startup and
//! queried per request:
//! - [`RuleTable`] maps a query to approved citation links.
//! - [`NoteCorpus`] ranks first-party guidance notes against a query.
//!
//! [`SourceRouter`] bundles both into one immutable snapshot.

pub mod config;
pub mod error;
pub mod model;
pub mod notes;
pub mod parser;
pub mod router;
pub mod rules;

pub use config::RouterConfig;
pub use error::RouterError;
pub use model::{FallbackPool, GuidanceNote, ScoredNote, Tilt, TopicBucket};
pub use notes::NoteCorpus;
pub use router::{Grounding, SourceRouter};
pub use rules::{LinkSelection, RuleTable, MAX_LINKS};
