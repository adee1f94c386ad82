use serde::Serialize;
use tracing::{debug, info};

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::model::{GuidanceNote, ScoredNote, Tilt};
use crate::notes::NoteCorpus;
use crate::rules::{LinkSelection, RuleTable};

/// Immutable snapshot of everything needed to ground a query.
///
/// Built once during startup and shared by reference; nothing here is ever
/// written after construction.
#[derive(Debug, Clone)]
pub struct SourceRouter {
    rules: RuleTable,
    corpus: NoteCorpus,
}

/// Links and notes selected for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grounding<'a> {
    pub links: Vec<String>,
    pub notes: Vec<&'a GuidanceNote>,
}

impl SourceRouter {
    pub fn new(rules: RuleTable, corpus: NoteCorpus) -> Self {
        Self { rules, corpus }
    }

    /// Load rules and notes as described by `config`. Rule errors are fatal;
    /// note problems only degrade the corpus.
    pub fn from_config(config: &RouterConfig) -> Result<Self, RouterError> {
        let rules = match &config.rules_path {
            Some(path) => RuleTable::load(path)?,
            None => RuleTable::builtin()?,
        };
        info!(
            version = %rules.version,
            buckets = rules.buckets.len(),
            tilt_hints = rules.tilt_hints.len(),
            "rule table loaded"
        );

        let corpus = NoteCorpus::load(&config.notes_dir);
        Ok(Self::new(rules, corpus))
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn corpus(&self) -> &NoteCorpus {
        &self.corpus
    }

    pub fn select_links(&self, query: &str) -> Vec<String> {
        self.rules.select_links(query)
    }

    pub fn select(&self, query: &str) -> LinkSelection<'_> {
        self.rules.select(query)
    }

    pub fn tilt(&self, query: &str) -> Tilt {
        self.rules.tilt(query)
    }

    pub fn select_notes(&self, query: &str, max: usize) -> Vec<&GuidanceNote> {
        self.corpus.select_notes(query, max)
    }

    pub fn rank_notes(&self, query: &str) -> Vec<ScoredNote<'_>> {
        self.corpus.rank_notes(query)
    }

    pub fn ground(&self, query: &str, max_notes: usize) -> Grounding<'_> {
        let selection = self.rules.select(query);
        let notes = self.corpus.select_notes(query, max_notes);
        debug!(
            matched = ?selection.matched,
            fallback = ?selection.fallback,
            links = selection.links.len(),
            notes = notes.len(),
            "query grounded"
        );
        Grounding {
            links: selection.links,
            notes,
        }
    }
}
