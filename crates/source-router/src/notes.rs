/// House guidance note corpus and keyword scoring.
///
/// The corpus is read once from a directory of `*.md` files, in file-name
/// order, and is immutable afterwards. Scoring per note:
/// - +3 for each keyword contained in the lowercased query
/// - +2 for each tag contained in the query
/// - +1 if the lowercased title is contained in the query
///
/// A note that still scores 0 gets +1 when the query's first token (the text
/// before the first whitespace character) appears anywhere in its body. That fallback favors recall over precision: short
/// queries surface something, and a common first word ("my", "how") can
/// surface unrelated notes.
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::model::{GuidanceNote, ScoredNote};
use crate::parser::parse_note;

/// Number of notes handed to the model when the caller does not say.
pub const DEFAULT_MAX_NOTES: usize = 2;

const KEYWORD_WEIGHT: u32 = 3;
const TAG_WEIGHT: u32 = 2;
const TITLE_WEIGHT: u32 = 1;
const BODY_FALLBACK_WEIGHT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCorpus {
    notes: Vec<GuidanceNote>,
    fingerprint: String,
}

impl Default for NoteCorpus {
    fn default() -> Self {
        Self::from_notes(Vec::new())
    }
}

impl NoteCorpus {
    /// Load every `*.md` file in `dir`. A missing or unreadable directory
    /// yields an empty corpus; a bad file is skipped with a warning.
    pub fn load(dir: &Path) -> Self {
        if !dir.exists() {
            info!(dir = %dir.display(), "notes directory not found, corpus is empty");
            return Self::default();
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "failed to list notes directory, corpus is empty");
                return Self::default();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| {
                entry
                    .inspect_err(|e| warn!(error = %e, "failed to read directory entry"))
                    .ok()
            })
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "md") && path.is_file())
            .collect();
        files.sort();

        let mut notes = Vec::with_capacity(files.len());
        for path in files {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, file = %path.display(), "failed to read note, skipping");
                    continue;
                }
            };

            let parsed = parse_note(&file_name, &String::from_utf8_lossy(&bytes));
            for warning in &parsed.warnings {
                warn!(file = %file_name, %warning, "note metadata degraded to defaults");
            }
            notes.push(parsed.note);
        }

        let corpus = Self::from_notes(notes);
        info!(
            dir = %dir.display(),
            notes = corpus.len(),
            fingerprint = %corpus.fingerprint(),
            "notes corpus loaded"
        );
        corpus
    }

    /// Notes are kept in the given order; that order breaks score ties.
    pub fn from_notes(notes: Vec<GuidanceNote>) -> Self {
        let fingerprint = fingerprint(&notes);
        Self { notes, fingerprint }
    }

    pub fn notes(&self) -> &[GuidanceNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// SHA-256 over every note's id, metadata and body.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Notes with a positive score, best first; equal scores keep corpus order.
    pub fn rank_notes(&self, query: &str) -> Vec<ScoredNote<'_>> {
        let text = query.to_lowercase();
        let mut scored: Vec<ScoredNote<'_>> = self
            .notes
            .iter()
            .map(|note| ScoredNote {
                note,
                score: score_note(note, &text),
            })
            .filter(|s| s.score > 0)
            .collect();
        // Stable: ties stay in corpus order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    pub fn select_notes(&self, query: &str, max: usize) -> Vec<&GuidanceNote> {
        self.rank_notes(query)
            .into_iter()
            .take(max)
            .map(|s| s.note)
            .collect()
    }
}

/// `text` must already be lowercased.
fn score_note(note: &GuidanceNote, text: &str) -> u32 {
    let hits = |items: &[String]| {
        items
            .iter()
            .filter(|item| !item.is_empty() && text.contains(item.to_lowercase().as_str()))
            .count() as u32
    };

    let mut score = KEYWORD_WEIGHT * hits(&note.keywords) + TAG_WEIGHT * hits(&note.tags);
    let title = note.title.to_lowercase();
    if !title.is_empty() && text.contains(title.as_str()) {
        score += TITLE_WEIGHT;
    }

    // A query that opens with whitespace has an empty first token and no fallback.
    let first = text.split(char::is_whitespace).next().unwrap_or("");
    if score == 0 && !first.is_empty() && note.body.to_lowercase().contains(first) {
        score += BODY_FALLBACK_WEIGHT;
    }
    score
}

fn fingerprint(notes: &[GuidanceNote]) -> String {
    let mut hasher = Sha256::new();
    for note in notes {
        for field in [&note.id, &note.title, &note.body] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        for list in [&note.tags, &note.keywords] {
            hasher.update(list.join("\u{1f}").as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([0xffu8]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, title: &str, tags: &[&str], keywords: &[&str], body: &str) -> GuidanceNote {
        GuidanceNote {
            id: id.to_string(),
            title: title.to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            body: body.to_string(),
        }
    }

    fn ids(notes: &[&GuidanceNote]) -> Vec<String> {
        notes.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn keyword_hit_outranks_tag_hit() {
        let corpus = NoteCorpus::from_notes(vec![
            note("owners.md", "Owner checklist", &["dog"], &[], "Keep the vet's number handy."),
            note(
                "xylitol.md",
                "Xylitol toxicity",
                &["toxicity"],
                &["xylitol"],
                "Sugar-free gum is dangerous.",
            ),
        ]);

        let ranked = corpus.rank_notes("my dog ate xylitol, help");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].note.id, "xylitol.md");
        assert!(ranked[0].score >= 3);
        assert_eq!(ranked[1].note.id, "owners.md");
        assert_eq!(ranked[1].score, 2);
    }

    #[test]
    fn scores_add_up_across_fields() {
        let corpus = NoteCorpus::from_notes(vec![note(
            "grapes.md",
            "Grapes",
            &["toxicity", "kidney"],
            &["grapes", "raisins"],
            "",
        )]);
        let ranked = corpus.rank_notes("Grapes, raisins and kidney toxicity");
        // 2 keywords, 2 tags, title
        assert_eq!(ranked[0].score, 3 * 2 + 2 * 2 + 1);
    }

    #[test]
    fn empty_query_selects_nothing() {
        let corpus = NoteCorpus::from_notes(vec![note("a.md", "Note A", &[], &[], "anything")]);
        assert!(corpus.select_notes("", 5).is_empty());
        assert!(corpus.select_notes("   ", 5).is_empty());
    }

    #[test]
    fn equal_scores_keep_corpus_order() {
        let corpus = NoteCorpus::from_notes(vec![
            note("c.md", "Note C", &["crate"], &[], ""),
            note("a.md", "Note A", &[], &["crate"], ""),
            note("b.md", "Note B", &["crate"], &[], ""),
            note("d.md", "Note D", &[], &[], "unrelated"),
        ]);
        let selected = corpus.select_notes("crate training", 10);
        assert_eq!(ids(&selected), vec!["a.md", "c.md", "b.md"]);
        assert_eq!(ids(&corpus.select_notes("crate training", 2)), vec!["a.md", "c.md"]);
        assert!(corpus.select_notes("crate training", 0).is_empty());
    }

    #[test]
    fn weak_fallback_uses_first_token_in_body() {
        let corpus = NoteCorpus::from_notes(vec![
            note("raisins.md", "Dried fruit", &[], &[], "Raisins can cause kidney failure."),
            note("walks.md", "Walks", &[], &[], "Short walks twice a day."),
        ]);
        let ranked = corpus.rank_notes("raisins are they safe?");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].note.id, "raisins.md");
        assert_eq!(ranked[0].score, 1);
    }

    #[test]
    fn weak_fallback_needs_a_leading_token() {
        let corpus = NoteCorpus::from_notes(vec![note(
            "raisins.md",
            "Dried fruit",
            &[],
            &[],
            "Raisins can cause kidney failure.",
        )]);
        assert!(corpus.select_notes(" raisins", 2).is_empty());
        assert!(corpus.select_notes("\traisins", 2).is_empty());
        assert_eq!(corpus.select_notes("raisins ", 2).len(), 1);
    }

    #[test]
    fn weak_fallback_is_low_precision() {
        // "my" is the first token and appears in an unrelated body.
        let corpus = NoteCorpus::from_notes(vec![note(
            "grooming.md",
            "Grooming",
            &[],
            &[],
            "Brush my coat weekly.",
        )]);
        assert_eq!(corpus.select_notes("my dog is limping", 2).len(), 1);
    }

    #[test]
    fn weak_fallback_skipped_when_something_scored() {
        let corpus = NoteCorpus::from_notes(vec![note(
            "fleas.md",
            "Fleas",
            &[],
            &["flea"],
            "flea flea flea",
        )]);
        assert_eq!(corpus.rank_notes("flea comb").first().map(|s| s.score), Some(3));
    }

    #[test]
    fn missing_directory_is_empty_corpus() {
        let corpus = NoteCorpus::load(Path::new("/nonexistent/house_notes"));
        assert!(corpus.is_empty());
        assert!(corpus.select_notes("anything at all", 2).is_empty());
    }

    #[test]
    fn load_reads_markdown_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b-xylitol.md"),
            "---\ntitle: Xylitol\ntags: [toxicity]\nkeywords: [xylitol]\n---\nCall a vet.\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a-crate.md"), "Crate training basics.").unwrap();
        std::fs::write(dir.path().join("c-broken.md"), "---\ntags: oops\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.md")).unwrap();

        let corpus = NoteCorpus::load(dir.path());
        let loaded: Vec<&str> = corpus.notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(loaded, vec!["a-crate.md", "b-xylitol.md", "c-broken.md"]);
        assert_eq!(corpus.notes()[0].title, "a-crate");
        assert_eq!(corpus.notes()[1].keywords, vec!["xylitol"]);
        assert_eq!(corpus.notes()[2].title, "c-broken");

        let selected = corpus.select_notes("my dog ate xylitol", 2);
        assert_eq!(selected[0].id, "b-xylitol.md");
    }

    #[test]
    fn reloading_yields_identical_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.md"), "---\ntitle: One\n---\nfirst").unwrap();
        std::fs::write(dir.path().join("two.md"), "second").unwrap();

        let first = NoteCorpus::load(dir.path());
        let second = NoteCorpus::load(dir.path());
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());

        std::fs::write(dir.path().join("two.md"), "second, edited").unwrap();
        let third = NoteCorpus::load(dir.path());
        assert_ne!(first.fingerprint(), third.fingerprint());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bytes.md"), b"caf\xff treats").unwrap();
        let corpus = NoteCorpus::load(dir.path());
        assert_eq!(corpus.len(), 1);
        assert!(corpus.notes()[0].body.ends_with("treats"));
    }
}
