use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use source_router::{LinkSelection, ScoredNote};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectLinksParams {
    /// The end-user question, verbatim.
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectNotesParams {
    /// The end-user question, verbatim.
    pub query: String,
    /// Maximum number of notes to return (default: 2, max: 20).
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GroundQueryParams {
    /// The end-user question, verbatim.
    pub query: String,
    /// Maximum number of notes to include (default: 2, max: 20).
    pub max_notes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectLinksResponse {
    /// Approved citation links, 1 to 4, in routing order.
    pub links: Vec<String>,
    /// Tags of the topic buckets the query matched.
    pub matched_buckets: Vec<String>,
    /// "health" or "training" when no bucket matched and a fallback pool was used.
    pub fallback: Option<String>,
}

impl From<LinkSelection<'_>> for SelectLinksResponse {
    fn from(selection: LinkSelection<'_>) -> Self {
        Self {
            links: selection.links,
            matched_buckets: selection.matched.iter().map(|t| t.to_string()).collect(),
            fallback: selection.fallback.map(|t| t.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteMatch {
    pub id: String,
    pub title: String,
    pub score: u32,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub body: String,
}

impl From<ScoredNote<'_>> for NoteMatch {
    fn from(scored: ScoredNote<'_>) -> Self {
        Self {
            id: scored.note.id.clone(),
            title: scored.note.title.clone(),
            score: scored.score,
            tags: scored.note.tags.clone(),
            keywords: scored.note.keywords.clone(),
            body: scored.note.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectNotesResponse {
    pub notes: Vec<NoteMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroundQueryResponse {
    pub links: SelectLinksResponse,
    pub notes: Vec<NoteMatch>,
}
