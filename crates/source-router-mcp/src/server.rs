use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use canine_common::mcp_api::{
    GroundQueryParams, GroundQueryResponse, NoteMatch, SelectLinksParams, SelectLinksResponse,
    SelectNotesParams, SelectNotesResponse,
};
use source_router::SourceRouter;

const MAX_NOTES_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct SourceRouterServer {
    router: Arc<SourceRouter>,
    default_max_notes: usize,
    tool_router: ToolRouter<SourceRouterServer>,
}

impl SourceRouterServer {
    pub fn new(router: Arc<SourceRouter>, default_max_notes: usize) -> Self {
        Self {
            router,
            default_max_notes,
            tool_router: Self::tool_router(),
        }
    }

    fn notes_limit(&self, requested: Option<u32>) -> usize {
        requested
            .map(|n| n.min(MAX_NOTES_LIMIT) as usize)
            .unwrap_or(self.default_max_notes)
    }

    fn ranked_notes(&self, query: &str, max: usize) -> Vec<NoteMatch> {
        self.router
            .rank_notes(query)
            .into_iter()
            .take(max)
            .map(NoteMatch::from)
            .collect()
    }
}

#[tool_router]
impl SourceRouterServer {
    #[tool(description = "Select the approved citation links for a dog health or training question. Returns 1-4 links plus the matched topic buckets, or the fallback pool used when nothing matched.")]
    async fn select_links(
        &self,
        Parameters(params): Parameters<SelectLinksParams>,
    ) -> Result<Json<SelectLinksResponse>, String> {
        let selection = self.router.select(&params.query);
        info!(
            matched = ?selection.matched,
            fallback = ?selection.fallback,
            "select_links"
        );
        Ok(Json(selection.into()))
    }

    #[tool(description = "Rank house guidance notes against a question by keyword, tag and title overlap. Returns the best notes with their scores.")]
    async fn select_notes(
        &self,
        Parameters(params): Parameters<SelectNotesParams>,
    ) -> Result<Json<SelectNotesResponse>, String> {
        let max = self.notes_limit(params.max);
        let notes = self.ranked_notes(&params.query, max);
        info!(max, returned = notes.len(), "select_notes");
        Ok(Json(SelectNotesResponse { notes }))
    }

    #[tool(description = "Build the full grounding payload for a question: approved links and the house guidance notes that would be given to the model.")]
    async fn ground_query(
        &self,
        Parameters(params): Parameters<GroundQueryParams>,
    ) -> Result<Json<GroundQueryResponse>, String> {
        let max = self.notes_limit(params.max_notes);
        let links = SelectLinksResponse::from(self.router.select(&params.query));
        let notes = self.ranked_notes(&params.query, max);
        Ok(Json(GroundQueryResponse { links, notes }))
    }
}

#[tool_handler]
impl ServerHandler for SourceRouterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "source-router".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Curated source router for the canine assistant (rules {}, {} house notes). \
Use select_links to see which approved citations a question receives, select_notes to see which \
house guidance notes it pulls in, and ground_query for both at once.",
                self.router.rules().version,
                self.router.corpus().len()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use source_router::{GuidanceNote, NoteCorpus, RuleTable};

    use super::*;

    fn server() -> SourceRouterServer {
        let corpus = NoteCorpus::from_notes(vec![GuidanceNote {
            id: "xylitol.md".to_string(),
            title: "Sweetener poisoning".to_string(),
            tags: vec!["toxicity".to_string()],
            keywords: vec!["xylitol".to_string()],
            body: "Call an emergency vet.".to_string(),
        }]);
        let router = SourceRouter::new(RuleTable::builtin().unwrap(), corpus);
        SourceRouterServer::new(Arc::new(router), 2)
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = SourceRouterServer::tool_router().list_all();
        for name in ["select_links", "select_notes", "ground_query"] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn select_links_reports_fallback() {
        let Json(response) = server()
            .select_links(Parameters(SelectLinksParams {
                query: "what's the weather today".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(response.links.len(), 3);
        assert!(response.matched_buckets.is_empty());
        assert_eq!(response.fallback.as_deref(), Some("health"));
    }

    #[tokio::test]
    async fn ground_query_includes_scored_notes() {
        let Json(response) = server()
            .ground_query(Parameters(GroundQueryParams {
                query: "my dog ate xylitol".to_string(),
                max_notes: None,
            }))
            .await
            .unwrap();
        assert_eq!(response.links.matched_buckets, vec!["emergency_poison"]);
        assert_eq!(response.notes.len(), 1);
        assert_eq!(response.notes[0].score, 3);
    }

    #[tokio::test]
    async fn select_notes_honors_zero_max() {
        let Json(response) = server()
            .select_notes(Parameters(SelectNotesParams {
                query: "xylitol".to_string(),
                max: Some(0),
            }))
            .await
            .unwrap();
        assert!(response.notes.is_empty());
    }
}
