pub mod mcp_api;
pub mod openai;
