mod config;
mod error;
mod guard;
mod prompt;
mod rate_limit;
mod server;
mod widget;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use canine_common::openai::OpenAiClient;
use source_router::SourceRouter;

use config::AssistantConfig;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting canine assistant");

    let config = AssistantConfig::from_env()?;
    info!(
        base_url = %config.openai.base_url,
        model = %config.model,
        timeout_ms = config.openai.default_timeout.as_millis(),
        max_retries = config.openai.max_retries,
        "openai client configured"
    );
    info!(
        allowed_origin = %config.allowed_origin,
        allowed_path = %config.allowed_path,
        rate_limit_max = config.rate_limit_max,
        rate_limit_window_secs = config.rate_limit_window.as_secs(),
        "request guards configured"
    );

    let router = Arc::new(SourceRouter::from_config(&config.router)?);
    let openai = Arc::new(OpenAiClient::new(config.openai.clone())?);
    let listen_addr = config.listen_addr;
    let app = server::app(AppState::new(router, openai, config));

    let listener = TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listen_addr, "canine assistant ready, serving HTTP");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
