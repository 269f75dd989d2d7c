use std::sync::Arc;

use chat_http::{AppState, ServerConfig};
use openai_api::secret::{
    ChainSecretProvider, EnvSecretProvider, FileSecretProvider, SecretProvider,
};
use openai_api::{LazyOpenAIHandler, OpenAIConfig};
use text_completion::RequestHandler;
use tracing::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(
        "Starting... CARGO_PKG_NAME={}, CARGO_PKG_VERSION={}, version={}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        option_env!("version").unwrap_or("(not defined at compile)")
    );

    let server_config = ServerConfig::from_env()?;
    let openai_config = OpenAIConfig::from_env()?;
    info!(
        "Using Assistant ID: {}, Organization ID: {}, poll every {:?} for at most {:?}",
        present(&openai_config.assistant_id),
        present(&openai_config.organization),
        openai_config.poll.interval,
        openai_config.poll.timeout
    );
    if openai_config.assistant_id.is_none() {
        warn!("ASSISTANT_ID is not set, every /chat request will fail");
    }

    //OPENAI_API_KEY first, then the mounted secret file
    let providers: Vec<Box<dyn SecretProvider>> = vec![
        Box::new(EnvSecretProvider),
        Box::new(FileSecretProvider {
            dir: openai_config.secrets_dir.clone(),
        }),
    ];
    let secrets = ChainSecretProvider { providers };
    let handler = Arc::new(LazyOpenAIHandler::new(openai_config, Arc::new(secrets)));

    let listener = chat_http::bind(&server_config).await?;
    tokio::spawn(test_connection(handler.clone()));

    let state = AppState::new(handler, build_version());
    chat_http::serve(listener, chat_http::create_router(state)).await?;
    Ok(())
}

/// `VERSION` given at build time, else the package version.
fn build_version() -> &'static str {
    match option_env!("version") {
        Some(version) if version != "unknown" => version,
        _ => env!("CARGO_PKG_VERSION"),
    }
}

fn present(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "Present"
    } else {
        "Missing"
    }
}

/// Lists assistants once, which also builds the client ahead of the first request.
async fn test_connection(handler: Arc<LazyOpenAIHandler>) {
    info!("Testing OpenAI connection...");
    match handler.check_connection().await {
        Ok(count) => info!("OpenAI connection successful. Found {} assistants", count),
        Err(e) => error!("OpenAI connection test failed: {}", e),
    }
    if !handler.is_initialized() {
        warn!("OpenAI client not built yet, the first request will try again");
    }
}
