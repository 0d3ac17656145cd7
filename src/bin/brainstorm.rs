//! Company-name brainstorming against the local inference server
//!
//! Usage: `nile-brainstorm [PROMPT] [COUNT]`

use nile_chat::brainstorm::{brainstorm, DEFAULT_COUNT, DEFAULT_PROMPT};
use nile_chat::config::ChatConfig;
use nile_chat::llm::{LocalModelService, LoggingService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nile_chat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let prompt = args.next().unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    let count = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|e| format!("COUNT must be a number, got {raw:?}: {e}"))?,
        None => DEFAULT_COUNT,
    };

    let config = ChatConfig::from_env();
    let model_id = config.resolve_model_id()?;
    let local = LocalModelService::new(&config.llm_url, model_id, config.llm_timeout)?;
    let llm = LoggingService::new(Arc::new(local));

    let ideas = brainstorm(&llm, &prompt, count).await?;
    if ideas.is_empty() {
        tracing::warn!("Model produced no usable name ideas");
    }
    for idea in ideas {
        println!("{idea}");
    }

    Ok(())
}
