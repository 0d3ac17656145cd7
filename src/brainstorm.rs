//! Company-name brainstorming on top of the inference provider

use crate::llm::{LlmError, LlmRequest, LlmService};

pub const DEFAULT_PROMPT: &str = "Tech startup in eco-friendly logistics";
pub const DEFAULT_COUNT: usize = 5;

const MAX_NEW_TOKENS: u32 = 50;
const MAX_NAME_CHARS: usize = 40;

pub fn name_ideas_prompt(prompt: &str) -> String {
    format!("{prompt}\nCompany name ideas:\n")
}

/// Keep short, non-empty lines of the generated text
pub fn parse_name_ideas(text: &str, count: usize) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.chars().count() < MAX_NAME_CHARS)
        .take(count)
        .map(str::to_string)
        .collect()
}

pub async fn brainstorm(
    llm: &dyn LlmService,
    prompt: &str,
    count: usize,
) -> Result<Vec<String>, LlmError> {
    let request = LlmRequest {
        max_tokens: Some(MAX_NEW_TOKENS),
        ..LlmRequest::prompt(name_ideas_prompt(prompt))
    };

    let response = llm.complete(&request).await?;
    let ideas = parse_name_ideas(&response.text, count);
    tracing::debug!(model = llm.model_id(), ideas = ideas.len(), "Brainstorm finished");
    Ok(ideas)
}
