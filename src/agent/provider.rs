// ABOUTME: Completion provider seam — the trait the debate loop streams replies through.
// ABOUTME: Builds the OpenAI-compatible client from config and secrets.

use std::sync::Arc;

use futures::stream::BoxStream;

use crate::agent::openai::OpenAiClient;
use crate::config::LlmConfig;
use crate::error::CompletionError;
use crate::session::Message;

/// Lazy sequence of reply fragments. Concatenated in order they form the full reply.
pub type FragmentStream = BoxStream<'static, Result<String, CompletionError>>;

/// A chat-completion service that streams its reply.
pub trait CompletionClient: Send + Sync {
    /// Model identifier shown in the status bar.
    fn model(&self) -> &str;

    /// Stream a reply to `messages`, with `system_prompt` sent ahead of them.
    fn stream_reply(&self, system_prompt: &str, messages: &[Message]) -> FragmentStream;
}

/// The request transcript: system instruction first, then the full history in order.
pub fn request_messages(system_prompt: &str, messages: &[Message]) -> Vec<Message> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    all.push(Message::system(system_prompt));
    all.extend(messages.iter().cloned());
    all
}

/// Create the completion client described by `config`.
pub fn create_client(config: &LlmConfig, api_key: &str) -> anyhow::Result<Arc<dyn CompletionClient>> {
    if config.model.trim().is_empty() {
        anyhow::bail!("llm.model must not be empty");
    }
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        anyhow::bail!(
            "llm.base_url must be an http(s) URL, got '{}'",
            config.base_url
        );
    }

    let client = OpenAiClient::new(api_key, &config.model)
        .with_base_url(&config.base_url)
        .with_max_tokens(config.max_tokens);
    Ok(Arc::new(client))
}
