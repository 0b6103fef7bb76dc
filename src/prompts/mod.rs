//! System prompt construction for Confab
//!
//! The instruction preamble is rebuilt from scratch on every query; stored
//! system messages are never replayed, so the preamble cannot accumulate.
//! When a directory analysis is cached its rendering rides along in the
//! same leading system message, which also carries the provider cache hint.

use crate::context::store::{AnalysisCache, Message};
use crate::providers::ChatMessage;

/// Builds the base system prompt for the assistant
pub fn base_system_prompt(os: &str, directory: &str) -> String {
    format!(
        "You are a helpful AI assistant integrated into the 'confab' CLI tool. You help users \
         work with their projects through conversational queries.\n\
         \n\
         IMPORTANT CONTEXT AWARENESS:\n\
         - This is a stateful conversation. You have access to the full conversation history.\n\
         - You are currently in directory: {directory}\n\
         - The user can run 'confab ask --analyze <query>' to provide you with project \
         structure information.\n\
         - If you need more context about the project structure, suggest: 'For more context, \
         try: confab ask --analyze \"your question here\"'\n\
         - Note: Queries with special shell characters should be quoted\n\
         \n\
         ENVIRONMENT INFORMATION:\n\
         - You are running in a CLI in a bare xterm-compatible shell\n\
         - Do not use markdown formatting as there is nothing to render it\n\
         \n\
         RESPONSE STYLE:\n\
         - Be concise\n\
         - Provide concrete, actionable answers\n\
         - Include code examples when relevant\n\
         - Reference previous conversation when relevant\n\
         \n\
         CONTEXT MANAGEMENT:\n\
         - This conversation has a limited context window\n\
         - If the conversation becomes too long, you will be asked to help prune less relevant \
         exchanges\n\
         - When asked to prune, identify the least relevant exchanges and suggest removing them\n\
         \n\
         OS: {os}"
    )
}

/// Renders the cached directory analysis as additional system context
pub fn analysis_system_prompt(cache: &AnalysisCache) -> String {
    let mut prompt = String::from(
        "\n\nPROJECT ANALYSIS:\nThe following information has been gathered about this \
         project:\n\n",
    );

    if !cache.file_tree.is_empty() {
        prompt.push_str(&format!("FILE TREE:\n{}\n\n", cache.file_tree));
    }

    if let Some(readme) = cache.readme_content.as_deref() {
        if !readme.is_empty() {
            prompt.push_str(&format!("README:\n{}\n\n", readme));
        }
    }

    if !cache.primary_configs.is_empty() {
        prompt.push_str("PRIMARY CONFIGURATION FILES:\n");
        for config in &cache.primary_configs {
            prompt.push_str(&format!("- {}\n", config));
        }
        prompt.push('\n');
    }

    prompt.push_str("Use this information to provide more accurate and project-specific responses.");
    prompt
}

/// Assembles the outbound message sequence for one query
///
/// The freshly built preamble (plus analysis rendering, when present) goes
/// first as a cache-hinted system message, followed by the stored
/// conversation in order. Stored system-role messages are dropped from the
/// replay.
pub fn build_messages(
    directory: &str,
    os: &str,
    messages: &[Message],
    analysis: Option<&AnalysisCache>,
) -> Vec<ChatMessage> {
    let mut system_prompt = base_system_prompt(os, directory);
    if let Some(cache) = analysis {
        system_prompt.push_str(&analysis_system_prompt(cache));
    }

    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(ChatMessage::system(system_prompt).with_cache_hint());

    for msg in messages {
        if msg.is_system() {
            continue;
        }
        out.push(ChatMessage {
            role: msg.role.clone(),
            content: msg.content.clone(),
            cache_hint: false,
        });
    }

    out
}
