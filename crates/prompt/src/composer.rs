//! Deterministic prompt assembly.
//!
//! The composed prompt has a fixed section order: system instructions,
//! prior turns oldest-first, retrieved context with attribution, the draft
//! under refinement, and finally the current request. Reproducibility of
//! this assembly is a tested property: the same `ComposeRequest` always
//! renders byte-identical output.

use crate::types::{ComposeRequest, ComposedPrompt};
use handlebars::Handlebars;
use scribe_core::{AppError, AppResult};

/// System instructions for the drafting assistant.
const SYSTEM_TEMPLATE: &str = "\
You are an email drafting assistant.

Your capabilities include:
1. Writing and editing email drafts
2. Using facts retrieved from the user's reference documents
3. Formatting emails with a subject, recipient, sender, and body

Always maintain a professional and helpful tone. Drafts must be clear,
concise, well-structured, and tailored to the stated purpose. When context
from reference documents is provided, prefer its facts over invention and
keep the cited details accurate.
{{#if has_draft}}
The current draft is shown in the conversation; revise it according to the
user's latest instructions instead of starting over.
{{/if}}";

/// User message template. Section order is fixed and load-bearing.
const USER_TEMPLATE: &str = "\
{{#if history}}Conversation so far:
{{#each history}}{{this.speaker}}: {{this.content}}
{{/each}}
{{/if}}\
{{#if retrieved_context}}Relevant context from reference documents:
{{retrieved_context}}

{{/if}}\
{{#if previous_draft}}Current draft:
{{previous_draft}}

{{/if}}\
Request: {{current_request}}";

/// Compose the prompt for one generation step.
pub fn compose(request: &ComposeRequest) -> AppResult<ComposedPrompt> {
    let mut handlebars = Handlebars::new();
    // Plain text output, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("system", SYSTEM_TEMPLATE)
        .and_then(|_| handlebars.register_template_string("user", USER_TEMPLATE))
        .map_err(|e| AppError::Other(format!("Failed to register prompt template: {}", e)))?;

    let system_data = serde_json::json!({
        "has_draft": request.previous_draft.is_some(),
    });
    let system = handlebars
        .render("system", &system_data)
        .map_err(|e| AppError::Other(format!("Failed to render system prompt: {}", e)))?;

    let user_data = serde_json::json!({
        "history": request.history.iter().map(|turn| {
            serde_json::json!({
                "speaker": turn.speaker.to_string(),
                "content": turn.content,
            })
        }).collect::<Vec<_>>(),
        "retrieved_context": request.retrieved_context,
        "previous_draft": request.previous_draft,
        "current_request": request.current_request,
    });
    let user = handlebars
        .render("user", &user_data)
        .map_err(|e| AppError::Other(format!("Failed to render user prompt: {}", e)))?;

    tracing::debug!(
        "Composed prompt: {} history turns, context: {}, refining: {}",
        request.history.len(),
        request.retrieved_context.is_some(),
        request.previous_draft.is_some()
    );

    Ok(ComposedPrompt {
        system: system.trim_end().to_string(),
        user,
    })
}
