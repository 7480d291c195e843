//! Prompt assembly.

use docchat_model::ChatRequest;

use crate::config::GenerationConfig;
use crate::conversation::{Conversation, PendingTurn};
use crate::document::RetrievalResult;
use crate::error::{RagError, Result};

/// The default question template. `{context}` receives the retrieved chunks
/// joined by newlines, `{question}` the user's question.
pub const DEFAULT_TEMPLATE: &str = "Use the context below to answer the question:\n\nContext:\n{context}\n\nQuestion: {question}\nAnswer:";

const CONTEXT: &str = "{context}";
const QUESTION: &str = "{question}";

/// Combines retrieved context, the question and the conversation into a
/// backend request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
    generation: GenerationConfig,
}

impl PromptBuilder {
    /// Create a builder using [`DEFAULT_TEMPLATE`].
    pub fn new(generation: GenerationConfig) -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string(), generation }
    }

    /// Use a custom template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] unless the template contains both
    /// `{context}` and `{question}`.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT, QUESTION] {
            if !template.contains(placeholder) {
                return Err(RagError::ConfigError(format!(
                    "prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        self.template = template;
        Ok(self)
    }

    /// The generation parameters attached to every request.
    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    /// Interpolate the question and context into the template.
    ///
    /// Placeholders are expanded in a single pass, so text inside the
    /// question or context that looks like a placeholder is left alone.
    pub fn render(&self, question: &str, context: &RetrievalResult) -> String {
        let context = context.joined();
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            if let Some(after) = tail.strip_prefix(CONTEXT) {
                out.push_str(&context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUESTION) {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }

    /// Append the rendered prompt to `conversation` as a user message and
    /// build the backend request from the resulting history.
    ///
    /// The returned [`PreparedTurn`] must be committed with the assistant
    /// reply; dropping it removes the user message again.
    pub fn build<'a>(
        &self,
        question: &str,
        context: &RetrievalResult,
        conversation: &'a mut Conversation,
    ) -> PreparedTurn<'a> {
        let prompt = self.render(question, context);
        let turn = conversation.begin_turn(prompt);
        let request = ChatRequest::new(
            self.generation.model.clone(),
            turn.request_messages(),
            self.generation.temperature,
        );
        PreparedTurn { request, turn }
    }
}

/// A backend request together with the turn it belongs to.
#[derive(Debug)]
pub struct PreparedTurn<'a> {
    /// The payload for the generation backend.
    pub request: ChatRequest,
    turn: PendingTurn<'a>,
}

impl PreparedTurn<'_> {
    /// The rendered user prompt.
    pub fn prompt(&self) -> &str {
        self.turn.prompt()
    }

    /// Record the assistant reply and keep the turn.
    pub fn commit(self, answer: impl Into<String>) {
        self.turn.commit(answer);
    }
}

#[cfg(test)]
mod tests {
    use docchat_model::Role;

    use super::*;
    use crate::document::RetrievedChunk;

    fn context(texts: &[&str]) -> RetrievalResult {
        RetrievalResult {
            chunks: texts
                .iter()
                .enumerate()
                .map(|(i, t)| RetrievedChunk {
                    chunk_id: i,
                    text: t.to_string(),
                    distance: i as f32,
                })
                .collect(),
        }
    }

    #[test]
    fn default_template_layout() {
        let builder = PromptBuilder::new(GenerationConfig::default());
        let retrieved = context(&["The sky is blue.", "Grass is green."]);
        let prompt = builder.render("What color is the sky?", &retrieved);
        assert_eq!(
            prompt,
            "Use the context below to answer the question:\n\nContext:\nThe sky is blue.\nGrass is green.\n\nQuestion: What color is the sky?\nAnswer:"
        );
    }

    #[test]
    fn placeholder_text_in_inputs_is_not_expanded() {
        let builder = PromptBuilder::new(GenerationConfig::default());
        let prompt = builder.render("what is {context}?", &context(&["see {question}"]));
        assert!(prompt.contains("Context:\nsee {question}\n"));
        assert!(prompt.contains("Question: what is {context}?\n"));
    }

    #[test]
    fn custom_template_must_have_both_placeholders() {
        let builder = PromptBuilder::new(GenerationConfig::default());
        assert!(builder.clone().with_template("Only {question}").is_err());

        let builder = builder.with_template("Q={question} {braces} C={context}").unwrap();
        assert_eq!(builder.render("why", &context(&["because"])), "Q=why {braces} C=because");
    }

    #[test]
    fn build_sends_full_history_and_appends_user_message() {
        let builder = PromptBuilder::new(GenerationConfig::default());
        let mut conversation = Conversation::new("You are a helpful assistant.");
        conversation.begin_turn("earlier").commit("reply");

        let prepared = builder.build("next?", &context(&["ctx"]), &mut conversation);
        assert_eq!(prepared.request.model, "mistralai/mistral-7b-instruct");
        assert_eq!(prepared.request.temperature, 0.3);
        assert_eq!(prepared.request.messages.len(), 4);
        assert_eq!(prepared.request.messages[3].role, Role::User);
        assert!(prepared.request.messages[3].content.contains("Question: next?"));
        prepared.commit("done");

        assert_eq!(conversation.len(), 5);
    }
}
