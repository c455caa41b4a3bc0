//! AI-assisted content suggestion for notes.
//!
//! `ContentSuggester` forwards a note's title and content to the
//! text-generation endpoint as a single extend/improve prompt and hands
//! back the first completion verbatim. An empty completion is a valid,
//! non-exceptional outcome: there is simply no suggestion.

use std::sync::Arc;

use crate::ollama::{OllamaClientTrait, OllamaError};

/// Prompt template for content suggestion.
///
/// Instructs the model to extend and improve the given note. The reply is
/// used verbatim as the suggested content, so the prompt forbids any
/// framing around it.
const PROMPT_TEMPLATE: &str = r#"You are a note-writing assistant. Extend and improve the note below: develop its ideas, fix obvious gaps, and keep the author's voice and formatting. Markdown is allowed.

Reply with the improved note content only. No preamble, no commentary, no quotation marks around the result.

TITLE:
{title}

CONTENT:
{content}

IMPROVED CONTENT:"#;

/// Builder for constructing `ContentSuggester` instances.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use notetaker::suggest::ContentSuggesterBuilder;
/// use notetaker::ollama::OllamaClientBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OllamaClientBuilder::new().build()?;
/// let suggester = ContentSuggesterBuilder::new()
///     .client(Arc::new(client))
///     .build();
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ContentSuggesterBuilder {
    client: Option<Arc<dyn OllamaClientTrait>>,
}

impl ContentSuggesterBuilder {
    /// Creates a new `ContentSuggesterBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the generation client to forward prompts through.
    pub fn client(mut self, client: Arc<dyn OllamaClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the `ContentSuggester` with the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> ContentSuggester {
        ContentSuggester {
            client: self.client.expect("client must be set via client() method"),
        }
    }
}

/// Forwards note drafts to the text-generation service for suggestions.
pub struct ContentSuggester {
    client: Arc<dyn OllamaClientTrait>,
}

impl ContentSuggester {
    /// Creates a new `ContentSuggester` with the given client.
    pub fn new(client: Arc<dyn OllamaClientTrait>) -> Self {
        Self { client }
    }

    /// Requests a content suggestion for the given draft.
    ///
    /// Builds a single prompt from title and content and returns the
    /// completion text verbatim. A whitespace-only completion yields
    /// `Ok(None)` - "no suggestion" - which callers must treat as a valid
    /// outcome, not an error.
    ///
    /// # Errors
    ///
    /// Propagates `OllamaError` from the upstream call unchanged.
    pub fn suggest(&self, title: &str, content: &str) -> Result<Option<String>, OllamaError> {
        let prompt = build_prompt(title, content);
        let completion = self.client.generate(&prompt)?;

        if completion.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(completion))
        }
    }
}

fn build_prompt(title: &str, content: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{title}", title)
        .replace("{content}", content)
}
