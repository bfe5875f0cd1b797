//! System and answer prompts for the chat model.
//!
//! Both prompts can be overridden by dropping `system_prompt.txt` and
//! `answer_prompt.txt` into the configured prompts directory.

use std::fs;
use std::path::Path;

use tracing::debug;

pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";
pub const ANSWER_PROMPT_FILE: &str = "answer_prompt.txt";

const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that answers questions \
using the provided context.\n\
Answer precisely and to the point, using only information from the context.\n\
If the context does not contain the answer, say so.";

const DEFAULT_ANSWER_TEMPLATE: &str = "Use the context below to answer the question.\n\n\
Context:\n{context}\n\n\
Question: {question}\n\n\
Give a precise technical answer based on the provided context.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub system: String,
    pub answer_template: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            answer_template: DEFAULT_ANSWER_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    /// Built-in prompts, replaced by any non-empty override file found in `dir`.
    pub fn load(dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            system: read_prompt(&dir.join(SYSTEM_PROMPT_FILE)).unwrap_or(defaults.system),
            answer_template: read_prompt(&dir.join(ANSWER_PROMPT_FILE))
                .unwrap_or(defaults.answer_template),
        }
    }

    /// Fill `{context}` and `{question}` into the answer template.
    pub fn render(&self, context: &str, question: &str) -> String {
        self.answer_template.replace("{context}", context).replace("{question}", question)
    }
}

fn read_prompt(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    debug!(path = %path.display(), "using prompt override");
    Some(text.to_string())
}
