//! Persona character card.
//!
//! Cards come either flat or wrapped in a `data` object (SillyTavern v2
//! format). The relay only reads `name` and `system_prompt` from them and
//! hands the whole document back to clients on request.

use serde_json::{Value, json};

/// Base prompt used when the card has no `system_prompt`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Ada Marie, a warm AI companion.";

const DEFAULT_NAME: &str = "Ada Marie";

/// A loaded persona document.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterCard {
    document: Value,
}

impl CharacterCard {
    pub fn from_value(document: Value) -> Self {
        Self { document }
    }

    /// Card used when no character file can be read.
    pub fn fallback() -> Self {
        Self::from_value(json!({
            "data": {
                "name": DEFAULT_NAME,
                "system_prompt": "You are Ada Marie.",
            }
        }))
    }

    /// The full document as loaded.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The card body: `data` when present, else the document itself.
    fn body(&self) -> &Value {
        self.document.get("data").unwrap_or(&self.document)
    }

    pub fn name(&self) -> &str {
        self.body()
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NAME)
    }

    /// Base persona text the mode overlays are appended to.
    pub fn system_prompt(&self) -> &str {
        self.body()
            .get("system_prompt")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}
