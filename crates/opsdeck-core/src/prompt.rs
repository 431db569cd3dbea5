//! The outbound prompt payload — the only place session state lives between
//! turns. Whatever is in `carried` comes back verbatim with the user's next
//! action; the engine itself remembers nothing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// A choice whose value doubles as its label.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptBody {
    /// Pick one of an ordered set of candidates.
    Select { choices: Vec<Choice> },
    /// Type a value; `hint` describes what input is valid.
    FreeText { hint: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub text: String,
    /// The parameter this prompt is asking for.
    pub parameter: String,
    pub body: PromptBody,
    /// Command to re-invoke with the answer.
    pub callback: String,
    /// Every already-known parameter value, round-tripped verbatim.
    pub carried: BTreeMap<String, String>,
}

impl PromptPayload {
    /// The value map for the follow-up turn: carried state plus the answer.
    pub fn answered(&self, answer: impl Into<String>) -> BTreeMap<String, String> {
        let mut values = self.carried.clone();
        values.insert(self.parameter.clone(), answer.into());
        values
    }
}
