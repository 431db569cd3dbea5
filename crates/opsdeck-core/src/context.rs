use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The inbound side of one conversational turn: the command being addressed,
/// the identity of whoever triggered it, and a flat name→value mapping of
/// everything the request carried (mapped parameters, round-tripped values,
/// and the user's latest answer). No other structure is assumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandContext {
    pub command: String,
    pub user: String,
    pub channel: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl CommandContext {
    pub fn new(
        command: impl Into<String>,
        user: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            user: user.into(),
            channel: channel.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// The follow-up turn for a round-tripped prompt: same identity, values
    /// replaced by the carried payload plus the user's answer.
    pub fn next_turn(&self, carried: BTreeMap<String, String>) -> Self {
        Self {
            command: self.command.clone(),
            user: self.user.clone(),
            channel: self.channel.clone(),
            values: carried,
        }
    }
}
