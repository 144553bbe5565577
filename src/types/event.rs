// Event - Domain events emitted during block and message processing
use serde::{Deserialize, Serialize};

/// Key/value pair attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// A typed event with ordered attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<Attribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(Attribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

pub const EVENT_PROMOTE: &str = "promote_privileged_contract";
pub const EVENT_DEMOTE: &str = "demote_privileged_contract";
pub const EVENT_REGISTER: &str = "register_privilege";
pub const EVENT_UNREGISTER: &str = "unregister_privilege";
pub const EVENT_MINT: &str = "mint_tokens";

pub const ATTR_CONTRACT: &str = "contract";
pub const ATTR_PRIVILEGE: &str = "privilege_type";
pub const ATTR_POSITION: &str = "position";
pub const ATTR_AMOUNT: &str = "amount";
pub const ATTR_RECIPIENT: &str = "recipient";
