use serde_json::{Map, Value};

use crate::{
    error::BridgeError,
    identifier::{LabelKey, TrackingId},
};

/// Flat argument bag of one host command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs(Map<String, Value>);

impl CommandArgs {
    pub fn new(args: Map<String, Value>) -> Self {
        Self(args)
    }

    /// Anything other than a JSON object counts as no arguments.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(args) => Self(args),
            _ => Self::default(),
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    pub fn require_i32(&self, name: &str) -> Result<i32, BridgeError> {
        let value = self
            .get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| BridgeError::missing(name))?;
        i32::try_from(value)
            .map_err(|_| BridgeError::invalid(name, format!("{value} is out of range")))
    }

    pub fn require_bool(&self, name: &str) -> Result<bool, BridgeError> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| BridgeError::missing(name))
    }

    pub fn require_str(&self, name: &str) -> Result<&str, BridgeError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::missing(name))
    }

    /// `None` when absent or null; present but not a string is still a missing parameter.
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, BridgeError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text)),
            Some(_) => Err(BridgeError::missing(name)),
        }
    }

    /// JSON payload given either as an encoded string or inline.
    pub fn require_json_text(&self, name: &str) -> Result<String, BridgeError> {
        self.optional_json_text(name)?
            .ok_or_else(|| BridgeError::missing(name))
    }

    pub fn optional_json_text(&self, name: &str) -> Result<Option<String>, BridgeError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(Some(value.to_string())),
            Some(_) => Err(BridgeError::missing(name)),
        }
    }

    /// Raw tracking id: a non-negative integer, or its decimal string form.
    pub fn require_tracking_id(&self, name: &str) -> Result<TrackingId, BridgeError> {
        match self.get(name).ok_or_else(|| BridgeError::missing(name))? {
            Value::Number(number) => number
                .as_u64()
                .and_then(|id| TrackingId::try_from(id).ok())
                .ok_or_else(|| {
                    BridgeError::malformed(
                        &number.to_string(),
                        "tracking id must be a non-negative 32-bit integer",
                    )
                }),
            Value::String(text) => Ok(LabelKey::decode(text, false)?.tracking_id),
            _ => Err(BridgeError::missing(name)),
        }
    }

    /// Encoded `trackingId:fieldName` identifier.
    pub fn require_field_key(&self, name: &str) -> Result<LabelKey, BridgeError> {
        LabelKey::decode(self.require_str(name)?, true)
    }
}

impl From<Map<String, Value>> for CommandArgs {
    fn from(args: Map<String, Value>) -> Self {
        Self(args)
    }
}
