use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::identifier::{DataCaptureViewId, LabelKey};

/// Failure surfaced to the host for a single command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// A required argument is absent or has the wrong JSON type.
    #[error("{0} parameter is required")]
    MissingParameter(String),

    #[error("malformed identifier '{identifier}': {reason}")]
    MalformedIdentifier { identifier: String, reason: String },

    #[error("invalid view descriptor: {0}")]
    InvalidViewDescriptor(String),

    #[error("no view attached for '{key}' on data capture view {view_id}")]
    BindingNotFound {
        view_id: DataCaptureViewId,
        key: LabelKey,
    },

    /// Passed through from the detection engine without rewording.
    #[error("{0}")]
    EngineRejected(String),

    /// The argument is present but its value cannot be used.
    #[error("invalid {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("no data capture view with id {0}")]
    ViewNotFound(DataCaptureViewId),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("UI thread unavailable: {0}")]
    UiThreadUnavailable(String),
}

impl BridgeError {
    pub fn missing(name: &str) -> Self {
        BridgeError::MissingParameter(name.to_string())
    }

    pub fn malformed(identifier: &str, reason: impl Into<String>) -> Self {
        BridgeError::MalformedIdentifier {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(name: &str, reason: impl ToString) -> Self {
        BridgeError::InvalidArgument {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code for the host side.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::MissingParameter(_) => "MissingParameter",
            BridgeError::MalformedIdentifier { .. } => "MalformedIdentifier",
            BridgeError::InvalidViewDescriptor(_) => "InvalidViewDescriptor",
            BridgeError::BindingNotFound { .. } => "BindingNotFound",
            BridgeError::EngineRejected(_) => "EngineRejected",
            BridgeError::InvalidArgument { .. } => "InvalidArgument",
            BridgeError::ViewNotFound(_) => "ViewNotFound",
            BridgeError::UnknownCommand(_) => "UnknownCommand",
            BridgeError::UiThreadUnavailable(_) => "UiThreadUnavailable",
        }
    }
}

impl Serialize for BridgeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BridgeError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_code_and_message() {
        let err = BridgeError::missing("dataCaptureViewId");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "MissingParameter");
        assert_eq!(value["message"], "dataCaptureViewId parameter is required");
    }

    #[test]
    fn engine_messages_pass_through_verbatim() {
        let err = BridgeError::EngineRejected("settings rejected: bad symbology".into());
        assert_eq!(err.to_string(), "settings rejected: bad symbology");
    }
}
