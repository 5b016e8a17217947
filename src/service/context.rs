use serde::de::DeserializeOwned;
use serde_json::Value;

use super::HandlerError;

/// Per-dispatch context handed to handlers and middleware.
pub struct Context {
    command: String,
    input: Value,
    caller: Option<String>,
}

impl Context {
    pub fn new(command: impl Into<String>, input: Value, caller: Option<String>) -> Self {
        Self {
            command: command.into(),
            input,
            caller,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Deserialize the input payload.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Ok(serde_json::from_value(self.input.clone())?)
    }

    /// The authenticated caller, required.
    pub fn caller(&self) -> Result<&str, HandlerError> {
        self.caller
            .as_deref()
            .ok_or_else(|| HandlerError::Unauthorized("caller identity is required".into()))
    }

    pub fn caller_opt(&self) -> Option<&str> {
        self.caller.as_deref()
    }
}
