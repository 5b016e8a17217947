use std::collections::HashMap;

use serde_json::Value;

use super::context::Context;
use super::middleware::{CommandInfo, Middleware};
use super::HandlerError;

type Handler = Box<dyn Fn(&Context) -> Result<Value, HandlerError> + Send + Sync>;

/// Response shape for the thin API layer: the error kind already mapped
/// to an HTTP-style status.
#[derive(Clone, Debug)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}

/// Routes named commands to handler functions through an explicit,
/// ordered middleware chain.
pub struct Dispatcher {
    middleware: Vec<Box<dyn Middleware>>,
    handlers: HashMap<String, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Append a middleware. Order of registration is order of `before`
    /// execution; `after` runs in reverse.
    pub fn middleware(mut self, mw: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(mw));
        self
    }

    /// Register a command handler.
    pub fn command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Context) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Box::new(handler));
        self
    }

    pub fn commands(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }

    /// Dispatch a command by name.
    pub fn dispatch(
        &self,
        command: &str,
        input: Value,
        caller: Option<&str>,
    ) -> Result<Value, HandlerError> {
        let info = CommandInfo {
            name: command.to_string(),
            caller: caller.map(str::to_string),
        };

        for mw in &self.middleware {
            mw.before(&info)?;
        }

        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| HandlerError::UnknownCommand(command.to_string()))?;
        let ctx = Context::new(command, input, caller.map(str::to_string));
        let result = handler(&ctx);

        for mw in self.middleware.iter().rev() {
            mw.after(&info, &result);
        }

        result
    }

    /// Dispatch and fold the outcome into a status + body pair.
    pub fn dispatch_response(
        &self,
        command: &str,
        input: Value,
        caller: Option<&str>,
    ) -> CommandResponse {
        match self.dispatch(command, input, caller) {
            Ok(body) => CommandResponse { status: 200, body },
            Err(err) => CommandResponse {
                status: err.status_code(),
                body: serde_json::json!({ "error": err.to_string() }),
            },
        }
    }
}
