use serde_json::Value;

use super::HandlerError;

/// What middleware sees about a dispatch, before and after the handler.
#[derive(Clone, Debug)]
pub struct CommandInfo {
    pub name: String,
    pub caller: Option<String>,
}

/// A typed before/after hook composed around every command handler.
///
/// The dispatcher runs `before` hooks in registration order (the first
/// failure short-circuits the dispatch) and `after` hooks in reverse
/// order around the handler result.
pub trait Middleware: Send + Sync {
    fn before(&self, _command: &CommandInfo) -> Result<(), HandlerError> {
        Ok(())
    }

    fn after(&self, _command: &CommandInfo, _result: &Result<Value, HandlerError>) {}
}

/// Rejects anonymous dispatches before any handler runs.
pub struct RequireActor;

impl Middleware for RequireActor {
    fn before(&self, command: &CommandInfo) -> Result<(), HandlerError> {
        if command.caller.is_none() {
            return Err(HandlerError::Unauthorized(format!(
                "command {} requires an authenticated caller",
                command.name
            )));
        }
        Ok(())
    }
}

/// Logs every dispatch and its outcome.
pub struct CommandLog;

impl Middleware for CommandLog {
    fn before(&self, command: &CommandInfo) -> Result<(), HandlerError> {
        tracing::debug!(command = %command.name, caller = ?command.caller, "dispatching");
        Ok(())
    }

    fn after(&self, command: &CommandInfo, result: &Result<Value, HandlerError>) {
        match result {
            Ok(_) => tracing::info!(command = %command.name, "command succeeded"),
            Err(err) => tracing::info!(
                command = %command.name,
                status = err.status_code(),
                error = %err,
                "command failed"
            ),
        }
    }
}
