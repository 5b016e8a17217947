//! Command dispatch with an explicit ordered middleware chain.
//!
//! The thin API layer calls `Dispatcher::dispatch_response` with a
//! command name, a JSON payload, and the authenticated caller; handlers
//! return typed `HandlerError` kinds that fold into HTTP-style statuses
//! at this boundary and nowhere else.

mod context;
mod dispatcher;
mod error;
mod middleware;
mod surface;

pub use context::Context;
pub use dispatcher::{CommandResponse, Dispatcher};
pub use error::HandlerError;
pub use middleware::{CommandInfo, CommandLog, Middleware, RequireActor};
pub use surface::command_surface;
