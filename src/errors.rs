use std::any::Any;
use std::io;

use thiserror::Error;

/// Failure captured from a single task invocation.
///
/// Workers never let a task panic tear the thread down; the payload is
/// rendered and travels through the result queue like any other outcome.
#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Error)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panic(String),
}

/// Errors raised while registering workers with a pool.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("a worker named {0} is already registered")]
    DuplicateName(String),
    #[error("failed to spawn thread for worker {name}")]
    Thread {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Renders a panic payload into something loggable. Most payloads are
/// `&str` or `String`; anything else gets a generic message.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked with a non-string payload".to_string()
    }
}
