use crate::errors::TaskError;

/// Outcome of one task invocation: the task's return value or the
/// failure captured in its place. Callers discriminate by matching,
/// never by inspecting runtime types.
pub type TaskResult<T> = Result<T, TaskError>;
