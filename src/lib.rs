//! Generic named worker pool over a pair of shared queues.
//!
//! # Features
//! - Named workers, spawned one at a time or in indexed batches
//! - One shared work queue and one shared result queue per pool
//! - Cooperative, non-preemptive stop between units of work
//! - Task panics captured as data, never fatal to a worker
//! - Blocking, non-blocking and partial-on-timeout result retrieval
//! - RAII scope that stops and joins every worker on exit

pub mod errors;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;
pub mod scope;
pub mod worker;

pub use errors::{SpawnError, TaskError};
pub use model::PoolMetrics;
pub use pool::{Pool, SpawnOptions};
pub use queue::SafeQueue;
pub use result::TaskResult;
pub use scope::{scope, ScopedPool};
pub use worker::{Task, Worker};
