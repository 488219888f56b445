use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::SpawnError;
use crate::model::PoolMetrics;
use crate::queue::SafeQueue;
use crate::result::TaskResult;
use crate::worker::{Task, Worker};

/// Interval between queue-size checks while `run_until_drained` blocks.
const DRAIN_POLL: Duration = Duration::from_millis(25);

/// Per-batch spawn configuration.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// `false` makes every worker in the batch single-shot.
    pub keep_alive: bool,
    /// Number of workers to start, named `"{name}-{index}"`.
    pub count: usize,
    /// When set, the spawn stops and joins exactly the workers it created
    /// before returning, running the enqueued backlog to completion.
    pub block: bool,
    /// How long a worker blocks on an empty queue before rechecking its
    /// stop flag.
    pub poll_interval: Duration,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            keep_alive: true,
            count: 1,
            block: false,
            poll_interval: Duration::from_millis(20),
        }
    }
}

impl SpawnOptions {
    /// Workers that perform at most one unit of work each.
    pub fn single_shot() -> Self {
        Self {
            keep_alive: false,
            ..Self::default()
        }
    }

    pub fn batch(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    /// A batch that runs the current backlog to completion before the
    /// spawn call returns.
    pub fn blocking_batch(count: usize) -> Self {
        Self {
            count,
            block: true,
            ..Self::default()
        }
    }
}

/// Owner of one work queue, one result queue and a registry of named
/// workers consuming from them.
///
/// Each pool is an isolated concurrency domain: its queues are shared by
/// its own workers and never by another pool's. Items are handed to
/// workers in FIFO order; results arrive in completion order.
pub struct Pool<I, O> {
    input: SafeQueue<I>,
    output: SafeQueue<TaskResult<O>>,
    workers: HashMap<String, Worker>,
}

impl<I, O> Pool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            input: SafeQueue::new(),
            output: SafeQueue::new(),
            workers: HashMap::new(),
        }
    }

    /// Pushes one unit of work onto the shared queue. The pool never
    /// inspects the item; matching it to the task is the caller's job.
    pub fn enqueue(&self, item: I) {
        self.input.push(item);
    }

    /// Snapshot of the number of items not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.input.len()
    }

    /// Spawns one keep-alive worker with default options. Returns the
    /// generated worker names (here a single `"{name}-0"`).
    pub fn spawn<F>(&mut self, name: &str, task: F) -> Result<Vec<String>, SpawnError>
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        self.spawn_with(name, task, SpawnOptions::default())
    }

    /// Spawns `opts.count` workers named `"{name}-{index}"`, all sharing
    /// this pool's queues, so items are taken on a first-available basis.
    ///
    /// Every name is checked against the registry before any thread is
    /// started; a clash fails the whole batch with
    /// [`SpawnError::DuplicateName`].
    pub fn spawn_with<F>(
        &mut self,
        name: &str,
        task: F,
        opts: SpawnOptions,
    ) -> Result<Vec<String>, SpawnError>
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let task: Task<I, O> = Arc::new(task);
        let names: Vec<String> = (0..opts.count).map(|i| format!("{name}-{i}")).collect();
        for worker_name in &names {
            if self.workers.contains_key(worker_name) {
                return Err(SpawnError::DuplicateName(worker_name.clone()));
            }
        }
        for worker_name in &names {
            let worker = Worker::spawn(
                worker_name,
                Arc::clone(&task),
                self.input.clone(),
                self.output.clone(),
                opts.keep_alive,
                opts.poll_interval,
            )
            .map_err(|source| SpawnError::Thread {
                name: worker_name.clone(),
                source,
            })?;
            self.workers.insert(worker_name.clone(), worker);
        }
        // An empty name list would match the whole pool in cleanup.
        if opts.block && !names.is_empty() {
            self.cleanup(&names, true);
        }
        Ok(names)
    }

    /// Spawns `workers` keep-alive workers (`0` means one per CPU), blocks
    /// until the work queue is drained, then stops and joins exactly the
    /// workers it created. Returns their names.
    pub fn run_until_drained<F>(
        &mut self,
        workers: usize,
        task: F,
    ) -> Result<Vec<String>, SpawnError>
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let workers = if workers == 0 { num_cpus::get() } else { workers };
        let names = self.spawn_with("parallel", task, SpawnOptions::batch(workers))?;
        while !self.input.is_empty() {
            debug!(
                pending = self.input.len(),
                ready = self.output.len(),
                "waiting for work queue to drain"
            );
            thread::sleep(DRAIN_POLL);
        }
        self.cleanup(&names, true);
        Ok(names)
    }

    /// Non-blocking: the oldest available result, or `None` if no task
    /// has finished since the last retrieval.
    pub fn result(&self) -> Option<TaskResult<O>> {
        self.output.pop_nowait()
    }

    /// Drains every currently-available result without waiting for more.
    /// Returns an empty vec when none are ready; callers expecting more
    /// simply poll again.
    pub fn results(&self) -> Vec<TaskResult<O>> {
        let mut collected = Vec::new();
        while let Some(result) = self.output.pop_nowait() {
            collected.push(result);
        }
        collected
    }

    /// Collects up to `count` results, waiting `timeout` for each one.
    /// A single elapsed wait returns whatever was collected so far, which
    /// may be shorter than `count`; that is a partial result, not an
    /// error. `timeout = None` waits indefinitely per item.
    pub fn wait_results(&self, count: usize, timeout: Option<Duration>) -> Vec<TaskResult<O>> {
        // `count` is an upper bound chosen by the caller, not a promise;
        // preallocate only for what is already retrievable.
        let mut collected = Vec::with_capacity(count.min(self.output.len()));
        while collected.len() < count {
            match self.output.pop_wait(timeout) {
                Some(result) => collected.push(result),
                None => break,
            }
        }
        collected
    }

    /// Requests a graceful stop of every worker whose full name contains
    /// any of `names` (spawn appends an index suffix, so the stem alone
    /// matches the whole batch). An empty slice targets every worker.
    /// Does not block.
    pub fn stop<S: AsRef<str>>(&self, names: &[S]) {
        for worker_name in self.matching_names(names) {
            if let Some(worker) = self.workers.get(&worker_name) {
                worker.stop();
            }
        }
    }

    pub fn stop_all(&self) {
        self.stop::<&str>(&[]);
    }

    /// Stops every matched worker and, when `wait` is set, joins each one
    /// before returning. Joined workers are removed from the registry, so
    /// an immediate second call matches nothing and is a no-op. Returns
    /// the matched names.
    pub fn cleanup<S: AsRef<str>>(&mut self, names: &[S], wait: bool) -> Vec<String> {
        let matched = self.matching_names(names);
        for worker_name in &matched {
            if let Some(worker) = self.workers.get(worker_name) {
                worker.stop();
            }
        }
        if wait {
            for worker_name in &matched {
                if let Some(worker) = self.workers.remove(worker_name) {
                    debug!(worker = %worker_name, "joining worker");
                    worker.join();
                }
            }
        }
        matched
    }

    pub fn cleanup_all(&mut self, wait: bool) -> Vec<String> {
        self.cleanup::<&str>(&[], wait)
    }

    /// Flips `keep_alive` off on exactly one worker, by full name.
    /// Unknown names are reported, not raised: the call logs a warning
    /// and returns `false`.
    pub fn kill(&self, name: &str) -> bool {
        match self.workers.get(name) {
            Some(worker) => {
                worker.stop();
                true
            }
            None => {
                warn!(worker = %name, "no such worker");
                false
            }
        }
    }

    /// Names currently in the registry, including workers that have
    /// already terminated but were not cleaned up with `wait`.
    pub fn worker_names(&self) -> Vec<String> {
        self.workers.keys().cloned().collect()
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            pending_items: self.input.len(),
            ready_results: self.output.len(),
            live_workers: self.workers.values().filter(|w| w.is_alive()).count(),
            registered_workers: self.workers.len(),
        }
    }

    fn matching_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        if names.is_empty() {
            self.workers.keys().cloned().collect()
        } else {
            self.workers
                .keys()
                .filter(|worker_name| {
                    names
                        .iter()
                        .any(|requested| worker_name.contains(requested.as_ref()))
                })
                .cloned()
                .collect()
        }
    }
}

impl<I, O> Default for Pool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
