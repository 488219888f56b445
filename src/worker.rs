use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::errors::{panic_message, TaskError};
use crate::queue::SafeQueue;
use crate::result::TaskResult;

/// Caller-supplied function applied to every work item a worker pulls.
/// Shared across the workers of one spawn batch.
pub type Task<I, O> = Arc<dyn Fn(I) -> O + Send + Sync + 'static>;

/// One named thread of control running a pull-execute-publish loop
/// against the queues of its owning pool.
///
/// Stopping is cooperative: flipping `keep_alive` off asks the worker to
/// exit the next time it finds the work queue empty. A worker that is
/// mid-task always finishes the invocation first, and a task that blocks
/// forever cannot be interrupted.
pub struct Worker {
    name: String,
    keep_alive: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl Worker {
    /// Starts the worker thread. `keep_alive = false` produces a
    /// single-shot worker that performs at most one unit of work.
    pub fn spawn<I, O>(
        name: &str,
        task: Task<I, O>,
        input: SafeQueue<I>,
        output: SafeQueue<TaskResult<O>>,
        keep_alive: bool,
        poll_interval: Duration,
    ) -> io::Result<Self>
    where
        I: Send + 'static,
        O: Send + 'static,
    {
        let flag = Arc::new(AtomicBool::new(keep_alive));
        let loop_flag = Arc::clone(&flag);
        let loop_name = name.to_string();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            debug!(worker = %loop_name, "worker started");
            run_loop(task, input, output, loop_flag, !keep_alive, poll_interval);
            debug!(worker = %loop_name, "worker exited");
        })?;
        Ok(Self {
            name: name.to_string(),
            keep_alive: flag,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive.load(Ordering::Acquire)
    }

    /// Any thread may flip the flag; the worker observes it between units
    /// of work.
    pub fn set_keep_alive(&self, keep_alive: bool) {
        self.keep_alive.store(keep_alive, Ordering::Release);
    }

    /// Requests a graceful stop. Does not block.
    pub fn stop(&self) {
        self.set_keep_alive(false);
    }

    /// Whether the underlying thread is still running.
    pub fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Blocks until the thread terminates.
    pub fn join(self) {
        if let Err(payload) = self.handle.join() {
            // Task panics are caught inside the loop, so this only fires
            // if the loop itself went down.
            error!(worker = %self.name, reason = %panic_message(payload), "worker thread panicked");
        }
    }
}

/// The worker loop. Blocks on the work queue with a short timeout instead
/// of spinning; a timeout means "queue empty, recheck the stop flag".
///
/// A keep-alive worker honors a stop request only on an empty-queue
/// observation, so a stopped pool still runs its backlog to completion.
/// A single-shot worker exits after its first completed unit of work.
fn run_loop<I, O>(
    task: Task<I, O>,
    input: SafeQueue<I>,
    output: SafeQueue<TaskResult<O>>,
    keep_alive: Arc<AtomicBool>,
    single_shot: bool,
    poll_interval: Duration,
) where
    I: Send + 'static,
    O: Send + 'static,
{
    loop {
        match input.pop_wait(Some(poll_interval)) {
            Some(item) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(item)))
                    .map_err(|payload| {
                        let reason = panic_message(payload);
                        warn!(reason = %reason, "task panicked, capturing as result");
                        TaskError::Panic(reason)
                    });
                output.push(outcome);
                if single_shot {
                    break;
                }
            }
            None => {
                if !keep_alive.load(Ordering::Acquire) {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(10);

    fn queues<I, O>() -> (SafeQueue<I>, SafeQueue<TaskResult<O>>) {
        (SafeQueue::new(), SafeQueue::new())
    }

    #[test]
    fn single_shot_does_at_most_one_unit() {
        let (input, output) = queues();
        for i in 0..3 {
            input.push(i);
        }
        let task: Task<u32, u32> = Arc::new(|x| x * 2);
        let worker =
            Worker::spawn("once-0", task, input.clone(), output.clone(), false, POLL).unwrap();
        worker.join();
        assert_eq!(output.len(), 1);
        assert_eq!(input.len(), 2);
        assert_eq!(output.pop_nowait(), Some(Ok(0)));
    }

    #[test]
    fn task_panic_is_captured_and_worker_survives() {
        let (input, output) = queues::<u32, u32>();
        let task: Task<u32, u32> = Arc::new(|_| panic!("kaboom"));
        let worker =
            Worker::spawn("bomb-0", task, input.clone(), output.clone(), true, POLL).unwrap();

        input.push(1);
        let captured = output.pop_wait(Some(Duration::from_secs(5)));
        assert_eq!(captured, Some(Err(TaskError::Panic("kaboom".into()))));
        assert!(worker.is_alive());

        // Still accepts work after the panic.
        input.push(2);
        assert!(output.pop_wait(Some(Duration::from_secs(5))).is_some());

        worker.stop();
        worker.join();
    }

    #[test]
    fn stopped_worker_drains_backlog_before_exiting() {
        let (input, output) = queues();
        for i in 0..5_u32 {
            input.push(i);
        }
        let task: Task<u32, u32> = Arc::new(|x| x + 1);
        let worker =
            Worker::spawn("drain-0", task, input.clone(), output.clone(), true, POLL).unwrap();
        worker.stop();
        worker.join();
        assert!(input.is_empty());
        assert_eq!(output.len(), 5);
    }

    #[test]
    fn keep_alive_flag_is_visible_to_other_threads() {
        let (input, output) = queues::<u32, u32>();
        let task: Task<u32, u32> = Arc::new(|x| x);
        let worker = Worker::spawn("idle-0", task, input, output, true, POLL).unwrap();
        assert!(worker.keep_alive());
        worker.set_keep_alive(false);
        assert!(!worker.keep_alive());
        worker.join();
    }
}
