use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};

/// Thread-safe, unbounded FIFO queue shared between a pool and its workers.
///
/// A `SafeQueue` is a cloneable handle; every clone operates on the same
/// underlying channel. Emptiness is always communicated as `None`, never as
/// a panic or an error, so polling callers can tell "no data yet" apart
/// from a failed task travelling through the queue as a value.
pub struct SafeQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> SafeQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Appends an item. Always succeeds and wakes one blocked consumer.
    pub fn push(&self, item: T) {
        // The queue holds its own receiver half, so the channel can never
        // disconnect while any handle is alive.
        let _ = self.tx.send(item);
    }

    /// Removes and returns the oldest item, or `None` immediately if the
    /// queue is currently empty. Never blocks.
    pub fn pop_nowait(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Blocks until an item arrives or `timeout` elapses. `None` blocks
    /// indefinitely. An elapsed timeout yields `None`.
    pub fn pop_wait(&self, timeout: Option<Duration>) -> Option<T> {
        match timeout {
            Some(timeout) => self.rx.recv_timeout(timeout).ok(),
            None => self.rx.recv().ok(),
        }
    }

    /// Best-effort snapshot of the item count; stale as soon as it returns
    /// when producers or consumers are active.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Clone for SafeQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Default for SafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Instant;

    #[test]
    fn preserves_fifo_order() {
        let queue = SafeQueue::new();
        for i in 0..100 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 100);
        for i in 0..100 {
            assert_eq!(queue.pop_nowait(), Some(i));
        }
        assert_eq!(queue.pop_nowait(), None);
    }

    #[test]
    fn pop_nowait_on_empty_returns_none_immediately() {
        let queue: SafeQueue<u32> = SafeQueue::new();
        assert_eq!(queue.pop_nowait(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_wait_times_out_on_empty() {
        let queue: SafeQueue<u32> = SafeQueue::new();
        let start = Instant::now();
        let popped = queue.pop_wait(Some(Duration::from_millis(50)));
        assert_eq!(popped, None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn pop_wait_wakes_on_push_from_another_thread() {
        let queue = SafeQueue::new();
        let producer = queue.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(7_u32);
        });
        assert_eq!(queue.pop_wait(Some(Duration::from_secs(5))), Some(7));
        handle.join().unwrap();
    }

    #[test]
    fn concurrent_consumers_never_lose_or_duplicate_items() {
        let queue = SafeQueue::new();
        let total = 1_000_u32;
        for i in 0..total {
            queue.push(i);
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let consumer = queue.clone();
            let seen = Arc::clone(&seen);
            handles.push(thread::spawn(move || {
                while let Some(item) = consumer.pop_nowait() {
                    seen.lock().unwrap().push(item);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut seen = Arc::try_unwrap(seen).unwrap().into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..total).collect::<Vec<_>>());
    }
}
