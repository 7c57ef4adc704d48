//! A fixed-size pool of worker threads that run command bodies.
//!
//! Jobs are posted as boxed closures over a crossbeam channel; each job
//! carries its own one-shot response channel back to the session that
//! submitted it. A job that panics is caught with `catch_unwind` and logged
//! instead of taking the whole worker thread down — but its response
//! sender is simply dropped without sending, so the session's matching
//! `recv()` observes a disconnected channel and tears down that
//! connection, per the "system-level failure terminates the session"
//! contract.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct ThreadPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `size` worker threads. `size` is clamped to at least 1.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = bounded::<Job>(size * 4);
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Self::spawn_worker(id, receiver.clone()));
        }
        ThreadPool {
            sender: Some(sender),
            workers,
        }
    }

    fn spawn_worker(id: usize, receiver: Receiver<Job>) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name(format!("bulkmt-worker-{id}"))
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!(worker = id, "worker panicked running a command body");
                    }
                }
            })
            .expect("failed to spawn worker thread")
    }

    /// Run `command` on a worker, blocking the caller until it completes.
    /// Returns `Err(())` if the worker panicked instead of returning
    /// normally; the caller should terminate its session in that case.
    pub fn execute<F>(&self, command: F) -> Result<(), ()>
    where
        F: FnOnce() + Send + 'static,
    {
        let (done_tx, done_rx) = bounded::<()>(1);
        let job: Job = Box::new(move || {
            command();
            let _ = done_tx.send(());
        });

        self.sender
            .as_ref()
            .expect("sender dropped before pool shutdown")
            .send(job)
            .expect("worker pool channel closed while pool is alive");

        done_rx.recv().map_err(|_| ())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Dropping the sender lets every worker's recv() loop end once the
        // channel drains, then we join so no worker outlives the pool.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_submitted_work() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn panicking_job_is_reported_as_worker_failure_without_poisoning_the_pool() {
        let pool = ThreadPool::new(1);
        let result = pool.execute(|| panic!("boom"));
        assert!(result.is_err());

        // The pool itself must still be usable afterward.
        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::clone(&counter);
        pool.execute(move || {
            counter2.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
