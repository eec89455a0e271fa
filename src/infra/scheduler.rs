//! Single-worker task scheduler
//!
//! Tasks run one at a time on a dedicated `weft-worker` thread, taken from a
//! double-ended queue: `add_to_front` places a task ahead of everything still
//! queued, `add_to_end` behind it. The queue lock is never held while a task
//! runs, so submitting from other threads is not blocked by task execution.
//!
//! In synchronous mode no thread is started and every task runs inline on the
//! submitting thread.
//!
//! Shutdown is explicit and deterministic: the worker finishes the task it is
//! running, tasks still queued are dropped without running, and the thread is
//! joined before `shutdown` returns. Dropping the scheduler shuts it down.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::SchedulerError;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

const WORKER_THREAD_NAME: &str = "weft-worker";

/// Which end of the queue a task joins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

struct QueuedTask {
    task: Task,
    /// Caller span, entered while the task runs on the worker
    span: tracing::Span,
}

#[derive(Default)]
struct Queue {
    tasks: VecDeque<QueuedTask>,
    done: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    wakeup: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Scheduler {
    run_synchronously: bool,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(run_synchronously: bool) -> Result<Self, SchedulerError> {
        let shared = Arc::new(Shared::default());

        let worker = if run_synchronously {
            None
        } else {
            let worker_shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(WORKER_THREAD_NAME.into())
                .spawn(move || run_worker(worker_shared))
                .map_err(SchedulerError::Spawn)?;
            Some(handle)
        };

        tracing::debug!(
            "Scheduler started ({})",
            if run_synchronously { "synchronous" } else { "worker thread" }
        );

        Ok(Self {
            run_synchronously,
            shared,
            worker,
        })
    }

    pub fn is_synchronous(&self) -> bool {
        self.run_synchronously
    }

    /// Schedule `task` to run before every task currently queued.
    pub fn add_to_front<F>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.add(Placement::Front, task)
    }

    /// Schedule `task` to run after every task currently queued.
    pub fn add_to_end<F>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.add(Placement::Back, task)
    }

    pub fn add<F>(&self, placement: Placement, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(task), placement)
    }

    /// Number of tasks waiting to start
    pub fn pending(&self) -> usize {
        self.shared.lock().tasks.len()
    }

    fn submit(&self, task: Task, placement: Placement) -> Result<(), SchedulerError> {
        if self.run_synchronously {
            if self.shared.lock().done {
                return Err(terminated(placement));
            }
            task();
            return Ok(());
        }

        {
            let mut queue = self.shared.lock();
            if queue.done {
                return Err(terminated(placement));
            }
            let queued = QueuedTask {
                task,
                span: tracing::Span::current(),
            };
            match placement {
                Placement::Front => queue.tasks.push_front(queued),
                Placement::Back => queue.tasks.push_back(queued),
            }
            tracing::trace!(?placement, queued = queue.tasks.len(), "Task enqueued");
        }
        self.shared.wakeup.notify_one();
        Ok(())
    }

    /// Stop the worker and wait for it to exit. Idempotent.
    pub fn shutdown(&mut self) {
        let dropped = {
            let mut queue = self.shared.lock();
            queue.done = true;
            std::mem::take(&mut queue.tasks)
        };
        self.shared.wakeup.notify_all();

        // Released before the join so callers waiting on a dropped task's
        // reply are woken while the running task finishes
        if !dropped.is_empty() {
            tracing::debug!("Dropped {} queued tasks at shutdown", dropped.len());
        }
        drop(dropped);

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                tracing::error!("Scheduler shut down from its own worker; not joining");
            } else if worker.join().is_err() {
                tracing::error!("Worker thread exited with a panic");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn terminated(placement: Placement) -> SchedulerError {
    tracing::error!(?placement, "Task submitted after scheduler shutdown");
    SchedulerError::Terminated
}

fn run_worker(shared: Arc<Shared>) {
    loop {
        let next = {
            let queue = shared.lock();
            let mut queue = shared
                .wakeup
                .wait_while(queue, |q| q.tasks.is_empty() && !q.done)
                .unwrap_or_else(PoisonError::into_inner);
            if queue.done {
                break;
            }
            queue.tasks.pop_front()
        };

        let Some(QueuedTask { task, span }) = next else {
            continue;
        };
        let _guard = span.enter();
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(task)) {
            tracing::error!("Scheduled task panicked: {}", panic_message(payload.as_ref()));
        }
    }
    tracing::debug!("Worker thread exiting");
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
