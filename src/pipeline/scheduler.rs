//! Deferred task queue.
//!
//! Staging calls finish their synchronous work, then defer the redraw
//! request and any completion callbacks here so that synchronously-following
//! staging calls in the same logical operation coalesce before the renderer
//! re-evaluates. The queue is strict FIFO: tasks run in the order scheduled,
//! and tasks queued *during* a drain run in the same drain, after everything
//! already queued.
//!
//! Single-threaded by design - the whole component system is cooperative and
//! callback-driven, so a `RefCell` queue is all the synchronization needed.

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::trace;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// FIFO queue of deferred tasks, drained after the current synchronous phase.
#[derive(Default)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Task>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task behind everything already queued.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Drain the queue until it is empty.
    ///
    /// Tasks deferred while draining run in this same drain. The queue
    /// borrow is released before each task runs, so tasks are free to defer
    /// more work.
    pub fn flush(&self) {
        let mut ran = 0usize;
        loop {
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            trace!(tasks = ran, "drained deferred queue");
        }
    }

    /// Number of tasks currently queued.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fifo_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let scheduler = Scheduler::new();

        for i in 0..4 {
            let order = order.clone();
            scheduler.defer(move || order.borrow_mut().push(i));
        }
        scheduler.flush();

        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_tasks_deferred_during_drain_run_in_same_drain() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let scheduler = Rc::new(Scheduler::new());

        {
            let order = order.clone();
            let scheduler_inner = scheduler.clone();
            scheduler.defer(move || {
                order.borrow_mut().push("outer");
                let order = order.clone();
                scheduler_inner.defer(move || order.borrow_mut().push("inner"));
            });
        }
        {
            let order = order.clone();
            scheduler.defer(move || order.borrow_mut().push("second"));
        }

        scheduler.flush();

        // The nested task ran after everything already queued
        assert_eq!(*order.borrow(), vec!["outer", "second", "inner"]);
    }
}
