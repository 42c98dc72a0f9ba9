use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::debug;

/// Requested size, or one worker per available CPU, capped by the task count.
pub fn resolve_pool_size(requested: Option<NonZeroUsize>, task_count: usize) -> usize {
    let wanted = requested.map(NonZeroUsize::get).unwrap_or_else(|| {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    });
    wanted.min(task_count).max(1)
}

/// Runs `work` over every task on `pool_size` scoped threads.
///
/// Each worker owns a state built by `init` and pulls task indices from a
/// shared cursor. Results reach `collect` on the calling thread in completion
/// order; a panicking task is reported as `Err` and its worker state rebuilt.
pub fn run_pool<T, S, R, I, W, C>(tasks: &[T], pool_size: usize, init: I, work: W, mut collect: C)
where
    T: Sync,
    R: Send,
    I: Fn() -> S + Sync,
    W: Fn(&mut S, &T) -> R + Sync,
    C: FnMut(&T, thread::Result<R>),
{
    if tasks.is_empty() {
        return;
    }

    let cursor = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel::<(usize, thread::Result<R>)>();

    thread::scope(|scope| {
        for worker_id in 0..pool_size.max(1) {
            let sender = sender.clone();
            let cursor = &cursor;
            let init = &init;
            let work = &work;
            scope.spawn(move || {
                let mut state = init();
                let mut handled = 0_usize;
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(task) = tasks.get(index) else {
                        break;
                    };
                    let result = panic::catch_unwind(AssertUnwindSafe(|| work(&mut state, task)));
                    if result.is_err() {
                        state = init();
                    }
                    handled += 1;
                    if sender.send((index, result)).is_err() {
                        break;
                    }
                }
                debug!(worker_id, handled, "worker drained");
            });
        }
        drop(sender);

        for (index, result) in receiver {
            collect(&tasks[index], result);
        }
    });
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
