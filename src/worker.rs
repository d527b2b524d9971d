use super::{
    model::Counters,
    queue::TaskQueue,
};
use std::{
    cell::Cell,
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::Ordering,
        Arc,
    },
};
use tracing::debug;


thread_local! {
    // Адрес очереди пула, которому принадлежит текущий поток
    static CURRENT_POOL: Cell<usize> = const { Cell::new(0) };
}

pub(crate) fn queue_id(queue: &Arc<TaskQueue>) -> usize {
    Arc::as_ptr(queue) as usize
}

/// Текущий поток - воркер пула с этой очередью?
pub(crate) fn is_worker_of(queue: &Arc<TaskQueue>) -> bool {
    CURRENT_POOL.with(|id| id.get() == queue_id(queue))
}

// Снимает воркера со счета при любом выходе из цикла
struct ExitGuard<'a> {
    index: usize,
    queue: &'a TaskQueue,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        debug!(worker = self.index, "worker terminated");
        self.queue.worker_exited();
    }
}

// Счетчик активных задач, снимается и при раскрутке стека
struct ActiveGuard<'a>(&'a Counters);

impl<'a> ActiveGuard<'a> {
    fn enter(counters: &'a Counters) -> Self {
        counters.active.fetch_add(1, Ordering::Relaxed);
        Self(counters)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Цикл воркера: WAITING -> RUNNING -> WAITING, пока stop не выставлен
/// и очередь не опустела.
pub(crate) fn run(index: usize, queue: Arc<TaskQueue>, counters: Arc<Counters>) {
    CURRENT_POOL.with(|id| id.set(queue_id(&queue)));
    let _exit = ExitGuard {
        index,
        queue: &queue,
    };
    debug!(worker = index, "worker started");

    while let Some(task) = queue.pop_or_wait() {
        let _active = ActiveGuard::enter(&counters);
        // Паника тела задачи уже записана в handle (ThreadPool::enqueue).
        // Сюда долетает только то, что упало после записи, например Drop
        // результата, который никто не забрал.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            // Drop самого payload тоже может паниковать
            mem::forget(payload);
        }
    }
}
