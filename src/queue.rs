use super::{
    errors::PoolError,
    handle::Task,
    result::PoolResult,
};
use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};


struct State {
    tasks: VecDeque<Task>,
    stop: bool,
    live_workers: usize,
}

/// Общая очередь задач: FIFO, флаг остановки и счетчик живых воркеров
/// под одним мьютексом.
///
/// `available` будит воркеров (push - одного, stop - всех),
/// `terminated` будит тех, кто ждет завершения воркеров.
pub(crate) struct TaskQueue {
    state: Mutex<State>,
    available: Condvar,
    terminated: Condvar,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                tasks: VecDeque::new(),
                stop: false,
                live_workers: 0,
            }),
            available: Condvar::new(),
            terminated: Condvar::new(),
        }
    }

    // Под замком не выполняется пользовательский код, так что
    // состояние после паники другого потока остается согласованным.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, task: Task) -> PoolResult<()> {
        {
            let mut state = self.lock();
            if state.stop {
                return Err(PoolError::PoolStopped);
            }
            state.tasks.push_back(task);
        }
        self.available.notify_one();
        Ok(())
    }

    /// `None` только когда stop выставлен и очередь пуста.
    pub(crate) fn pop_or_wait(&self) -> Option<Task> {
        let mut state = self.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.stop {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Выставляет stop и будит всех воркеров.
    /// Возвращает `true`, если это был первый вызов.
    pub(crate) fn stop(&self) -> bool {
        let first = {
            let mut state = self.lock();
            !std::mem::replace(&mut state.stop, true)
        };
        self.available.notify_all();
        first
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.lock().stop
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub(crate) fn live_workers(&self) -> usize {
        self.lock().live_workers
    }

    /// Регистрируется до запуска потока, чтобы shutdown не проскочил
    /// мимо воркера, который еще не успел стартовать.
    pub(crate) fn worker_started(&self) {
        self.lock().live_workers += 1;
    }

    pub(crate) fn worker_exited(&self) {
        let remaining = {
            let mut state = self.lock();
            state.live_workers = state.live_workers.saturating_sub(1);
            state.live_workers
        };
        if remaining == 0 {
            self.terminated.notify_all();
        }
    }

    pub(crate) fn wait_terminated(&self) {
        let mut state = self.lock();
        while state.live_workers > 0 {
            state = self
                .terminated
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
