use super::{
    errors::PoolError,
    result::PoolResult,
    handle::{
        panic_message,
        JoinHandle,
        ResultSlot,
        Task,
    },
    model::{
        Counters,
        PoolMetrics,
    },
    queue::TaskQueue,
    worker,
};
use std::{
    fmt::Display,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::Ordering,
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle as ThreadHandle},
};
use tracing::{debug, info, warn};


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "pool-worker".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            num_threads: num_cpus::get(),
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2, // Для I/O-bound задач
            ..Default::default()
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.num_threads == 0 {
            return Err(PoolError::configuration("need at least 1 worker thread"));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(PoolError::configuration("thread name prefix must not be empty"));
        }
        Ok(())
    }
}


/// Пул с фиксированным числом потоков и общей FIFO-очередью.
///
/// Задачи выполняются вне замка очереди. `shutdown` (и `Drop`) перестает
/// принимать задачи, дает воркерам дочерпать очередь и ждет их завершения.
pub struct ThreadPool {
    queue: Arc<TaskQueue>,
    counters: Arc<Counters>,
    workers: Mutex<Vec<ThreadHandle<()>>>,
    config: Config,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> PoolResult<Self> {
        Self::with_config(Config::default().with_threads(num_threads))
    }

    pub fn with_config(config: Config) -> PoolResult<Self> {
        config.validate()?;

        let pool = ThreadPool {
            queue: Arc::new(TaskQueue::new()),
            counters: Arc::new(Counters::default()),
            workers: Mutex::new(Vec::with_capacity(config.num_threads)),
            config,
        };

        // Запускаем воркеры
        for index in 0..pool.config.num_threads {
            if let Err(err) = pool.spawn_worker(index) {
                warn!(worker = index, error = %err, "failed to spawn worker, stopping pool");
                // Drop остановит уже запущенные воркеры
                drop(pool);
                return Err(err);
            }
        }

        info!(workers = pool.config.num_threads, "thread pool started");
        Ok(pool)
    }

    fn spawn_worker(&self, index: usize) -> PoolResult<()> {
        let mut builder = thread::Builder::new()
            .name(format!("{}-{}", self.config.thread_name_prefix, index));
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let queue = self.queue.clone();
        let counters = self.counters.clone();

        self.queue.worker_started();
        match builder.spawn(move || worker::run(index, queue, counters)) {
            Ok(handle) => {
                self.workers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(handle);
                Ok(())
            }
            Err(err) => {
                self.queue.worker_exited();
                Err(PoolError::ResourceExhausted(err.to_string()))
            }
        }
    }

    #[inline]
    fn enqueue<T, F>(&self, body: F) -> PoolResult<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> PoolResult<T> + Send + 'static,
    {
        let (slot, handle) = ResultSlot::new(self.counters.clone());

        let task: Task = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(body))
                .unwrap_or_else(|payload| Err(PoolError::TaskFailure(panic_message(&*payload))));
            slot.complete(outcome);
        });

        // До push: воркер может завершить задачу раньше, чем мы вернемся
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        if let Err(err) = self.queue.push(task) {
            self.counters.submitted.fetch_sub(1, Ordering::Relaxed);
            return Err(err);
        }
        Ok(handle)
    }

    /// Ставит задачу в очередь и сразу возвращает handle на результат.
    /// Паника внутри `f` попадает в handle как `PoolError::TaskFailure`.
    pub fn submit<T, F>(&self, f: F) -> PoolResult<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.enqueue(move || Ok(f()))
    }

    /// То же, что `submit`, но с явно привязанными аргументами
    pub fn submit_with<A, T, F>(&self, f: F, args: A) -> PoolResult<JoinHandle<T>>
    where
        A: Send + 'static,
        T: Send + 'static,
        F: FnOnce(A) -> T + Send + 'static,
    {
        self.enqueue(move || Ok(f(args)))
    }

    /// Задача, которая может завершиться ошибкой без паники
    pub fn submit_fallible<T, E, F>(&self, f: F) -> PoolResult<JoinHandle<T>>
    where
        T: Send + 'static,
        E: Display,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.enqueue(move || f().map_err(|e| PoolError::TaskFailure(e.to_string())))
    }

    /// Fire-and-forget: результат и ошибка задачи видны только в метриках
    pub fn execute<F>(&self, f: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(f).map(drop)
    }

    /// Останавливает пул и ждет завершения всех воркеров.
    /// Повторный вызов безопасен и снова ждет завершения.
    pub fn shutdown(&self) {
        if self.queue.stop() {
            info!(
                workers = self.config.num_threads,
                queued = self.queue.len(),
                "thread pool shutdown requested"
            );
        }

        if worker::is_worker_of(&self.queue) {
            warn!("shutdown called from a pool worker, not waiting for termination");
            return;
        }

        self.queue.wait_terminated();

        let handles = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread exited abnormally");
            }
        }
        debug!("all workers terminated");
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.config.num_threads
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.queue.is_stopped()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.config.num_threads,
            live_workers: self.queue.live_workers(),
            queued_tasks: self.queue.len(),
            active_tasks: self.counters.active.load(Ordering::Relaxed),
            total_submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed_tasks: self.counters.completed.load(Ordering::Relaxed),
            failed_tasks: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("size", &self.config.num_threads)
            .field("prefix", &self.config.thread_name_prefix)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
