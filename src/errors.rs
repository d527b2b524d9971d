use thiserror::Error;

/// Ошибки пула и задач
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PoolError {
    /// Пул уже начал остановку, новые задачи не принимаются
    #[error("thread pool is stopped")]
    PoolStopped,

    /// Некорректный `Config`, например ноль воркеров
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Не удалось создать поток воркера
    #[error("failed to spawn worker thread: {0}")]
    ResourceExhausted(String),

    /// Паника или ошибка, возвращенная телом задачи
    #[error("task failed: {0}")]
    TaskFailure(String),

    /// Только для ожидания с таймаутом на стороне вызывающего
    #[error("timed out waiting for task result")]
    Timeout,
}

impl PoolError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        PoolError::Configuration(msg.into())
    }

    pub fn task_failure<S: Into<String>>(msg: S) -> Self {
        PoolError::TaskFailure(msg.into())
    }

    #[inline]
    pub fn is_task_failure(&self) -> bool {
        matches!(self, PoolError::TaskFailure(_))
    }
}
