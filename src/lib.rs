//! Пул потоков с фиксированным числом воркеров
//!
//! # Features
//! - Общая FIFO-очередь под одним мьютексом с condvar (monitor)
//! - `submit` будит одного воркера, `shutdown` будит всех
//! - Handle на результат: блокирующий `wait`, `.await`, ожидание с таймаутом
//! - Паники и ошибки задач попадают в handle и не убивают воркер
//! - Shutdown дочерпывает очередь и ждет все воркеры, также вызывается в `Drop`

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod result;
mod queue;
mod worker;

pub use errors::PoolError;
pub use handle::{join_all, JoinHandle};
pub use model::PoolMetrics;
pub use pool::{Config, ThreadPool};
pub use result::PoolResult;
