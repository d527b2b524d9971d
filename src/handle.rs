use super::{
    errors::PoolError,
    model::Counters,
    result::PoolResult,
};
use std::{
    any::Any,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::{
    sync::oneshot::{self, error::TryRecvError},
    time::Duration,
};


pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

const CHANNEL_CLOSED: &str = "result channel closed";
const SLOT_DROPPED: &str = "task dropped before producing a result";
const ALREADY_TAKEN: &str = "result already taken";

#[inline]
fn closed() -> PoolError {
    PoolError::task_failure(CHANNEL_CLOSED)
}


/// Сторона записи результата задачи.
///
/// Результат записывается ровно один раз: либо через `complete`,
/// либо в `Drop`, если задача так и не отработала.
pub(crate) struct ResultSlot<T> {
    sender: Option<oneshot::Sender<PoolResult<T>>>,
    counters: Arc<Counters>,
}

impl<T> ResultSlot<T> {
    pub(crate) fn new(counters: Arc<Counters>) -> (Self, JoinHandle<T>) {
        let (tx, rx) = oneshot::channel();
        let slot = Self {
            sender: Some(tx),
            counters,
        };
        (slot, JoinHandle::new(rx))
    }

    pub(crate) fn complete(mut self, outcome: PoolResult<T>) {
        self.counters.record(outcome.is_ok());
        if let Some(tx) = self.sender.take() {
            // читатель мог выбросить handle
            let _ = tx.send(outcome);
        }
    }
}

impl<T> Drop for ResultSlot<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.sender.take() {
            let _ = tx.send(Err(PoolError::task_failure(SLOT_DROPPED)));
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}


/// Handle на результат задачи
pub struct JoinHandle<T> {
    // `None` после того, как результат забрали
    receiver: Option<oneshot::Receiver<PoolResult<T>>>,
}

impl<T> JoinHandle<T> {

    fn new(receiver: oneshot::Receiver<PoolResult<T>>) -> Self {
        Self { receiver: Some(receiver) }
    }

    /// Блокирует поток до появления результата.
    ///
    /// Работает и на потоке tokio-рантайма, но блокирует его целиком,
    /// в async-коде лучше `.await`.
    pub fn wait(mut self) -> PoolResult<T> {
        match self.receiver.take() {
            Some(rx) => futures::executor::block_on(rx).unwrap_or_else(|_| Err(closed())),
            None => Err(PoolError::task_failure(ALREADY_TAKEN)),
        }
    }

    /// Неблокирующая проверка. `None`, пока задача не завершилась.
    pub fn try_wait(&mut self) -> Option<PoolResult<T>> {
        let rx = match self.receiver.as_mut() {
            Some(rx) => rx,
            None => return Some(Err(PoolError::task_failure(ALREADY_TAKEN))),
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(closed()),
        };
        self.receiver = None;
        Some(result)
    }

    /// Ожидание с таймаутом. Задача при этом не отменяется,
    /// после `PoolError::Timeout` handle можно ждать повторно.
    pub async fn await_timeout(&mut self, timeout: Duration) -> PoolResult<T> {
        let rx = match self.receiver.as_mut() {
            Some(rx) => rx,
            None => return Err(PoolError::task_failure(ALREADY_TAKEN)),
        };
        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(closed()),
            Err(_) => return Err(PoolError::Timeout),
        };
        self.receiver = None;
        result
    }

    #[inline]
    pub fn is_taken(&self) -> bool {
        self.receiver.is_none()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = PoolResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let rx = match this.receiver.as_mut() {
            Some(rx) => rx,
            None => return Poll::Ready(Err(PoolError::task_failure(ALREADY_TAKEN))),
        };
        match Pin::new(rx).poll(cx) {
            Poll::Ready(res) => {
                this.receiver = None;
                Poll::Ready(res.unwrap_or_else(|_| Err(closed())))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> std::fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinHandle").finish_non_exhaustive()
    }
}

/// Дожидается всех handles, результаты в порядке отправки
pub async fn join_all<T>(handles: Vec<JoinHandle<T>>) -> Vec<PoolResult<T>> {
    futures::future::join_all(handles).await
}
