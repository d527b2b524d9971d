use std::sync::atomic::{AtomicUsize, Ordering};

/// Снимок состояния пула
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    pub workers: usize,
    pub live_workers: usize,
    pub queued_tasks: usize,
    pub active_tasks: usize,
    pub total_submitted: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn idle_workers(&self) -> usize {
        self.live_workers.saturating_sub(self.active_tasks)
    }

    pub fn utilization(&self) -> f64 {
        if self.live_workers == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.live_workers as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.queued_tasks as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}

/// Счетчики, которые обновляют воркеры и слоты результатов
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) active: AtomicUsize,
    pub(crate) submitted: AtomicUsize,
    pub(crate) completed: AtomicUsize,
    pub(crate) failed: AtomicUsize,
}

impl Counters {
    #[inline]
    pub(crate) fn record(&self, ok: bool) {
        if ok {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
