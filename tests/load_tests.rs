#[cfg(test)]
mod tests {
    use fixed_pool::{
        errors::PoolError,
        join_all,
        pool::{
            Config,
            ThreadPool,
        },
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Once,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<F, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    // Глушит вывод паник только на потоках с этим префиксом,
    // остальные тесты бинаря печатают как обычно
    fn silence_panics_on(prefix: &'static str) {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let quiet = thread::current()
                    .name()
                    .is_some_and(|name| name.starts_with(prefix));
                if !quiet {
                    default(info);
                }
            }));
        });
    }

    #[test]
    fn load_test_1_small_fast_tasks() {
        println!("\n=== LOAD TEST 1: 10k быстрых задач ===");
        let pool = ThreadPool::with_config(Config::cpu_bound()).unwrap();

        let results: Vec<_> = measure("10k tasks", || {
            let handles: Vec<_> = (0..10_000)
                .map(|x| pool.submit(move || x * 2).unwrap())
                .collect();
            handles.into_iter().map(|h| h.wait()).collect()
        });

        assert_eq!(results.len(), 10_000);
        assert!(results.iter().enumerate().all(|(i, r)| *r == Ok(i * 2)));

        let metrics = pool.metrics();
        println!("  Успешно: {}/{}", metrics.completed_tasks, results.len());
        assert_eq!(metrics.completed_tasks, 10_000);
    }

    #[test]
    fn load_test_2_blocking_tasks() {
        println!("\n=== LOAD TEST 2: 200 блокирующих задач (2ms каждая) ===");
        let pool = ThreadPool::with_config(Config::io_bound()).unwrap();

        let results: Vec<_> = measure("200 blocking tasks", || {
            let handles: Vec<_> = (0..200)
                .map(|i| pool.submit(move || {
                    thread::sleep(Duration::from_millis(2));
                    i * i
                }).unwrap())
                .collect();
            handles.into_iter().map(|h| h.wait()).collect()
        });

        let successful = results.iter().filter(|r| r.is_ok()).count();
        println!("  Успешно: {}/{}", successful, results.len());
        assert_eq!(successful, 200);
    }

    #[test]
    fn load_test_3_stress_with_panics() {
        println!("\n=== LOAD TEST 3: Стресс-тест с паниками ===");

        // Подавляем вывод паник воркеров этого пула
        silence_panics_on("panicky");

        let pool = ThreadPool::with_config(
            Config::default().with_threads(8).with_thread_name_prefix("panicky"),
        ).unwrap();
        let results: Vec<_> = measure("1k tasks (10% panic)", || {
            let handles: Vec<_> = (0..1_000)
                .map(|x| pool.submit(move || {
                    if x % 10 == 0 {
                        panic!("Intentional panic at {}", x);
                    }
                    x
                }).unwrap())
                .collect();
            handles.into_iter().map(|h| h.wait()).collect()
        });

        let successful = results.iter().filter(|r| r.is_ok()).count();
        let panicked = results.iter()
            .filter(|r| matches!(r, Err(PoolError::TaskFailure(_))))
            .count();

        println!("  Успешно: {}", successful);
        println!("  Паник перехвачено: {}", panicked);

        let metrics = pool.metrics();
        println!("  Pool success rate: {:.1}%", metrics.success_rate() * 100.0);

        assert_eq!(successful, 900);
        assert_eq!(panicked, 100);
        assert_eq!(metrics.live_workers, 8, "паники не должны убивать воркеров");
        assert_eq!(metrics.failed_tasks, 100);
    }

    #[test]
    fn load_test_4_many_submitters() {
        println!("\n=== LOAD TEST 4: 8 потоков отправляют по 5k задач ===");
        let pool = ThreadPool::new(4).unwrap();
        let executed = Arc::new(AtomicUsize::new(0));

        measure("40k tasks from 8 threads", || {
            crossbeam::scope(|s| {
                for _ in 0..8 {
                    let pool = &pool;
                    let executed = executed.clone();
                    s.spawn(move |_| {
                        for _ in 0..5_000 {
                            let executed = executed.clone();
                            pool.execute(move || {
                                executed.fetch_add(1, Ordering::Relaxed);
                            }).unwrap();
                        }
                    });
                }
            }).unwrap();
            pool.shutdown();
        });

        assert_eq!(executed.load(Ordering::Relaxed), 40_000);
        let metrics = pool.metrics();
        assert_eq!(metrics.total_submitted, 40_000);
        assert_eq!(metrics.queued_tasks, 0);
    }

    #[test]
    fn load_test_5_shutdown_with_deep_queue() {
        println!("\n=== LOAD TEST 5: Shutdown с глубокой очередью ===");
        let pool = ThreadPool::new(2).unwrap();
        let executed = Arc::new(AtomicUsize::new(0));

        for _ in 0..5_000 {
            let executed = executed.clone();
            pool.execute(move || {
                executed.fetch_add(1, Ordering::Relaxed);
            }).unwrap();
        }

        println!("  В очереди перед shutdown: {}", pool.metrics().queued_tasks);
        measure("drain on shutdown", || pool.shutdown());

        assert_eq!(executed.load(Ordering::Relaxed), 5_000);
        assert_eq!(pool.submit(|| ()).unwrap_err(), PoolError::PoolStopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn load_test_6_async_consumers() {
        println!("\n=== LOAD TEST 6: 5k задач, ожидание из async ===");
        let pool = ThreadPool::new(4).unwrap();

        let handles: Vec<_> = (0..5_000u64)
            .map(|x| pool.submit(move || x % 1000).unwrap())
            .collect();

        let start = Instant::now();
        let results = join_all(handles).await;
        let elapsed = start.elapsed();

        let successful = results.iter().filter(|r| r.is_ok()).count();
        println!("  Время: {:?}", elapsed);
        println!("  Успешно: {}/{}", successful, results.len());

        let metrics = pool.metrics();
        println!("  Итого отправлено: {}", metrics.total_submitted);
        println!("  Утилизация: {:.1}%", metrics.utilization() * 100.0);
        assert_eq!(successful, 5_000);
    }
}
