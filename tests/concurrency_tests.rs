// tests/concurrency_tests.rs

mod common;

use search_key_rotation::{FailureLedger, KeyRegistry, KeySelector};
use std::sync::Arc;
use std::thread;

#[test]
fn test_parallel_reports_are_not_lost() {
    let (selector, _) = common::test_selector();
    selector.register_provider_keys("brave", "k1,k2");
    let selector = Arc::new(selector);

    const THREADS: u32 = 16;
    const REPORTS_PER_THREAD: u32 = 250;

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let selector = Arc::clone(&selector);
            thread::spawn(move || {
                for _ in 0..REPORTS_PER_THREAD {
                    selector.report_failure("k1", if i % 2 == 0 { 429 } else { 500 });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("reporter thread panicked");
    }

    let record = selector.ledger().record("brave", "k1").unwrap();
    assert_eq!(record.fail_count, THREADS * REPORTS_PER_THREAD);
    assert!(record.status_code == 429 || record.status_code == 500);
}

#[test]
fn test_concurrent_registration_and_selection() {
    let selector = Arc::new(KeySelector::new().with_seed(3));
    selector.register_provider_keys("brave", "seed-key,other-key");

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let selector = Arc::clone(&selector);
            thread::spawn(move || {
                for i in 0..100 {
                    selector.register_provider_keys("brave", &format!("w{w}-k{i}"));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let selector = Arc::clone(&selector);
            thread::spawn(move || {
                for _ in 0..200 {
                    let key = selector.select("seed-key");
                    assert!(!key.is_empty());
                    assert_eq!(selector.registry().provider_of(&key).as_deref(), Some("brave"));
                    selector.report_failure(&key, 503);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().expect("worker thread panicked");
    }

    assert_eq!(selector.registry().all_keys_of("brave").len(), 402);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_state_across_selectors() {
    let registry = Arc::new(KeyRegistry::new());
    let ledger = Arc::new(FailureLedger::new());
    registry.register("tavily", "t1,t2,t3");

    let reporter = Arc::new(KeySelector::with_state(registry.clone(), ledger.clone()));
    let picker = Arc::new(KeySelector::with_state(registry, ledger).with_seed(11));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let reporter = Arc::clone(&reporter);
            tokio::spawn(async move {
                for _ in 0..50 {
                    reporter.report_failure("t2", 401);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("reporter task failed");
    }

    assert_eq!(picker.ledger().record("tavily", "t2").unwrap().fail_count, 400);
    for _ in 0..200 {
        assert_ne!(picker.select("t1"), "t2");
    }
}
