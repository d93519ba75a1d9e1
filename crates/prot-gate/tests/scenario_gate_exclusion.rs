//! Concurrency scenarios for `KeyedGate`.
//!
//! Runs on the multi-threaded runtime so that critical sections for the same
//! key genuinely race for the gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use prot_gate::{KeyedGate, ResourceKey};
use tokio::sync::Barrier;

fn key(s: &str) -> ResourceKey {
    ResourceKey::new(s).unwrap()
}

// ---------------------------------------------------------------------------
// Same key: no overlap
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_key_critical_sections_never_overlap() {
    let gate = KeyedGate::new();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let gate = gate.clone();
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        let completed = Arc::clone(&completed);
        handles.push(tokio::spawn(async move {
            gate.run_exclusive(&key("variant"), || async {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                completed.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(())
            })
            .await
        }));
    }

    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 16);
    assert!(gate.is_empty(), "lock table leaked entries");
}

// ---------------------------------------------------------------------------
// Distinct keys: free to overlap
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn distinct_keys_run_in_parallel() {
    let gate = KeyedGate::new();
    // Both sections must be inside the gate at once to pass the barrier.
    let barrier = Arc::new(Barrier::new(2));

    let run = |name: &'static str| {
        let gate = gate.clone();
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            gate.run_exclusive(&key(name), || async {
                barrier.wait().await;
                Ok::<_, ()>(name)
            })
            .await
        })
    };

    let a = run("a");
    let b = run("b");

    let both = tokio::time::timeout(Duration::from_secs(5), async { (a.await, b.await) })
        .await
        .expect("distinct keys were serialized");

    assert_eq!(both.0.unwrap(), Ok("a"));
    assert_eq!(both.1.unwrap(), Ok("b"));
    assert!(gate.is_empty());
}

// ---------------------------------------------------------------------------
// Release on failure
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_section_releases_key_for_waiter() {
    let gate = KeyedGate::new();

    let first = {
        let gate = gate.clone();
        tokio::spawn(async move {
            gate.run_exclusive(&key("k"), || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err::<(), _>("remote said no")
            })
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(gate.is_held("k"));

    let second = tokio::time::timeout(
        Duration::from_secs(5),
        gate.run_exclusive(&key("k"), || async { Ok::<_, &str>("second") }),
    )
    .await
    .expect("waiter deadlocked after failed section");

    assert_eq!(first.await.unwrap(), Err("remote said no"));
    assert_eq!(second, Ok("second"));
    assert!(gate.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_section_releases_key() {
    let gate = KeyedGate::new();

    let crashed = {
        let gate = gate.clone();
        tokio::spawn(async move {
            gate.run_exclusive(&key("k"), || async {
                if gate.is_held("k") {
                    panic!("critical section blew up");
                }
                Ok::<(), ()>(())
            })
            .await
        })
    };
    assert!(crashed.await.is_err());
    assert!(gate.is_empty());

    let after = gate.run_exclusive(&key("k"), || async { Ok::<_, ()>(1) }).await;
    assert_eq!(after, Ok(1));
}

#[tokio::test]
async fn cancelled_caller_releases_key() {
    let gate = KeyedGate::new();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(10),
        gate.run_exclusive(&key("k"), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), ()>(())
        }),
    )
    .await;

    assert!(timed_out.is_err());
    assert!(gate.is_empty());
    assert_eq!(
        gate.run_exclusive(&key("k"), || async { Ok::<_, ()>("free") }).await,
        Ok("free")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_waiter_does_not_disturb_holder() {
    let gate = KeyedGate::new();

    let holder = {
        let gate = gate.clone();
        tokio::spawn(async move {
            gate.run_exclusive(&key("k"), || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, ()>("holder")
            })
            .await
        })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    let gave_up = tokio::time::timeout(
        Duration::from_millis(5),
        gate.run_exclusive(&key("k"), || async { Ok::<_, ()>("waiter") }),
    )
    .await;
    assert!(gave_up.is_err());
    assert!(gate.is_held("k"), "holder's entry dropped by cancelled waiter");

    assert_eq!(holder.await.unwrap(), Ok("holder"));
    assert!(gate.is_empty());
}
