//! Provides a bounded, order-preserving async map.
//!
//! A fixed number of workers pull indices from a shared cursor; each result
//! lands in the slot of its input index, so the output order never depends
//! on completion order.
//!
//! # Examples
//! ```
//! use glimpse_items::mapper::map_bounded;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let doubled = map_bounded(vec![1, 2, 3], 2, |&n| async move { n * 2 }).await;
//! assert_eq!(doubled, vec![2, 4, 6]);
//! # });
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;

/// Applies `f` to every item with at most `limit` calls in flight.
///
/// Workers are spawned onto the current runtime. A panic inside `f` is
/// resumed on the caller.
pub async fn map_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    T: Send + Sync + 'static,
    R: Send + 'static,
    F: Fn(&T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let mapped = try_map_bounded(items, limit, move |item| {
        let call = f(item);
        async move { Ok::<_, Infallible>(call.await) }
    })
    .await;
    match mapped {
        Ok(out) => out,
        Err(never) => match never {},
    }
}

/// Like [`map_bounded`], but stops handing out items once any call fails.
///
/// Calls already in flight run to completion; the first error observed is
/// returned.
pub async fn try_map_bounded<T, R, E, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Result<Vec<R>, E>
where
    T: Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(&T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let items: Arc<[T]> = items.into();
    let f = Arc::new(f);
    let cursor = Arc::new(AtomicUsize::new(0));
    let failure: Arc<Mutex<Option<E>>> = Arc::new(Mutex::new(None));
    let slots: Arc<Mutex<Vec<Option<R>>>> =
        Arc::new(Mutex::new((0..total).map(|_| None).collect()));

    let mut workers = JoinSet::new();
    for _ in 0..limit.clamp(1, total) {
        let items = Arc::clone(&items);
        let f = Arc::clone(&f);
        let cursor = Arc::clone(&cursor);
        let failure = Arc::clone(&failure);
        let slots = Arc::clone(&slots);
        workers.spawn(async move {
            while failure.lock().is_none() {
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= items.len() {
                    break;
                }
                match f(&items[index]).await {
                    Ok(result) => slots.lock()[index] = Some(result),
                    Err(e) => {
                        failure.lock().get_or_insert(e);
                        break;
                    }
                }
            }
        });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
            panic!("mapper worker was cancelled: {}", e);
        }
    }

    if let Some(e) = failure.lock().take() {
        return Err(e);
    }
    let slots = std::mem::take(&mut *slots.lock());
    Ok(filled(slots))
}

/// Unwraps result slots; every worker exited normally, so none is empty.
fn filled<R>(slots: Vec<Option<R>>) -> Vec<R> {
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| match slot {
            Some(result) => result,
            None => panic!("mapper slot {} was never filled", index),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_order_matches_input_despite_delays() {
        let items: Vec<u64> = (0..10).collect();
        // Earlier items finish last.
        let out = map_bounded(items.clone(), 3, |&n| async move {
            tokio::time::sleep(Duration::from_millis((10 - n) * 3)).await;
            n * 10
        })
        .await;
        assert_eq!(out, items.iter().map(|n| n * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_never_exceeds_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));

        let out = map_bounded((0..12).collect::<Vec<u32>>(), 4, move |&n| {
            let active = Arc::clone(&a);
            let peak = Arc::clone(&p);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                n
            }
        })
        .await;

        assert_eq!(out.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<u8> = map_bounded(Vec::<u8>::new(), 8, |&n| async move { n }).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_limit_zero_still_runs() {
        let out = map_bounded(vec!["a", "b"], 0, |s| {
            let s = s.to_string();
            async move { s.to_uppercase() }
        })
        .await;
        assert_eq!(out, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_try_map_stops_after_first_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let out = try_map_bounded((0..10).collect::<Vec<u32>>(), 1, move |&n| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 2 {
                    Err(format!("item {} failed", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(out, Err("item 2 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_try_map_all_ok() {
        let out = try_map_bounded(vec![3u8, 1, 2], 2, |&n| async move { Ok::<_, ()>(n + 1) }).await;
        assert_eq!(out, Ok(vec![4, 2, 3]));
    }

    #[test]
    #[should_panic(expected = "slot 1 was never filled")]
    fn test_missing_slot_panics() {
        filled(vec![Some(1), None, Some(3)]);
    }
}
