//! Bounded execution of fallible filesystem and install actions.
//!
//! Batches run either in series or on a dedicated rayon pool with at most
//! `limit` actions in flight. After the first failure no further action is
//! started; actions already running are allowed to finish, and the first
//! error is returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

/// A deferred action.
pub type Task<'a> = Box<dyn FnOnce() -> Result<()> + Send + 'a>;

/// Box a closure as a [`Task`].
pub fn task<'a>(f: impl FnOnce() -> Result<()> + Send + 'a) -> Task<'a> {
    Box::new(f)
}

/// Run tasks one after another, stopping at the first failure.
pub fn run_series(tasks: Vec<Task<'_>>) -> Result<()> {
    for task in tasks {
        task()?;
    }
    Ok(())
}

/// Worker threads started for a batch without a limit.
pub const UNBOUNDED_WORKERS: usize = 64;

/// Run tasks with at most `limit` in flight.
///
/// `0` means no configured limit: the pool then grows with the batch up to
/// [`UNBOUNDED_WORKERS`] threads.
pub fn run_parallel(tasks: Vec<Task<'_>>, limit: usize) -> Result<()> {
    let count = tasks.len();
    if count == 0 {
        return Ok(());
    }

    let threads = if limit == 0 {
        count.min(UNBOUNDED_WORKERS)
    } else {
        limit.min(count)
    };
    if threads == 1 {
        return run_series(tasks);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("tether-worker-{}", i))
        .build()
        .context("failed to start worker pool")?;

    let queue = Mutex::new(tasks.into_iter());
    let failed = AtomicBool::new(false);
    let first_error: Mutex<Option<anyhow::Error>> = Mutex::new(None);

    pool.scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|_| loop {
                if failed.load(Ordering::SeqCst) {
                    break;
                }
                let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                let Some(task) = next else {
                    break;
                };
                if let Err(e) = task() {
                    failed.store(true, Ordering::SeqCst);
                    let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            });
        }
    });

    match first_error
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
    {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_run_series_stops_at_first_error() {
        let ran = AtomicUsize::new(0);
        let tasks = vec![
            task(|| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            task(|| bail!("boom")),
            task(|| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ];

        let err = run_series(tasks).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_parallel_runs_everything() {
        let ran = AtomicUsize::new(0);
        let tasks: Vec<Task<'_>> = (0..20)
            .map(|_| {
                task(|| {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        run_parallel(tasks, 4).unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_run_parallel_respects_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<Task<'_>> = (0..12)
            .map(|_| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                task(move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        run_parallel(tasks, 3).unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn test_run_parallel_stops_dispatching_after_failure() {
        let ran = AtomicUsize::new(0);
        let mut tasks: Vec<Task<'_>> = vec![task(|| bail!("first failure"))];
        for _ in 0..50 {
            tasks.push(task(|| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        // One worker makes dispatch order deterministic
        let err = run_parallel(tasks, 1).unwrap_err();
        assert_eq!(err.to_string(), "first failure");
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pool_finishes_in_flight_tasks_after_failure() {
        let slow_done = AtomicBool::new(false);
        let ran = AtomicUsize::new(0);

        let mut tasks: Vec<Task<'_>> = vec![
            task(|| {
                std::thread::sleep(Duration::from_millis(100));
                slow_done.store(true, Ordering::SeqCst);
                Ok(())
            }),
            task(|| bail!("first failure")),
        ];
        for _ in 0..100 {
            tasks.push(task(|| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        tasks.push(task(|| bail!("second failure")));

        let err = run_parallel(tasks, 2).unwrap_err();

        assert_eq!(err.to_string(), "first failure");
        assert!(slow_done.load(Ordering::SeqCst));
        // The worker that failed stops; the other is busy with the slow task
        assert!(ran.load(Ordering::SeqCst) < 100);
    }

    #[test]
    fn test_run_parallel_reports_an_error() {
        let tasks: Vec<Task<'_>> = (0..8)
            .map(|i| task(move || if i == 5 { bail!("task {} failed", i) } else { Ok(()) }))
            .collect();

        let err = run_parallel(tasks, 0).unwrap_err();
        assert_eq!(err.to_string(), "task 5 failed");
    }

    #[test]
    fn test_unbounded_pool_is_capped() {
        let names = Mutex::new(std::collections::HashSet::new());
        let tasks: Vec<Task<'_>> = (0..300)
            .map(|_| {
                task(|| {
                    let name = std::thread::current().name().map(str::to_string);
                    names.lock().unwrap().insert(name);
                    Ok(())
                })
            })
            .collect();

        run_parallel(tasks, 0).unwrap();
        let names = names.into_inner().unwrap();
        assert!(!names.is_empty());
        assert!(names.len() <= UNBOUNDED_WORKERS);
    }

    #[test]
    fn test_empty_batch() {
        run_parallel(Vec::new(), 4).unwrap();
        run_series(Vec::new()).unwrap();
    }
}
