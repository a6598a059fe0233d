// Parallel fan-out used by every pipeline phase

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// How many tasks of one phase may run at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    Unbounded,
    Limited(usize),
}

impl Concurrency {
    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(n) => Concurrency::Limited(n),
            None => Concurrency::Unbounded,
        }
    }

    fn semaphore(self) -> Option<Arc<Semaphore>> {
        match self {
            Concurrency::Unbounded => None,
            Concurrency::Limited(n) => Some(Arc::new(Semaphore::new(n.max(1)))),
        }
    }
}

/// Run `worker` over every item concurrently and collect the results in input order.
///
/// Every task is spawned up front; with [`Concurrency::Limited`] a semaphore
/// decides how many of them make progress at once. `result[i]` always comes
/// from `items[i]`, whatever order the tasks finish in.
///
/// A failing task does not cancel its siblings. Once all tasks have finished,
/// the first failure observed in completion order is returned and every other
/// result is discarded. Which failure that is depends on scheduling and is not
/// stable between runs.
///
/// Dropping the returned future aborts all tasks still in flight.
pub async fn parallel_map<T, R, E, F, Fut>(
    items: Vec<T>,
    concurrency: Concurrency,
    mut worker: F,
) -> Result<Vec<R>, E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    let limit = concurrency.semaphore();
    let mut slots: Vec<Option<R>> = Vec::with_capacity(items.len());
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        slots.push(None);
        let task = worker(item);
        let limit = limit.clone();
        tasks.spawn(async move {
            // The semaphore is never closed, so acquiring only waits.
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            (index, task.await)
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(value))) => slots[index] = Some(value),
            Ok((_, Err(e))) => {
                first_error.get_or_insert(e);
            }
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                first_error.get_or_insert(E::from(e));
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    // Without a failure every task has filled its slot.
    Ok(slots.into_iter().flatten().collect())
}

/// [`parallel_map`] for workers run only for their side effects.
pub async fn parallel_for_each<T, E, F, Fut>(
    items: Vec<T>,
    concurrency: Concurrency,
    worker: F,
) -> Result<(), E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    parallel_map(items, concurrency, worker).await.map(|_| ())
}
