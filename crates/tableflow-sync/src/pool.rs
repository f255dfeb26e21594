//! Bounded worker pool over a fixed task list.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `task` over every item with at most `limit` in flight, waiting for
/// all of them. A failed task never cancels its siblings; outcomes come
/// back unordered.
pub async fn run_all<T, F, Fut, R>(items: Vec<T>, limit: usize, task: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items.into_iter().map(task))
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}
