//! Cooperative chunked transformation of large row sets
//!
//! Reports can hold hundreds of thousands of rows. Mapping them in one go
//! would hold the executor thread for the whole pass, so the work is split
//! into slices with a yield to the scheduler between consecutive slices.

use futures::stream::{self, Stream, StreamExt};

use adpulse_domain::DEFAULT_CHUNK_SIZE;

/// Maps items in fixed-size slices, yielding between slices.
///
/// Output preserves input order and length. The returned stream is lazy and
/// single-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedTransformer {
    chunk_size: usize,
}

impl Default for ChunkedTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkedTransformer {
    /// A chunk size of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }

    /// Items processed per yield.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Stream of `f(item)` for every item, in order.
    pub fn transform<T, U, F>(&self, items: Vec<T>, f: F) -> impl Stream<Item = U> + Send
    where
        T: Send,
        U: Send,
        F: FnMut(T) -> U + Send,
    {
        let chunk_size = self.chunk_size;
        stream::unfold((items.into_iter(), f, true), move |(mut remaining, mut f, first)| async move {
            if remaining.as_slice().is_empty() {
                return None;
            }
            if !first {
                tokio::task::yield_now().await;
            }
            let slice: Vec<U> = remaining.by_ref().take(chunk_size).map(&mut f).collect();
            Some((stream::iter(slice), (remaining, f, false)))
        })
        .flatten()
    }

    /// Drive [`ChunkedTransformer::transform`] to completion.
    pub async fn transform_all<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: FnMut(T) -> U + Send,
    {
        self.transform(items, f).collect().await
    }
}
