//! The [`ChunkSource`] trait.
use bytes::Bytes;
use futures_core::Stream;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

/// An ordered source of byte chunks of a row-binary stream.
///
/// Chunk boundary is arbitrary, including empty chunk.
pub trait ChunkSource: Unpin {
    /// Poll to receive the next chunk.
    ///
    /// Returns `Ready(None)` when the stream ends.
    fn poll_chunk(&mut self, cx: &mut Context) -> Poll<Option<io::Result<Bytes>>>;
}

impl<S> ChunkSource for S
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    fn poll_chunk(&mut self, cx: &mut Context) -> Poll<Option<io::Result<Bytes>>> {
        Pin::new(self).poll_next(cx)
    }
}

/// An extension trait to provide `Future` API for [`ChunkSource`].
pub trait ChunkSourceExt: ChunkSource {
    /// Receive the next chunk.
    fn next_chunk(&mut self) -> impl Future<Output = Option<io::Result<Bytes>>> {
        std::future::poll_fn(|cx|self.poll_chunk(cx))
    }
}

impl<T> ChunkSourceExt for T where T: ChunkSource { }

/// [`ChunkSource`] over chunks already in memory.
///
/// Created by [`from_iter`].
#[derive(Debug)]
pub struct IterChunks<I> {
    iter: I,
}

/// Create [`ChunkSource`] from an iterator of chunks.
///
/// ```
/// use bytes::Bytes;
/// use rowbin::transport::{ChunkSourceExt, from_iter};
///
/// # async fn app() {
/// let mut source = from_iter([Bytes::from_static(b"\x00")]);
/// assert!(source.next_chunk().await.is_some());
/// assert!(source.next_chunk().await.is_none());
/// # }
/// ```
pub fn from_iter<I>(chunks: I) -> IterChunks<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Into<Bytes>,
{
    IterChunks { iter: chunks.into_iter() }
}

impl<I> Stream for IterChunks<I>
where
    I: Iterator + Unpin,
    I::Item: Into<Bytes>,
{
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.iter.next().map(|e|Ok(e.into())))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}
