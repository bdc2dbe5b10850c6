//! Reader backed [`ChunkSource`][crate::transport::ChunkSource].
use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};
use tokio::io::{AsyncRead, ReadBuf};

use crate::config::Config;

pin_project_lite::pin_project! {
    /// Adapts [`AsyncRead`] into a stream of chunks.
    ///
    /// Each chunk is at most [`chunk_size`][Config::chunk_size] bytes.
    #[derive(Debug)]
    pub struct ReadChunks<R> {
        #[pin]
        reader: R,
        buf: BytesMut,
        chunk_size: usize,
        done: bool,
    }
}

impl<R> ReadChunks<R> {
    /// Create new [`ReadChunks`] with chunk size from [`Config`].
    pub fn new(reader: R, config: &Config) -> Self {
        Self::with_chunk_size(reader, config.chunk_size)
    }

    /// Create new [`ReadChunks`] with given chunk size.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: BytesMut::new(),
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }

    /// Consume self into the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead> Stream for ReadChunks<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.project();

        if *me.done {
            return Poll::Ready(None);
        }

        me.buf.resize(*me.chunk_size, 0);
        let mut read = ReadBuf::new(&mut me.buf[..]);

        if let Err(err) = ready!(me.reader.poll_read(cx, &mut read)) {
            *me.done = true;
            return Poll::Ready(Some(Err(err)));
        }

        let n = read.filled().len();
        if n == 0 {
            *me.done = true;
            return Poll::Ready(None);
        }

        me.buf.truncate(n);
        Poll::Ready(Some(Ok(me.buf.split().freeze())))
    }
}
