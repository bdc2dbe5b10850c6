//! Async adapters over [`ChunkSource`].
//!
//! - [`RowStream`], stream of row batches
//! - [`FetchAll`], collect every row
//! - [`FetchOne`], first row only
use futures_core::Stream;
use std::{
    marker::PhantomData,
    pin::Pin,
    task::{
        Context,
        Poll::{self, *},
        ready,
    },
};

use crate::{
    Error, FromRow, Result,
    binary::header::DecodedColumns,
    common::verbose,
    config::Config,
    row::RowNotFound,
    stream::{RowBatch, RowBinaryDecoder},
    transport::ChunkSource,
};

/// Stream decoded row batches from a [`ChunkSource`].
///
/// A chunk is only read when the stream is polled. Dropping the stream
/// discards the partial row.
///
/// ```no_run
/// use rowbin::{Config, fetch::RowStream, io::ReadChunks};
///
/// # async fn app(reader: impl tokio::io::AsyncRead + Unpin) -> rowbin::Result<()> {
/// let config = Config::from_env();
/// let mut rows = RowStream::new(ReadChunks::new(reader, &config), &config);
///
/// while let Some(batch) = rows.next_batch().await {
///     for row in batch? {
///         let (id, name) = row.decode::<(u64, String)>()?;
///         println!("{id}: {name}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct RowStream<S> {
    source: S,
    decoder: RowBinaryDecoder,
    phase: Phase,
}

#[derive(Debug)]
enum Phase {
    Decoding,
    Finalize,
    Complete,
}

impl<S> RowStream<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            decoder: RowBinaryDecoder::with_config(config),
            phase: Phase::Decoding,
        }
    }

    /// Returns the columns, [`None`] while header is not yet received.
    pub fn columns(&self) -> Option<&DecodedColumns> {
        self.decoder.columns()
    }

    /// Receive the next batch.
    pub fn next_batch(&mut self) -> impl Future<Output = Option<Result<RowBatch>>>
    where
        S: ChunkSource,
    {
        std::future::poll_fn(|cx|Pin::new(&mut *self).poll_next(cx))
    }

    /// Collect every row decoded as `R`.
    pub fn fetch_all<R: FromRow>(self) -> FetchAll<S, R> {
        FetchAll { fetch: self, output: vec![] }
    }

    /// Decode the first row as `R`.
    pub fn fetch_one<R: FromRow>(self) -> FetchOne<S, R> {
        FetchOne { fetch: self, _p: PhantomData }
    }
}

impl<S: ChunkSource> Stream for RowStream<S> {
    type Item = Result<RowBatch>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();

        loop {
            match me.phase {
                Phase::Decoding => match ready!(me.source.poll_chunk(cx)) {
                    Some(Ok(chunk)) => match me.decoder.feed(chunk) {
                        Ok(Some(batch)) => return Ready(Some(Ok(batch))),
                        Ok(None) => { },
                        Err(err) => {
                            me.phase = Phase::Complete;
                            return Ready(Some(Err(err)));
                        },
                    },
                    Some(Err(err)) => {
                        me.phase = Phase::Complete;
                        return Ready(Some(Err(Error::from(err).context("failed to read chunk"))));
                    },
                    None => me.phase = Phase::Finalize,
                },
                Phase::Finalize => {
                    me.phase = Phase::Complete;
                    match me.decoder.finalize() {
                        Ok(batch) if batch.is_empty() => { },
                        Ok(batch) => return Ready(Some(Ok(batch))),
                        Err(err) => return Ready(Some(Err(err))),
                    }
                },
                Phase::Complete => {
                    verbose!("row stream complete");
                    return Ready(None);
                },
            }
        }
    }
}

/// Future returned from [`RowStream::fetch_all`] or [`fetch_all`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct FetchAll<S, R> {
    fetch: RowStream<S>,
    output: Vec<R>,
}

impl<S, R> Future for FetchAll<S, R>
where
    S: ChunkSource,
    R: FromRow + Unpin,
{
    type Output = Result<Vec<R>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let me = self.get_mut();

        while let Some(batch) = ready!(Pin::new(&mut me.fetch).poll_next(cx)?) {
            me.output.reserve(batch.len());
            for row in batch {
                me.output.push(row.decode()?);
            }
        }

        Ready(Ok(std::mem::take(&mut me.output)))
    }
}

/// Future returned from [`RowStream::fetch_one`] or [`fetch_one`].
///
/// Resolves as soon as the first row is decoded, the rest of the stream is
/// not read.
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct FetchOne<S, R> {
    fetch: RowStream<S>,
    _p: PhantomData<R>,
}

impl<S, R> Future for FetchOne<S, R>
where
    S: ChunkSource,
    R: FromRow + Unpin,
{
    type Output = Result<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let me = self.get_mut();

        match ready!(Pin::new(&mut me.fetch).poll_next(cx)?) {
            Some(batch) => match batch.into_iter().next() {
                Some(row) => Ready(Ok(row.decode()?)),
                // a batch is never empty
                None => Ready(Err(RowNotFound.into())),
            },
            None => Ready(Err(RowNotFound.into())),
        }
    }
}

/// Collect every row of `source` decoded as `R`.
pub fn fetch_all<S: ChunkSource, R: FromRow>(source: S, config: &Config) -> FetchAll<S, R> {
    RowStream::new(source, config).fetch_all()
}

/// Decode the first row of `source` as `R`.
pub fn fetch_one<S: ChunkSource, R: FromRow>(source: S, config: &Config) -> FetchOne<S, R> {
    RowStream::new(source, config).fetch_one()
}

#[cfg(test)]
mod test {
    use bytes::{BufMut, Bytes, BytesMut};
    use std::{io, pin::pin, task::Waker};

    use super::*;
    use crate::{error::ErrorKind, ext::BufMutExt, transport::from_iter};

    fn payload(rows: u32) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_var_uint(2);
        buf.put_var_string("id");
        buf.put_var_string("name");
        buf.put_var_string("UInt32");
        buf.put_var_string("String");
        for id in 0..rows {
            buf.put_u32_le(id);
            buf.put_var_string(&format!("user-{id}"));
        }
        buf.freeze()
    }

    fn chunks(payload: Bytes, size: usize) -> Vec<Bytes> {
        (0..payload.len())
            .step_by(size)
            .map(|i| payload.slice(i..(i + size).min(payload.len())))
            .collect()
    }

    fn ready<F: Future>(f: F) -> F::Output {
        let mut cx = Context::from_waker(Waker::noop());
        match pin!(f).poll(&mut cx) {
            Ready(output) => output,
            Pending => panic!("future is pending"),
        }
    }

    /// Returns `Pending` before every chunk.
    struct Stutter {
        chunks: std::vec::IntoIter<Bytes>,
        pending: bool,
    }

    impl Stream for Stutter {
        type Item = io::Result<Bytes>;

        fn poll_next(mut self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.pending = !self.pending;
            match self.pending {
                true => Pending,
                false => Ready(self.chunks.next().map(Ok)),
            }
        }
    }

    #[test]
    fn fetch_all_rows() {
        let source = from_iter(chunks(payload(10), 3));
        let rows = ready(fetch_all::<_, (u32, String)>(source, &Config::default())).unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[9], (9, "user-9".to_owned()));
    }

    #[test]
    fn fetch_one_row() {
        let source = from_iter(chunks(payload(3), 5));
        let (id,) = ready(fetch_one::<_, (u32,)>(source, &Config::default())).unwrap();
        assert_eq!(id, 0);

        let source = from_iter(chunks(payload(0), 5));
        let err = ready(fetch_one::<_, (u32,)>(source, &Config::default())).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::RowNotFound(_)));
    }

    #[test]
    fn pause_and_resume() {
        let mut cx = Context::from_waker(Waker::noop());
        let source = Stutter { chunks: chunks(payload(4), 2).into_iter(), pending: false };
        let mut stream = RowStream::new(source, &Config::default());

        let mut rows = vec![];
        let mut pending = 0;
        loop {
            match Pin::new(&mut stream).poll_next(&mut cx) {
                Ready(Some(batch)) => rows.extend(batch.unwrap()),
                Ready(None) => break,
                Pending => pending += 1,
            }
        }
        assert!(pending > 0);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].try_get::<_, String>("name").unwrap(), "user-3");
    }

    #[test]
    fn truncated_stream() {
        let payload = payload(2);
        let source = from_iter([payload.slice(..payload.len() - 2)]);
        let mut stream = RowStream::new(source, &Config::default());

        let first = ready(stream.next_batch()).unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert!(ready(stream.next_batch()).unwrap().unwrap_err().is_truncated());
        assert!(ready(stream.next_batch()).is_none());
    }

    /// Fails on the first poll.
    struct Failing;

    impl Stream for Failing {
        type Item = io::Result<Bytes>;

        fn poll_next(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Ready(Some(Err(io::Error::other("connection reset"))))
        }
    }

    #[test]
    fn source_error() {
        let err = ready(fetch_all::<_, ()>(Failing, &Config::default())).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io(_)));
        assert!(err.to_string().starts_with("failed to read chunk: connection reset"));
    }
}
