//! AsyncRead + AsyncSeek view over a ByteReader.
//!
//! The async Parquet stream builder consumes any `AsyncRead + AsyncSeek`
//! source. [`RangeReadAdapter`] serves those reads from a read-ahead window of
//! [`PARQUET_BUFFER_SIZE`] bytes, refilled through [`ByteReader::read_range`]
//! whenever the cursor leaves it.

use anyhow::Result;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::config::PARQUET_BUFFER_SIZE;
use crate::io::ByteReader;

/// Bytes currently held in memory, starting at file offset `start`
struct Window {
    start: u64,
    bytes: Bytes,
}

impl Window {
    fn contains(&self, position: u64) -> bool {
        position >= self.start && position < self.start + self.bytes.len() as u64
    }

    /// Copy bytes at `position` into `out`; returns the count copied
    fn copy_at(&self, position: u64, out: &mut [u8]) -> usize {
        let offset = (position - self.start) as usize;
        let available = &self.bytes[offset..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        n
    }
}

/// A pending window refill
struct Fill {
    start: u64,
    future: BoxFuture<'static, Result<Vec<u8>>>,
}

pub struct RangeReadAdapter<R: ByteReader> {
    reader: Arc<R>,
    file_size: u64,
    position: u64,
    window: Option<Window>,
    fill: Option<Fill>,
}

impl<R: ByteReader + 'static> RangeReadAdapter<R> {
    /// Wrap `reader`, querying its size once up front
    pub async fn new(reader: Arc<R>) -> Result<Self> {
        let file_size = reader.size().await?;
        Ok(Self {
            reader,
            file_size,
            position: 0,
            window: None,
            fill: None,
        })
    }

    /// Serve as much of `buf` as the window allows from the current position
    fn serve(&mut self, buf: &mut ReadBuf<'_>) -> bool {
        match &self.window {
            Some(window) if window.contains(self.position) => {
                let n = window.copy_at(self.position, buf.initialize_unfilled());
                buf.advance(n);
                self.position += n as u64;
                true
            }
            _ => false,
        }
    }
}

impl<R: ByteReader + 'static> AsyncRead for RangeReadAdapter<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.position >= self.file_size || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        if self.serve(buf) {
            return Poll::Ready(Ok(()));
        }

        let this = &mut *self;
        let fill = this.fill.get_or_insert_with(|| {
            let reader = Arc::clone(&this.reader);
            let start = this.position;
            let end = (start + PARQUET_BUFFER_SIZE as u64).min(this.file_size);
            Fill {
                start,
                future: Box::pin(async move { reader.read_range(start, end).await }),
            }
        });

        match fill.future.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => {
                this.fill = None;
                Poll::Ready(Err(io::Error::other(e)))
            }
            Poll::Ready(Ok(data)) => {
                let start = fill.start;
                this.fill = None;
                this.window = Some(Window {
                    start,
                    bytes: Bytes::from(data),
                });
                // An empty refill before EOF reads as EOF
                this.serve(buf);
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl<R: ByteReader + 'static> AsyncSeek for RangeReadAdapter<R> {
    fn start_seek(mut self: Pin<&mut Self>, seek_pos: io::SeekFrom) -> io::Result<()> {
        let target = match seek_pos {
            io::SeekFrom::Start(pos) => Some(pos),
            io::SeekFrom::End(offset) => self.file_size.checked_add_signed(offset),
            io::SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
        };

        let Some(target) = target else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot seek to negative position",
            ));
        };

        self.position = target;
        // A refill started for the old position is stale
        self.fill = None;
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Ok(self.position))
    }
}
