//! Byte source over any tokio reader

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::source::ByteSource;

/// Adapts an [`AsyncRead`] (serial port handle, pipe, socket, file) into a
/// [`ByteSource`].
///
/// A zero-byte read, including end of file, is reported as an idle link.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Recover the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait::async_trait]
impl<R> ByteSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf).await
    }
}
