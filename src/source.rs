//! Byte source trait for telemetry links

/// A chunked byte source such as a serial port.
///
/// Sources hide the transport entirely. The pump only needs "read up to N
/// bytes"; it never opens, configures or closes anything.
#[async_trait::async_trait]
pub trait ByteSource: Send + 'static {
    /// Read up to `buf.len()` bytes into `buf`.
    ///
    /// Returns:
    /// - `Ok(n)` with `n > 0` - bytes were read
    /// - `Ok(0)` - nothing available right now; the link may simply be quiet.
    ///   This is never treated as end of stream.
    /// - `Err(e)` - transport failure; the pump pauses and retries
    ///
    /// Must be cancel-safe: dropping the future before completion may not
    /// lose bytes that were already read.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

#[async_trait::async_trait]
impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (**self).read_chunk(buf).await
    }
}
