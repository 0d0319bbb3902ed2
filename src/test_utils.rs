//! Scripted byte sources and line builders shared by unit tests and benches

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::io;

use crate::source::ByteSource;

/// One scripted read result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Bytes handed out, split across reads if the caller's buffer is smaller
    Data(Vec<u8>),
    /// A zero-byte read
    Idle,
    /// A transport failure
    Error,
}

/// Byte source replaying a fixed script of reads.
///
/// Once the script is exhausted every read reports an idle link, so a pump
/// driven by it keeps running until cancelled.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    reads: usize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps: steps.into(), reads: 0 }
    }

    /// Script that delivers `bytes` in chunks of at most `chunk_size`.
    pub fn from_bytes(bytes: &[u8], chunk_size: usize) -> Self {
        let steps = bytes.chunks(chunk_size.max(1)).map(|c| ScriptStep::Data(c.to_vec())).collect();
        Self::new(steps)
    }

    /// Reads served so far, including idle and failed ones.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// True once every scripted step has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.steps.is_empty()
    }
}

#[async_trait::async_trait]
impl ByteSource for ScriptedSource {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;

        match self.steps.pop_front() {
            None | Some(ScriptStep::Idle) => Ok(0),
            Some(ScriptStep::Error) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted link failure")),
            Some(ScriptStep::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.steps.push_front(ScriptStep::Data(data.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

/// `count` well-formed CRLF-terminated lines with distinct altitudes.
pub fn sample_lines(count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count * 32);
    for i in 0..count {
        out.extend_from_slice(format!("{}.5,250.25,-0.125,0.75\r\n", 10_000 + i).as_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn splits_data_to_fit_buffer() {
        let mut source = ScriptedSource::new(vec![ScriptStep::Data(b"abcdef".to_vec())]);
        let mut buf = [0u8; 4];

        assert_eq!(source.read_chunk(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(source.read_chunk(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert!(source.is_exhausted());
    }

    #[tokio::test]
    async fn exhausted_script_reports_idle() {
        let mut source = ScriptedSource::new(vec![ScriptStep::Error]);
        let mut buf = [0u8; 4];

        assert!(source.read_chunk(&mut buf).await.is_err());
        assert_eq!(source.read_chunk(&mut buf).await.unwrap(), 0);
        assert_eq!(source.read_chunk(&mut buf).await.unwrap(), 0);
        assert_eq!(source.reads(), 3);
    }

    #[test]
    fn sample_lines_decode() {
        let bytes = sample_lines(3);
        let lines: Vec<_> = bytes.split(|b| *b == b'\n').filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert!(crate::decoder::decode(line).is_ok());
        }
    }
}
