//! Exact-length reads over a byte stream, with offset tracking.

use std::io::{self, Read};

use crate::error::DecodeError;

/// Largest buffer growth per read; lengths come from untrusted prefixes.
const READ_CHUNK: usize = 64 * 1024;

/// A source of column bytes.
///
/// Decoders and payload corrections pull bytes through this trait so that
/// corrections can be plugged in as trait objects.
pub trait ByteSource {
    /// Read exactly `n` bytes.
    ///
    /// # Errors
    /// - `DecodeError::UnexpectedEof` if the stream ends first
    /// - `DecodeError::Io` if the underlying stream fails
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError>;

    /// Number of bytes consumed so far.
    fn offset(&self) -> u64;
}

/// Wraps any [`Read`] and counts the bytes taken from it.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> ByteCursor<R> {
    /// Wrap a reader; the offset starts at zero.
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely. Bytes read before a failure still count
    /// towards the offset.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(DecodeError::UnexpectedEof),
                Ok(n) => {
                    filled += n;
                    self.offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(DecodeError::Io(e)),
            }
        }
        Ok(())
    }
}

impl<R: Read> ByteSource for ByteCursor<R> {
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        let mut buf = Vec::with_capacity(n.min(READ_CHUNK));
        while buf.len() < n {
            let start = buf.len();
            let step = (n - start).min(READ_CHUNK);
            buf.resize(start + step, 0);
            self.fill(&mut buf[start..])?;
        }
        Ok(buf)
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most one byte per `read` call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn test_read_bytes_tracks_offset() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data[..]);
        assert_eq!(cursor.read_bytes(2).unwrap(), vec![1, 2]);
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.read_bytes(0).unwrap(), Vec::<u8>::new());
        assert_eq!(cursor.read_bytes(3).unwrap(), vec![3, 4, 5]);
        assert_eq!(cursor.offset(), 5);
    }

    #[test]
    fn test_short_reads_are_retried() {
        let data = [9u8, 8, 7];
        let mut cursor = ByteCursor::new(Trickle(&data));
        assert_eq!(cursor.read_bytes(3).unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn test_eof_counts_partial_bytes() {
        let data = [1u8, 2];
        let mut cursor = ByteCursor::new(&data[..]);
        assert!(matches!(cursor.read_bytes(4), Err(DecodeError::UnexpectedEof)));
        assert_eq!(cursor.offset(), 2);
        assert!(matches!(cursor.read_bytes(1), Err(DecodeError::UnexpectedEof)));
    }

    #[test]
    fn test_huge_length_over_short_stream() {
        let data = [7u8; 10];
        let mut cursor = ByteCursor::new(&data[..]);
        assert!(matches!(
            cursor.read_bytes(usize::MAX),
            Err(DecodeError::UnexpectedEof)
        ));
        assert_eq!(cursor.offset(), 10);
    }

    #[test]
    fn test_read_spanning_several_chunks() {
        let data: Vec<u8> = (0..READ_CHUNK * 2 + 5).map(|i| i as u8).collect();
        let mut cursor = ByteCursor::new(&data[..]);
        assert_eq!(cursor.read_bytes(data.len()).unwrap(), data);
        assert_eq!(cursor.offset(), data.len() as u64);
    }
}
