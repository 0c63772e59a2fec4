//! Buffered reader over a table's BCP segment files.
//!
//! A table's rows may be split over several `*.BCP` files with no regard for
//! row boundaries, so the files have to be read as if they were one stream.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Default size of the internal read buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Terminal state of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StreamState {
    /// More data may be available.
    Reading,
    /// Every segment has been read to its end.
    Exhausted,
    /// A filesystem error occurred; every later read fails with it.
    Failed { kind: io::ErrorKind, message: String },
}

/// Presents an ordered list of files as one continuous byte stream.
///
/// Segments are opened lazily, in list order, as the previous one reaches its
/// end. A segment that does not exist is skipped. Any other open or read
/// failure is fatal: it is reported on the next `read` call and on every call
/// after that.
///
/// Reads fill the caller's buffer completely unless the last segment ends or
/// an error occurs, so a short read means the stream is finished. Once
/// exhausted, `read` returns `Ok(0)`.
///
/// # Example
/// ```no_run
/// use std::io::Read;
/// use bactract::source::SegmentedReader;
///
/// let segments = ["TableData-000-00000.BCP", "TableData-001-00000.BCP"];
/// let mut reader = SegmentedReader::new(segments);
/// let mut prefix = [0u8; 2];
/// let n = reader.read(&mut prefix)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct SegmentedReader {
    /// Segment paths in read order
    segments: Vec<PathBuf>,
    /// Index of the next segment to open
    next_segment: usize,
    /// The open segment and its index
    file: Option<(usize, File)>,
    /// Read buffer
    buf: Box<[u8]>,
    /// Offset of the next unread byte in `buf`
    pos: usize,
    /// Number of valid bytes in `buf`
    filled: usize,
    state: StreamState,
    /// Total bytes handed to callers
    position: u64,
}

impl SegmentedReader {
    /// Create a reader with the default buffer size.
    pub fn new<P: AsRef<Path>>(segments: impl IntoIterator<Item = P>) -> Self {
        Self::with_buffer_size(segments, DEFAULT_BUFFER_SIZE)
    }

    /// Create a reader with a specific buffer size. A size of zero selects
    /// the default.
    pub fn with_buffer_size<P: AsRef<Path>>(
        segments: impl IntoIterator<Item = P>,
        buffer_size: usize,
    ) -> Self {
        let buffer_size = if buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            buffer_size
        };

        Self {
            segments: segments
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
            next_segment: 0,
            file: None,
            buf: vec![0u8; buffer_size].into_boxed_slice(),
            pos: 0,
            filled: 0,
            state: StreamState::Reading,
            position: 0,
        }
    }

    /// The segment paths in read order.
    pub fn segments(&self) -> &[PathBuf] {
        &self.segments
    }

    /// Index of the currently open segment, if any.
    pub fn current_segment(&self) -> Option<usize> {
        self.file.as_ref().map(|(index, _)| *index)
    }

    /// Number of bytes returned to callers so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether every segment has been read and the buffer drained.
    pub fn is_exhausted(&self) -> bool {
        self.state == StreamState::Exhausted && self.pos >= self.filled
    }

    fn fail(&mut self, err: &io::Error) {
        self.state = StreamState::Failed {
            kind: err.kind(),
            message: err.to_string(),
        };
        self.file = None;
    }

    /// Open the next existing segment. Returns `Ok(false)` when none are left.
    fn open_next(&mut self) -> io::Result<bool> {
        self.file = None;

        while self.next_segment < self.segments.len() {
            let index = self.next_segment;
            self.next_segment += 1;
            let path = &self.segments[index];

            match File::open(path) {
                Ok(file) => {
                    debug!(segment = index, path = %path.display(), "Opened BCP segment");
                    self.file = Some((index, file));
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(segment = index, path = %path.display(), "Skipping missing BCP segment");
                }
                Err(e) => {
                    return Err(io::Error::new(
                        e.kind(),
                        format!("{}: {}", path.display(), e),
                    ))
                }
            }
        }

        Ok(false)
    }

    /// Refill the drained buffer, rolling over segment boundaries until it is
    /// full or the last segment ends. Returns the number of bytes buffered.
    fn refill(&mut self) -> io::Result<usize> {
        if let StreamState::Failed { kind, message } = &self.state {
            return Err(io::Error::new(*kind, message.clone()));
        }

        self.pos = 0;
        self.filled = 0;

        while self.filled < self.buf.len() && self.state == StreamState::Reading {
            if self.file.is_none() {
                match self.open_next() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.state = StreamState::Exhausted;
                        break;
                    }
                    Err(e) => {
                        self.fail(&e);
                        if self.filled == 0 {
                            return Err(e);
                        }
                        break;
                    }
                }
            }

            let Some((_, file)) = self.file.as_mut() else {
                continue;
            };

            match file.read(&mut self.buf[self.filled..]) {
                Ok(0) => {
                    // End of this segment; move to the next on the next pass.
                    self.file = None;
                }
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.fail(&e);
                    if self.filled == 0 {
                        return Err(e);
                    }
                    break;
                }
            }
        }

        Ok(self.filled)
    }
}

impl Read for SegmentedReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let mut n = 0;
        loop {
            let avail = self.filled - self.pos;
            if avail > 0 {
                let take = avail.min(out.len() - n);
                out[n..n + take].copy_from_slice(&self.buf[self.pos..self.pos + take]);
                self.pos += take;
                n += take;
            }

            if n == out.len() {
                break;
            }

            match self.refill() {
                Ok(0) => break,
                Ok(_) => {}
                // Bytes already copied are returned; the error surfaces next call.
                Err(_) if n > 0 => break,
                Err(e) => return Err(e),
            }
        }

        self.position += n as u64;
        Ok(n)
    }
}

impl fmt::Debug for SegmentedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedReader")
            .field("segments", &self.segments)
            .field("current_segment", &self.current_segment())
            .field("buffer_size", &self.buf.len())
            .field("buffered", &(self.filled - self.pos))
            .field("position", &self.position)
            .field("state", &self.state)
            .finish()
    }
}
