//! Data sources for BCP row data
//!
//! A table's rows are spread over one or more segment files. This module
//! finds those files and presents them as a single byte stream.

mod discover;
mod segmented;

pub use discover::{discover_segments, SEGMENT_PATTERN};
pub use segmented::{SegmentedReader, DEFAULT_BUFFER_SIZE};
