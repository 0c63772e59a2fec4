//! BCP row reader components
//!
//! This module provides the core decoding functionality for BCP row data,
//! including size prefixes, per-type decoders, payload corrections and the
//! row-at-a-time stream reader.

mod correction;
mod cursor;
pub mod decode;
mod extracted;
pub mod le;
mod preview;
mod size_prefix;
pub mod stream;
mod temporal;

pub use correction::{
    correction_for, CorrectionConfig, CorrectionSet, PayloadCorrection, SpuriousRunCorrection,
};
pub use cursor::{ByteCursor, ByteSource};
pub use decode::{decode_column, prefix_layout, DecodeOptions, PrefixLayout};
pub use extracted::ExtractedColumn;
pub use preview::{preview_hex, preview_str};
pub use size_prefix::{read_stored_size, NullSentinel, StoredSize};
pub use stream::{BcpRowReader, ReaderConfig, Verbosity};
pub use temporal::{
    decode_date, decode_datetime, decode_datetime2, decode_smalldatetime, decode_time,
    MAX_TIME_SCALE,
};
