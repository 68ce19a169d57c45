//! Archive packing and unpacking.
//!
//! An archive is an ordered set of named entries, serialized into a flat
//! container buffer and then compressed as a whole.
//!
//! ## Architecture
//!
//! - [`structures`]: the entry model ([`Content`], [`Entry`], [`EntryMap`]) and format constants
//! - [`codec`]: container serialization and strict deserialization
//! - [`archive`]: the [`Packer`] that pairs the codec with a
//!   [`Compressor`](crate::compress::Compressor)
//!
//! ## Container Format
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 7 | magic `RUNPACK` |
//! | 7 | 4 | total buffer length |
//! | 11 | 4 | entry count |
//! | 15 | varies | entry records |
//!
//! Each record is `path length (2) | content length (4) | flag (1) | path | content`,
//! with flag 1 for binary content and 0 for UTF-8 text. Integers are little-endian.
//!
//! ## Limitations
//!
//! - Paths are limited to 65535 UTF-8 bytes
//! - Combined content is limited to 4 GiB - 1
//! - No checksums, no streaming, no directory traversal

pub mod archive;
pub mod codec;
pub mod structures;

pub use archive::{
    Packer, decode_archive, decode_archive_from_text, encode_archive, encode_archive_to_text,
};
pub use codec::{deserialize, serialize};
pub use structures::*;
