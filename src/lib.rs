//! # runpack
//!
//! Pack named text and binary entries into a single compressed archive.
//!
//! An archive holds an ordered list of entries, each a path plus either UTF-8
//! text or raw bytes. Entries are serialized into a compact length-prefixed
//! container, and the container is compressed as a whole with gzip, brotli or
//! deflate.
//!
//! ## Features
//!
//! - Text and binary entries, with the kind preserved across a round trip
//! - gzip, zlib deflate and (with the `brotli` feature) brotli compression
//! - Strict decoding that rejects truncated or malformed archives
//! - Base64 text transport for archives embedded in text formats
//! - Loading archives from local files or HTTP/HTTPS URLs
//!
//! ## Example
//!
//! ```no_run
//! use runpack::{CompressionFormat, Content, EntryMap, decode_archive, encode_archive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut entries = EntryMap::new();
//!     entries.insert("index.html", "<h1>hello</h1>");
//!     entries.insert("favicon.ico", vec![0u8, 0, 1, 0]);
//!
//!     let archive = encode_archive(entries, CompressionFormat::Gzip).await?;
//!     let decoded = decode_archive(&archive, CompressionFormat::Gzip).await?;
//!
//!     for entry in &decoded {
//!         println!("{} ({})", entry.path, entry.content.kind());
//!     }
//!     assert!(matches!(decoded.get("favicon.ico"), Some(Content::Binary(_))));
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod compress;
pub mod error;
pub mod io;
pub mod pack;

pub use cli::Cli;
pub use compress::{CompressionFormat, Compressor, NativeCompressor};
pub use error::{PackError, Result};
pub use io::{ArchiveSource, HttpSource, LocalFileSource, read_archive_file, write_archive_file};
pub use pack::{
    Content, Entry, EntryMap, Packer, decode_archive, decode_archive_from_text, deserialize,
    encode_archive, encode_archive_to_text, normalize, serialize,
};
