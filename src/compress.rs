//! Compression formats applied to the serialized container.
//!
//! The container codec never compresses anything itself. The archive layer
//! hands the whole serialized buffer to a [`Compressor`] once per call.

use anyhow::{Result, bail};
use async_trait::async_trait;
use flate2::Compression;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::PackError;

/// Supported compression formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionFormat {
    /// gzip (RFC 1952), the most widely readable choice
    #[default]
    Gzip,
    /// Brotli (RFC 7932)
    Brotli,
    /// zlib-wrapped deflate (RFC 1950)
    Deflate,
}

impl CompressionFormat {
    pub const ALL: [CompressionFormat; 3] = [
        CompressionFormat::Gzip,
        CompressionFormat::Brotli,
        CompressionFormat::Deflate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CompressionFormat::Gzip => "gzip",
            CompressionFormat::Brotli => "brotli",
            CompressionFormat::Deflate => "deflate",
        }
    }

    /// Guess the format from an archive file name's extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gz" | "gzip" => Some(CompressionFormat::Gzip),
            "br" => Some(CompressionFormat::Brotli),
            "zz" | "zlib" | "deflate" => Some(CompressionFormat::Deflate),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionFormat {
    type Err = PackError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(CompressionFormat::Gzip),
            "brotli" | "br" => Ok(CompressionFormat::Brotli),
            "deflate" | "zlib" => Ok(CompressionFormat::Deflate),
            _ => Err(PackError::UnsupportedCompression(s.to_string())),
        }
    }
}

/// Trait for whole-buffer compression backends
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress `data` with the given format
    async fn compress(&self, data: Vec<u8>, format: CompressionFormat) -> Result<Vec<u8>>;

    /// Decompress `data` that was produced with the given format
    async fn decompress(&self, data: Vec<u8>, format: CompressionFormat) -> Result<Vec<u8>>;

    /// Whether this backend can handle the format at all
    fn is_supported(&self, _format: CompressionFormat) -> bool {
        true
    }
}

/// Compressor backed by `flate2`, plus the `brotli` crate when the `brotli`
/// feature is enabled.
///
/// Work runs on the blocking thread pool so callers on the async runtime are
/// not stalled by large buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCompressor {
    level: Option<u32>,
}

impl NativeCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit compression level, 0 (fastest) to 9 (smallest).
    ///
    /// Brotli quality is scaled from the same range onto 0..=11.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Some(level.min(9)),
        }
    }

    pub fn level(&self) -> Option<u32> {
        self.level
    }

    fn check(&self, format: CompressionFormat) -> Result<()> {
        if !self.is_supported(format) {
            return Err(PackError::UnsupportedCompression(format.to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Compressor for NativeCompressor {
    async fn compress(&self, data: Vec<u8>, format: CompressionFormat) -> Result<Vec<u8>> {
        self.check(format)?;
        let level = self.level;
        tokio::task::spawn_blocking(move || compress_blocking(&data, format, level)).await?
    }

    async fn decompress(&self, data: Vec<u8>, format: CompressionFormat) -> Result<Vec<u8>> {
        self.check(format)?;
        tokio::task::spawn_blocking(move || decompress_blocking(&data, format)).await?
    }

    fn is_supported(&self, format: CompressionFormat) -> bool {
        match format {
            CompressionFormat::Gzip | CompressionFormat::Deflate => true,
            CompressionFormat::Brotli => cfg!(feature = "brotli"),
        }
    }
}

fn flate_level(level: Option<u32>) -> Compression {
    level.map(Compression::new).unwrap_or_default()
}

fn compress_blocking(
    data: &[u8],
    format: CompressionFormat,
    level: Option<u32>,
) -> Result<Vec<u8>> {
    match format {
        CompressionFormat::Gzip => {
            let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate_level(level));
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionFormat::Deflate => {
            let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate_level(level));
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionFormat::Brotli => brotli_impl::compress(data, level),
    }
}

/// Decompress a single complete stream.
///
/// Bytes left over after the end of the stream are an error.
fn decompress_blocking(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let rest = match format {
        CompressionFormat::Gzip => {
            let mut decoder = flate2::bufread::GzDecoder::new(data);
            decoder.read_to_end(&mut out)?;
            decoder.into_inner()
        }
        CompressionFormat::Deflate => {
            let mut decoder = flate2::bufread::ZlibDecoder::new(data);
            decoder.read_to_end(&mut out)?;
            decoder.into_inner()
        }
        CompressionFormat::Brotli => {
            let (decoded, rest) = brotli_impl::decompress(data)?;
            out = decoded;
            rest
        }
    };
    check_consumed(rest, format)?;
    Ok(out)
}

fn check_consumed(rest: &[u8], format: CompressionFormat) -> Result<()> {
    if !rest.is_empty() {
        bail!("{} trailing bytes after end of {} stream", rest.len(), format);
    }
    Ok(())
}

#[cfg(feature = "brotli")]
mod brotli_impl {
    use anyhow::Result;
    use brotli::enc::BrotliEncoderParams;
    use std::io::Read;

    const BUFFER_SIZE: usize = 4096;
    const DEFAULT_QUALITY: u32 = 11;
    const WINDOW_BITS: u32 = 22;

    pub fn compress(data: &[u8], level: Option<u32>) -> Result<Vec<u8>> {
        let quality = level.map(|l| (l * 11 + 8) / 9).unwrap_or(DEFAULT_QUALITY);
        let params = BrotliEncoderParams {
            quality: quality as i32,
            lgwin: WINDOW_BITS as i32,
            ..Default::default()
        };

        let mut input = data;
        let mut out = Vec::new();
        brotli::enc::BrotliCompress(&mut input, &mut out, &params)?;
        Ok(out)
    }

    /// Decode one stream, returning the output and the input never handed
    /// to the decoder.
    pub fn decompress(data: &[u8]) -> Result<(Vec<u8>, &[u8])> {
        let mut input = data;
        let mut out = Vec::new();
        {
            let mut decoder = brotli::Decompressor::new(&mut input, BUFFER_SIZE);
            decoder.read_to_end(&mut out)?;
            // A read past the end reports input the decoder buffered but
            // did not use
            let mut extra = [0u8; 1];
            if decoder.read(&mut extra)? != 0 {
                anyhow::bail!("unexpected output after end of brotli stream");
            }
        }
        Ok((out, input))
    }
}

#[cfg(not(feature = "brotli"))]
mod brotli_impl {
    use anyhow::Result;

    use crate::error::PackError;

    pub fn compress(_data: &[u8], _level: Option<u32>) -> Result<Vec<u8>> {
        Err(PackError::UnsupportedCompression("brotli".to_string()).into())
    }

    pub fn decompress(_data: &[u8]) -> Result<(Vec<u8>, &[u8])> {
        Err(PackError::UnsupportedCompression("brotli".to_string()).into())
    }
}
