use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;
use tracing::debug;

use crate::compress::{CompressionFormat, Compressor, NativeCompressor};
use crate::error::{PackError, Result};

use super::codec::{deserialize, serialize};
use super::structures::{EntryMap, normalize};

/// Archive packer: container codec plus a compression backend
pub struct Packer<C: Compressor = NativeCompressor> {
    compressor: Arc<C>,
}

impl<C: Compressor> Clone for Packer<C> {
    fn clone(&self) -> Self {
        Self {
            compressor: self.compressor.clone(),
        }
    }
}

impl Default for Packer<NativeCompressor> {
    fn default() -> Self {
        Self::new(Arc::new(NativeCompressor::new()))
    }
}

impl<C: Compressor> Packer<C> {
    pub fn new(compressor: Arc<C>) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &Arc<C> {
        &self.compressor
    }

    /// Serialize and compress entries into archive bytes
    pub async fn encode_archive(
        &self,
        input: impl Into<EntryMap>,
        format: CompressionFormat,
    ) -> Result<Vec<u8>> {
        let entries = normalize(input);
        let container = serialize(&entries)?;
        let container_len = container.len();

        let archive = self
            .compressor
            .compress(container, format)
            .await
            .map_err(PackError::normalize)?;

        debug!(
            %format,
            entries = entries.len(),
            container = container_len,
            archive = archive.len(),
            "encoded archive"
        );
        Ok(archive)
    }

    /// Decompress and deserialize archive bytes
    pub async fn decode_archive(&self, data: &[u8], format: CompressionFormat) -> Result<EntryMap> {
        let container = self
            .compressor
            .decompress(data.to_vec(), format)
            .await
            .map_err(PackError::normalize)?;

        debug!(%format, archive = data.len(), container = container.len(), "decompressed archive");
        deserialize(&container)
    }

    /// Same as [`encode_archive`](Self::encode_archive), returned as base64 text
    pub async fn encode_archive_to_text(
        &self,
        input: impl Into<EntryMap>,
        format: CompressionFormat,
    ) -> Result<String> {
        let archive = self.encode_archive(input, format).await?;
        Ok(STANDARD.encode(archive))
    }

    /// Same as [`decode_archive`](Self::decode_archive), reading base64 text
    pub async fn decode_archive_from_text(
        &self,
        text: &str,
        format: CompressionFormat,
    ) -> Result<EntryMap> {
        let archive = STANDARD
            .decode(text.trim())
            .map_err(|e| PackError::corrupted(format!("invalid base64: {e}")))?;
        self.decode_archive(&archive, format).await
    }
}

/// Encode with the default [`NativeCompressor`]
pub async fn encode_archive(
    input: impl Into<EntryMap>,
    format: CompressionFormat,
) -> Result<Vec<u8>> {
    Packer::<NativeCompressor>::default().encode_archive(input, format).await
}

/// Decode with the default [`NativeCompressor`]
pub async fn decode_archive(data: &[u8], format: CompressionFormat) -> Result<EntryMap> {
    Packer::<NativeCompressor>::default().decode_archive(data, format).await
}

pub async fn encode_archive_to_text(
    input: impl Into<EntryMap>,
    format: CompressionFormat,
) -> Result<String> {
    Packer::<NativeCompressor>::default().encode_archive_to_text(input, format).await
}

pub async fn decode_archive_from_text(text: &str, format: CompressionFormat) -> Result<EntryMap> {
    Packer::<NativeCompressor>::default().decode_archive_from_text(text, format).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::structures::Content;
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn sample() -> EntryMap {
        EntryMap::from([
            ("index.html", Content::from("<h1>héllo wörld</h1>")),
            ("logo.png", Content::from(vec![0x89u8, b'P', b'N', b'G', 0, 0xff])),
            ("empty.txt", Content::from("")),
        ])
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Failure {
        None,
        Foreign,
        Own,
    }

    /// Stores data as is and can be told to fail on decompress
    struct FakeCompressor {
        fail_with: Failure,
    }

    #[async_trait]
    impl Compressor for FakeCompressor {
        async fn compress(
            &self,
            data: Vec<u8>,
            format: CompressionFormat,
        ) -> anyhow::Result<Vec<u8>> {
            if !self.is_supported(format) {
                return Err(PackError::UnsupportedCompression(format.to_string()).into());
            }
            Ok(data)
        }

        async fn decompress(
            &self,
            data: Vec<u8>,
            _format: CompressionFormat,
        ) -> anyhow::Result<Vec<u8>> {
            match self.fail_with {
                Failure::None => Ok(data),
                Failure::Foreign => Err(anyhow!("stream ended early")),
                Failure::Own => Err(PackError::UnexpectedEnd.into()),
            }
        }

        fn is_supported(&self, format: CompressionFormat) -> bool {
            format != CompressionFormat::Brotli
        }
    }

    #[tokio::test]
    async fn test_round_trip_every_format() {
        let packer: Packer = Packer::default();
        for format in CompressionFormat::ALL {
            if !packer.compressor().is_supported(format) {
                continue;
            }
            let archive = packer.encode_archive(sample(), format).await.unwrap();
            let decoded = packer.decode_archive(&archive, format).await.unwrap();
            assert_eq!(decoded, sample(), "{format}");
        }
    }

    #[tokio::test]
    async fn test_empty_archive() {
        let archive = encode_archive(EntryMap::new(), CompressionFormat::default())
            .await
            .unwrap();
        let decoded = decode_archive(&archive, CompressionFormat::default())
            .await
            .unwrap();
        assert!(decoded.is_empty());
    }

    #[tokio::test]
    async fn test_plain_pairs_input() {
        let archive = encode_archive(vec![("b", "2"), ("a", "1")], CompressionFormat::Gzip)
            .await
            .unwrap();
        let decoded = decode_archive(&archive, CompressionFormat::Gzip).await.unwrap();
        assert_eq!(decoded.paths().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[tokio::test]
    async fn test_text_round_trip() {
        let text = encode_archive_to_text(sample(), CompressionFormat::Deflate)
            .await
            .unwrap();
        assert!(text.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));

        let decoded = decode_archive_from_text(&format!("{text}\n"), CompressionFormat::Deflate)
            .await
            .unwrap();
        assert_eq!(decoded, sample());
    }

    #[tokio::test]
    async fn test_invalid_base64() {
        let err = decode_archive_from_text("not base64 !!!", CompressionFormat::Gzip)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::CorruptedData(_)));
    }

    #[tokio::test]
    async fn test_wrong_format_is_corrupted_data() {
        let archive = encode_archive(sample(), CompressionFormat::Deflate).await.unwrap();
        let err = decode_archive(&archive, CompressionFormat::Gzip).await.unwrap_err();
        assert!(matches!(err, PackError::CorruptedData(_)));
    }

    #[tokio::test]
    async fn test_not_compressed_at_all() {
        let err = decode_archive(b"RUNPACK but not compressed", CompressionFormat::Gzip)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::CorruptedData(_)));
    }

    #[tokio::test]
    async fn test_codec_errors_surface_unchanged() {
        let packer = Packer::new(Arc::new(FakeCompressor { fail_with: Failure::None }));

        let too_long = EntryMap::from([("p".repeat(70_000), Content::from("x"))]);
        assert_eq!(
            packer.encode_archive(too_long, CompressionFormat::Gzip).await.unwrap_err(),
            PackError::PathTooLong(70_000)
        );

        let err = packer
            .decode_archive(b"NOTPACK........", CompressionFormat::Gzip)
            .await
            .unwrap_err();
        assert_eq!(err, PackError::InvalidHeader);
    }

    #[tokio::test]
    async fn test_unsupported_format_passes_through() {
        let packer = Packer::new(Arc::new(FakeCompressor { fail_with: Failure::None }));
        let err = packer
            .encode_archive(sample(), CompressionFormat::Brotli)
            .await
            .unwrap_err();
        assert_eq!(err, PackError::UnsupportedCompression("brotli".into()));
    }

    #[tokio::test]
    async fn test_foreign_failure_becomes_corrupted_data() {
        let packer = Packer::new(Arc::new(FakeCompressor {
            fail_with: Failure::Foreign,
        }));
        let err = packer
            .decode_archive(b"whatever", CompressionFormat::Gzip)
            .await
            .unwrap_err();
        assert_eq!(err, PackError::CorruptedData("stream ended early".into()));
    }

    #[tokio::test]
    async fn test_own_failure_passes_through() {
        let packer = Packer::new(Arc::new(FakeCompressor {
            fail_with: Failure::Own,
        }));
        let err = packer
            .decode_archive(b"whatever", CompressionFormat::Gzip)
            .await
            .unwrap_err();
        assert_eq!(err, PackError::UnexpectedEnd);
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let packer: Packer = Packer::default();
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let packer = packer.clone();
                tokio::spawn(async move {
                    let input =
                        EntryMap::from([(format!("file-{i}.txt"), Content::from(i.to_string()))]);
                    let archive = packer
                        .encode_archive(input.clone(), CompressionFormat::Gzip)
                        .await?;
                    let decoded = packer.decode_archive(&archive, CompressionFormat::Gzip).await?;
                    Ok::<_, PackError>(decoded == input)
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }
    }
}
