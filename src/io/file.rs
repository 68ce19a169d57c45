use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::compress::CompressionFormat;
use crate::pack::{EntryMap, decode_archive, encode_archive};

/// Encode entries and write the archive to `path`.
///
/// Parent directories are created as needed.
pub async fn write_archive_file(
    path: &Path,
    input: impl Into<EntryMap>,
    format: CompressionFormat,
) -> Result<()> {
    let archive = encode_archive(input, format).await?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(&archive).await?;
    file.flush().await?;

    Ok(())
}

/// Read the archive at `path` and decode it
pub async fn read_archive_file(path: &Path, format: CompressionFormat) -> Result<EntryMap> {
    let archive = fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(decode_archive(&archive, format).await?)
}
