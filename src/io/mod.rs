mod file;
mod http;
mod local;

pub use file::{read_archive_file, write_archive_file};
pub use http::HttpSource;
pub use local::LocalFileSource;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for places an archive can be loaded from
///
/// Archives are only valid as complete buffers, so sources always hand back
/// the whole thing.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Fetch the complete archive bytes
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Short description for messages, usually the path or URL
    fn describe(&self) -> &str;
}
