use clap::Parser;
use std::path::Path;

use crate::compress::CompressionFormat;
use crate::io::HttpSource;

#[derive(Parser, Debug)]
#[command(name = "runpack")]
#[command(version)]
#[command(about = "Pack text and binary files into a single compressed archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  runpack -c site.rpk.gz index.html logo.png   create an archive from two files\n  \
  runpack -l site.rpk.gz                       list entries\n  \
  runpack site.rpk.gz -d out                   extract everything into out/\n  \
  runpack -p site.rpk.gz index.html | more     send one entry to stdout\n  \
  runpack -l https://example.com/site.rpk.br   list a remote archive")]
pub struct Cli {
    /// Archive file path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Files to pack with -c, or entries to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Create ARCHIVE from FILES
    #[arg(short = 'c', conflicts_with_all = ["list", "verbose", "pipe", "extract_dir"])]
    pub create: bool,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely (size and kind of each entry)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract entries to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract entries into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude entries that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Compression format: gzip, brotli or deflate (default: from extension, else gzip)
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<CompressionFormat>,

    /// Compression level used with -c, 0 (fastest) to 9 (smallest)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: Option<u32>,

    /// Archive is base64 text instead of raw bytes
    #[arg(short = 't')]
    pub text: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        HttpSource::is_http_url(&self.archive)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Compression format to use: explicit flag, then archive extension, then gzip
    pub fn compression_format(&self) -> CompressionFormat {
        if let Some(format) = self.format {
            return format;
        }

        // "site.rpk.gz.b64" style names carry the format one extension earlier
        let path = Path::new(&self.archive);
        let path = if self.text && path.extension().is_some_and(|e| e == "b64" || e == "txt") {
            path.file_stem().map(Path::new).unwrap_or(path)
        } else {
            path
        };

        CompressionFormat::from_extension(path).unwrap_or_default()
    }
}
