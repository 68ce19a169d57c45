//! Main entry point for the runpack CLI application.
//!
//! This binary creates archives from files on disk, and lists or extracts
//! archives read from the local filesystem or remote HTTP URLs.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

use runpack::{
    ArchiveSource, Cli, Content, Entry, EntryMap, HttpSource, LocalFileSource, NativeCompressor,
    Packer,
};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to creation, or to listing
/// and extraction from a local file or HTTP URL.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    debug!("Parsed CLI arguments: {:?}", cli);

    if cli.create {
        return create_archive(&cli).await;
    }

    if cli.is_http_url() {
        // Remote archives are fetched in full; the format has no random access
        let source = HttpSource::new(cli.archive.clone())?;
        let entries = load_entries(&source, &cli).await?;

        process_archive(&entries, &cli).await?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            eprintln!(
                "\nTotal bytes transferred: {}",
                format_size(source.transferred_bytes())
            );
        }
    } else {
        let source = LocalFileSource::new(&cli.archive);
        let entries = load_entries(&source, &cli).await?;
        process_archive(&entries, &cli).await?;
    }

    Ok(())
}

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn packer(cli: &Cli) -> Packer {
    let compressor = match cli.level {
        Some(level) => NativeCompressor::with_level(level),
        None => NativeCompressor::new(),
    };
    Packer::new(Arc::new(compressor))
}

/// Create an archive from the files named on the command line.
///
/// Each file is stored under the path exactly as given. Files holding valid
/// UTF-8 are stored as text, everything else as binary.
async fn create_archive(cli: &Cli) -> Result<()> {
    if cli.files.is_empty() {
        bail!("No files to pack");
    }

    let mut entries = EntryMap::with_capacity(cli.files.len());
    for file in &cli.files {
        let data = fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file))?;
        let content = Content::detect(data);

        if !cli.is_quiet() {
            println!("  adding: {} ({})", file, content.kind());
        }
        if entries.insert(file.clone(), content).is_some() {
            debug!(path = %file, "file named twice, keeping the last read");
        }
    }

    let format = cli.compression_format();
    let packer = packer(cli);
    let archive = if cli.text {
        packer.encode_archive_to_text(entries, format).await?.into_bytes()
    } else {
        packer.encode_archive(entries, format).await?
    };

    fs::write(&cli.archive, &archive)
        .await
        .with_context(|| format!("Failed to write {}", cli.archive))?;

    if !cli.is_quiet() {
        println!(
            "  created: {} ({}, {})",
            cli.archive,
            format,
            format_size(archive.len() as u64)
        );
    }

    Ok(())
}

/// Fetch an archive from `source` and decode it.
async fn load_entries(source: &dyn ArchiveSource, cli: &Cli) -> Result<EntryMap> {
    let data = source.fetch().await?;
    let format = cli.compression_format();
    let packer = packer(cli);

    let decoded = if cli.text {
        let text = String::from_utf8(data)
            .with_context(|| format!("{} is not a text archive", source.describe()))?;
        packer.decode_archive_from_text(&text, format).await
    } else {
        packer.decode_archive(&data, format).await
    };

    decoded.with_context(|| format!("Failed to decode {} as {}", source.describe(), format))
}

/// Process a decoded archive based on CLI options.
///
/// - List mode (`-l` or `-v`): Display archive contents
/// - Extract mode: Extract entries matching the specified filters
async fn process_archive(entries: &EntryMap, cli: &Cli) -> Result<()> {
    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        list_entries(entries, cli.verbose);
        return Ok(());
    }

    let to_extract: Vec<_> = entries.iter().filter(|e| is_selected(e, cli)).collect();

    let multiple_entries = cli.pipe && to_extract.len() > 1;
    for entry in to_extract {
        extract_entry(entry, cli, multiple_entries).await?;
    }

    Ok(())
}

/// Whether an entry passes the positional filters and the `-x` exclusions.
fn is_selected(entry: &Entry, cli: &Cli) -> bool {
    // If specific entries are requested, only include those that match
    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, &entry.path)
            } else {
                // No wildcards: exact match on full path or base name
                entry.path == *f || base_name(&entry.path) == f.as_str()
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| entry.path.contains(x.as_str()) || glob_match(x, &entry.path))
}

/// List entries in the archive.
///
/// - Simple format (`-l`): Just paths, one per line
/// - Verbose format (`-v`): Size and kind of each entry, with totals
fn list_entries(entries: &EntryMap, verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.path);
        }
        return;
    }

    println!("{:>10}  {:<6}  Name", "Length", "Kind");
    println!("{}", "-".repeat(40));

    let mut total = 0u64;
    let mut binary_count = 0usize;

    for entry in entries {
        println!(
            "{:>10}  {:<6}  {}",
            entry.content.len(),
            entry.content.kind(),
            entry.path
        );
        total += entry.content.len() as u64;
        if entry.is_binary() {
            binary_count += 1;
        }
    }

    println!("{}", "-".repeat(40));
    println!(
        "{:>10}  {:<6}  {} entries ({} binary)",
        total,
        "",
        entries.len(),
        binary_count
    );
}

/// Extract a single entry.
///
/// Handles pipe mode (`-p`), output directory (`-d`), junk paths (`-j`)
/// and overwrite control (`-n`, `-o`).
async fn extract_entry(entry: &Entry, cli: &Cli, show_name: bool) -> Result<()> {
    if cli.pipe {
        let mut stdout = tokio::io::stdout();
        if show_name {
            stdout
                .write_all(format!("--- {} ---\n", entry.path).as_bytes())
                .await?;
        }
        stdout.write_all(entry.content.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let output_path = output_path(entry, cli);

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.path);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.path);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.path);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(&output_path, entry.content.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    Ok(())
}

/// Where an entry lands on disk, honoring `-d` and `-j`.
fn output_path(entry: &Entry, cli: &Cli) -> PathBuf {
    let name = if cli.junk_paths {
        base_name(&entry.path)
    } else {
        entry.path.as_str()
    };

    match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(name),
        None => PathBuf::from(name),
    }
}

fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// ```ignore
/// assert!(glob_match("*.txt", "readme.txt"));
/// assert!(glob_match("file?.dat", "file1.dat"));
/// assert!(!glob_match("*.txt", "readme.md"));
/// ```
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star matches zero characters, or one more and stays
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
