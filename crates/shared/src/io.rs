use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::cards;
use crate::models::{ExtractedStory, ExtractionArchive, ARCHIVE_VERSION};

/// Get the default directory for storing extraction archives
pub fn get_default_stories_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("narrative-splitter")
        .join("stories");

    fs::create_dir_all(&data_dir).context("Failed to create stories directory")?;

    Ok(data_dir)
}

/// Default place for downloaded story files
pub fn get_default_output_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn archive_filename(created_at: DateTime<Utc>) -> String {
    format!("stories-{}.json", created_at.format("%Y-%m-%d-%H%M%S-%3f"))
}

/// Save an extraction run to a JSON file in `dir`
pub fn save_archive(data: &ExtractionArchive, dir: &Path, filename: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create stories directory")?;
    let filepath = dir.join(filename);

    let json = serde_json::to_string_pretty(data).context("Failed to serialize story archive")?;

    fs::write(&filepath, json).context("Failed to write story archive")?;

    Ok(filepath)
}

/// Load an extraction run from a JSON file
pub fn load_archive(filepath: &Path) -> Result<ExtractionArchive> {
    if !filepath.exists() {
        anyhow::bail!("Story archive not found: {}", filepath.display());
    }

    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read story archive: {}", filepath.display()))?;

    let data: ExtractionArchive = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse story JSON from {}. The file may be corrupted or not a story archive.",
            filepath.display()
        )
    })?;

    if data.version != ARCHIVE_VERSION {
        anyhow::bail!(
            "Unsupported story archive version: {}. Expected {}. Please re-run split-stories on the source text.",
            data.version,
            ARCHIVE_VERSION
        );
    }

    Ok(data)
}

/// List all archives in `dir`, newest first. Unreadable files are skipped.
pub fn list_archives(dir: &Path) -> Result<Vec<(PathBuf, ExtractionArchive)>> {
    let mut files = Vec::new();

    if dir.exists() {
        for entry in fs::read_dir(dir).context("Failed to read stories directory")? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match load_archive(&path) {
                    Ok(data) => {
                        files.push((path, data));
                    }
                    Err(e) => {
                        tracing::warn!("Could not load {}: {:#}", path.display(), e);
                    }
                }
            }
        }
    }

    // Sort by creation date (newest first)
    files.sort_by(|a, b| {
        let time_a = DateTime::parse_from_rfc3339(&a.1.created_at).ok();
        let time_b = DateTime::parse_from_rfc3339(&b.1.created_at).ok();
        time_b.cmp(&time_a)
    });

    Ok(files)
}

/// Write one story as `{slug}.txt` into `dir`, the same text the copy
/// action produces. Existing files are left alone: a taken name gets a
/// `-2`, `-3`, ... suffix.
pub fn save_story_text(story: &ExtractedStory, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create output directory")?;

    let filename = cards::download_filename(&story.title);
    let stem = filename
        .strip_suffix(".txt")
        .filter(|stem| !stem.is_empty())
        .unwrap_or("story");
    let text = cards::clipboard_text(story);

    let mut attempt = 1;
    loop {
        let filepath = if attempt == 1 {
            dir.join(format!("{}.txt", stem))
        } else {
            dir.join(format!("{}-{}.txt", stem, attempt))
        };

        match OpenOptions::new().write(true).create_new(true).open(&filepath) {
            Ok(mut file) => {
                file.write_all(text.as_bytes()).with_context(|| {
                    format!("Failed to write story file: {}", filepath.display())
                })?;
                return Ok(filepath);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to create story file: {}", filepath.display())
                })
            }
        }
    }
}
