//! Archive scanning: decide what a sync run has to do.
//!
//! Walks the archive tree once and classifies every entry against the
//! portable mirror: directories that need creating, image files that need
//! copying, and audio files that need converting. Destinations that already
//! exist are skipped, so repeated runs are incremental.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::jobs::Job;

/// File extensions treated as convertible audio (case-insensitive).
pub const AUDIO_EXTENSIONS: [&str; 15] = [
    "wav", "aiff", "wma", "alac", "spx", "wv", "ape", "mp2", "opus", "shn", "flac", "mp3", "au",
    "m4a", "ogg",
];

/// File extensions copied verbatim (album art and scans).
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "tif"];

/// Everything one sync run needs to do, computed up front.
#[derive(Debug, Default)]
pub struct LibraryPlan {
    /// Portable directories that do not exist yet, parents first.
    pub dirs: Vec<PathBuf>,
    /// (source, destination) pairs for images missing from the mirror.
    pub images: Vec<(PathBuf, PathBuf)>,
    /// Conversion jobs for audio files whose destination is missing.
    pub jobs: Vec<Job>,
}

impl LibraryPlan {
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.images.is_empty() && self.jobs.is_empty()
    }
}

fn has_extension_in(path: &Path, table: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            table.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Walks the archive and produces the plan for mirroring it.
pub fn scan_library(config: &CoreConfig) -> CoreResult<LibraryPlan> {
    let mut plan = LibraryPlan::default();
    let out_ext = config.format.extension();

    for entry in WalkDir::new(&config.archive_dir) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(&config.archive_dir)
            .map_err(|_| {
                CoreError::PathError(format!(
                    "'{}' is outside the archive root",
                    entry.path().display()
                ))
            })?;
        if rel.as_os_str().is_empty() {
            continue; // the archive root itself
        }

        if entry.file_type().is_dir() {
            let dest = config.portable_dir.join(rel);
            if !dest.is_dir() {
                plan.dirs.push(dest);
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        if has_extension_in(rel, &AUDIO_EXTENSIONS) {
            let dest = config.portable_dir.join(rel).with_extension(out_ext);
            if !dest.exists() {
                let id = rel.display().to_string();
                let label = id.clone();
                plan.jobs
                    .push(Job::new(id, entry.path().to_path_buf(), dest, label));
            }
        } else if has_extension_in(rel, &IMAGE_EXTENSIONS) {
            let dest = config.portable_dir.join(rel);
            if !dest.exists() {
                plan.images.push((entry.path().to_path_buf(), dest));
            }
        }
        // Anything else in the archive is ignored.
    }

    // Deterministic work order regardless of directory iteration order;
    // lexicographic sorting also keeps parent dirs ahead of children.
    plan.dirs.sort();
    plan.images.sort();
    plan.jobs.sort_by(|a, b| a.id.cmp(&b.id));
    log::debug!(
        "scan: {} dirs to create, {} images to copy, {} files to convert",
        plan.dirs.len(),
        plan.images.len(),
        plan.jobs.len()
    );
    Ok(plan)
}
