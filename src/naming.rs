//! Output filenames: prompt-derived stems and collision-free paths.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::constants::{FALLBACK_STEM, MAX_FILENAME_LEN};
use crate::error::NanobananaError;

#[allow(clippy::unwrap_used)]
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
#[allow(clippy::unwrap_used)]
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turns a prompt into a filesystem-safe stem.
///
/// `"A banana in space!"` becomes `"a_banana_in_space"`. Never empty.
pub fn prompt_stem(prompt: &str) -> String {
    let lowered = prompt.trim().to_lowercase();
    let cleaned = UNSAFE_CHARS.replace_all(&lowered, "");
    let joined = WHITESPACE_RUNS.replace_all(&cleaned, "_");
    let name = joined.trim_matches('_');
    if name.is_empty() {
        return FALLBACK_STEM.to_string();
    }
    // only ascii survives the filter, so byte and char counts agree
    name.chars().take(MAX_FILENAME_LEN).collect()
}

/// Creates `dir` and its parents if needed.
pub fn ensure_output_dir(dir: &Path) -> Result<(), NanobananaError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Claims the first free path among `<stem>.<ext>`, `<stem>_1.<ext>`,
/// `<stem>_2.<ext>`, ... inside `dir`.
///
/// Each candidate is created with `create_new`, so checking and claiming is a
/// single filesystem operation and two processes can't end up with the same
/// file. The returned handle points at the freshly created, empty file.
pub fn reserve_path(dir: &Path, stem: &str, ext: &str) -> Result<(PathBuf, File), NanobananaError> {
    ensure_output_dir(dir)?;
    let mut counter: usize = 0;
    loop {
        let name = match counter {
            0 => format!("{stem}.{ext}"),
            n => format!("{stem}_{n}.{ext}"),
        };
        let candidate = dir.join(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => {
                debug!("Claimed {}", candidate.display());
                return Ok((candidate, file));
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => counter += 1,
            Err(err) => return Err(err.into()),
        }
    }
}

/// Where the images of one run are written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OutputTarget {
    /// Named after the prompt inside an output directory.
    Auto {
        /// Output directory
        dir: PathBuf,
        /// Stem from [`prompt_stem`]
        stem: String,
        /// Extension without the dot
        ext: String,
    },
    /// A path the user asked for.
    Explicit(PathBuf),
}

impl OutputTarget {
    /// Auto-naming keyed off `prompt`.
    pub fn auto(dir: &Path, prompt: &str, ext: &str) -> Self {
        Self::Auto {
            dir: dir.to_path_buf(),
            stem: prompt_stem(prompt),
            ext: ext.to_string(),
        }
    }

    /// An explicit path; its parent directories are created.
    pub fn explicit(path: PathBuf) -> Result<Self, NanobananaError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_output_dir(parent)?;
        }
        Ok(Self::Explicit(path))
    }

    /// Extension every claimed path will carry, if any.
    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::Auto { ext, .. } => Some(ext),
            Self::Explicit(path) => path.extension().and_then(|ext| ext.to_str()),
        }
    }

    /// Opens the file for the `index`th image of the response.
    ///
    /// Auto-named targets claim a fresh collision-free path every time. An
    /// explicit path takes the first image as-is, later images are claimed as
    /// numbered siblings of it.
    pub fn claim(&self, index: usize) -> Result<(PathBuf, File), NanobananaError> {
        match self {
            Self::Auto { dir, stem, ext } => reserve_path(dir, stem, ext),
            Self::Explicit(path) if index == 0 => Ok((path.clone(), File::create(path)?)),
            Self::Explicit(path) => {
                let dir = path.parent().unwrap_or(Path::new(""));
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| FALLBACK_STEM.to_string());
                let ext = path
                    .extension()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "png".to_string());
                reserve_path(dir, &stem, &ext)
            }
        }
    }
}
