use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Image extensions picked up when a batch input is a directory
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tif", "tiff"];

// @struct: One piece of a natural sort key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyChunk {
    // Case-folded text between digit runs
    Text(String),
    // Digit run without leading zeros; shorter means smaller
    Number { len: usize, digits: String },
}

// @returns: Alternating text/number chunks, always starting with text
fn natural_key(s: &str) -> Vec<KeyChunk> {
    let mut key = Vec::new();
    let mut last = 0;
    for m in DIGIT_RUN.find_iter(s) {
        key.push(KeyChunk::Text(s[last..m.start()].to_lowercase()));
        let digits = m.as_str().trim_start_matches('0');
        key.push(KeyChunk::Number {
            len: digits.len(),
            digits: digits.to_string(),
        });
        last = m.end();
    }
    key.push(KeyChunk::Text(s[last..].to_lowercase()));
    key
}

/// Compare two strings treating digit runs by numeric value
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Stable natural sort of paths, so `page2` comes before `page10`
pub fn natural_sort(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut keyed: Vec<(Vec<KeyChunk>, &PathBuf)> = paths
        .iter()
        .map(|p| (natural_key(&p.to_string_lossy()), p))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, p)| p.clone()).collect()
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Whether the path has a known image extension
    pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Find image files in a directory (recursive)
    pub fn find_images<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
        WalkDir::new(dir.as_ref())
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file() && Self::is_image_file(path))
            .collect()
    }

    /// Replace directory inputs by the images they contain; anything else passes through
    pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut expanded = Vec::new();
        for input in inputs {
            if Self::dir_exists(input) {
                expanded.extend(Self::find_images(input));
            } else {
                expanded.push(input.clone());
            }
        }
        expanded
    }
}
