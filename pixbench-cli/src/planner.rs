//! Input Planner
//!
//! Builds the input list for a benchmark by scanning a directory.
//!
//! Filtering:
//! - Only regular files with a supported extension (case-insensitive)
//! - Optional regex matched against the file name
//!
//! Ordering: inputs are sorted by file name for deterministic dispatch.
//!
//! Two inputs whose output names would coincide (`a.JPG` and `a.jpg` both
//! produce `a_<backend>_<size>.jpg`) cannot both be benchmarked; the first in
//! order is kept and the others are returned as conflicts.

use pixbench_core::format_token;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One eligible input image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    /// Full path
    pub path: PathBuf,
    /// File name without directory
    pub file_name: String,
    /// Lower-case extension token the image is benchmarked as
    pub format: String,
}

/// An input left out because another input claims the same output names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConflict {
    /// The input that was left out
    pub input: InputImage,
    /// File name of the input that was kept
    pub kept: String,
}

/// Inputs selected for a benchmark
#[derive(Debug, Clone, Default)]
pub struct InputPlan {
    /// Inputs to dispatch, ordered by file name
    pub inputs: Vec<InputImage>,
    /// Inputs excluded by an output-name collision
    pub conflicts: Vec<InputConflict>,
}

impl InputPlan {
    /// Whether there is nothing to dispatch or report
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.conflicts.is_empty()
    }
}

/// The input directory could not be listed
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Directory does not exist
    #[error("input directory not found: {0}")]
    NotFound(PathBuf),
    /// Path exists but is not a directory
    #[error("input path is not a directory: {0}")]
    NotADirectory(PathBuf),
    /// Listing failed
    #[error("failed to list {path}: {source}")]
    Io {
        /// Directory being listed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Scan `dir` for supported images
pub fn discover_inputs(dir: &Path, filter: Option<&Regex>) -> Result<InputPlan, DiscoveryError> {
    let metadata = fs::metadata(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DiscoveryError::NotFound(dir.to_path_buf()),
        _ => DiscoveryError::Io {
            path: dir.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_dir() {
        return Err(DiscoveryError::NotADirectory(dir.to_path_buf()));
    }

    let io_err = |source: std::io::Error| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        // Follows symlinks; dangling links and subdirectories are ignored
        if !path.is_file() {
            continue;
        }
        let Some(format) = format_token(&path) else {
            continue;
        };
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(re) = filter {
            if !re.is_match(&file_name) {
                continue;
            }
        }
        candidates.push(InputImage {
            path,
            file_name,
            format,
        });
    }

    Ok(build_plan(candidates))
}

/// Order candidates and split off output-name collisions
pub fn build_plan(mut candidates: Vec<InputImage>) -> InputPlan {
    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let mut claimed: HashMap<(String, String), String> = HashMap::new();
    let mut plan = InputPlan::default();

    for input in candidates {
        let stem = input
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = (stem, input.format.clone());
        match claimed.get(&key) {
            Some(kept) => plan.conflicts.push(InputConflict {
                input,
                kept: kept.clone(),
            }),
            None => {
                claimed.insert(key, input.file_name.clone());
                plan.inputs.push(input);
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_filters_extensions_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.png", "a.JPG", "notes.txt", "b.webp", "d.bmp", "e.jpeg", "f"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let plan = discover_inputs(dir.path(), None).unwrap();
        let names: Vec<_> = plan.inputs.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.JPG", "b.webp", "c.png", "d.bmp", "e.jpeg"]);
        assert_eq!(plan.inputs[0].format, "jpg");
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_regex_filter() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["photo1.png", "photo2.jpg", "scan.png"] {
            touch(dir.path(), name);
        }
        let re = Regex::new("^photo").unwrap();
        let plan = discover_inputs(dir.path(), Some(&re)).unwrap();
        assert_eq!(plan.inputs.len(), 2);
        assert!(plan.inputs.iter().all(|i| i.file_name.starts_with("photo")));
    }

    #[test]
    fn test_output_collisions_become_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "a.JPG", "a.jpeg", "a.png"] {
            touch(dir.path(), name);
        }

        let plan = discover_inputs(dir.path(), None).unwrap();
        let names: Vec<_> = plan.inputs.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.JPG", "a.jpeg", "a.png"]);
        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.conflicts[0].input.file_name, "a.jpg");
        assert_eq!(plan.conflicts[0].kept, "a.JPG");
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let plan = discover_inputs(dir.path(), None).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_inputs(&missing, None),
            Err(DiscoveryError::NotFound(_))
        ));

        let file = dir.path().join("file.png");
        touch(dir.path(), "file.png");
        assert!(matches!(
            discover_inputs(&file, None),
            Err(DiscoveryError::NotADirectory(_))
        ));
    }
}
