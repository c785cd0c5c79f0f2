//! Source file discovery
//!
//! Each logical dataset is a family of files matched by a filename pattern
//! inside one archive directory. A missing directory or an empty match is not
//! an error; the dataset simply contributes nothing.

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// List files in `dir` whose names match the glob `pattern`.
///
/// Results are sorted by path. Later files win when two files supply the
/// same key, so this order is part of the merge semantics.
pub fn scan(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    if !dir.is_dir() {
        debug!("Skipping {}: directory not present", dir.display());
        return Vec::new();
    }

    let Some(dir_text) = dir.to_str() else {
        warn!("Skipping {}: path is not valid UTF-8", dir.display());
        return Vec::new();
    };

    // Directory names such as "Oxygen Saturation (SpO2)" must match literally
    let full_pattern = Path::new(&glob::Pattern::escape(dir_text)).join(pattern);
    let full_pattern = full_pattern.to_string_lossy();

    let mut files: Vec<PathBuf> = match glob::glob(&full_pattern) {
        Ok(paths) => paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            warn!("Invalid file pattern {}: {}", full_pattern, e);
            Vec::new()
        }
    };

    files.sort();
    debug!("Pattern {} matched {} files", full_pattern, files.len());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_sorts_matches() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["steps_2025-02.csv", "steps_2025-01.csv", "calories_2025-01.csv"] {
            fs::write(tmp.path().join(name), "timestamp,steps\n").unwrap();
        }

        let files = scan(tmp.path(), "steps_*.csv");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["steps_2025-01.csv", "steps_2025-02.csv"]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan(&tmp.path().join("absent"), "*.csv").is_empty());
        assert!(scan(tmp.path(), "nothing_*.csv").is_empty());
    }

    #[test]
    fn test_scan_dir_with_glob_characters() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("Oxygen [SpO2] (daily)");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("Daily SpO2 - 2025-01-01.csv"), "timestamp\n").unwrap();
        fs::create_dir(dir.join("Daily SpO2 - nested.csv")).unwrap();

        let files = scan(&dir, "Daily SpO2 - *.csv");
        assert_eq!(files.len(), 1);
    }
}
