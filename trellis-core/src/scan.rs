// Recursive source-directory scanner

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Enumerate files with a given extension under a set of directories,
/// recursively. Used to verify bundle source trees and to list
/// candidate source files for a manifest.
pub fn scan_sources<P: AsRef<Path>>(dirs: &[P], extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for dir in dirs {
        walk(dir.as_ref(), extension, &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, extension, found)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trellis-scan-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested")).unwrap();
        dir
    }

    #[test]
    fn test_scan_finds_nested_files() {
        let dir = scratch_dir("nested");
        fs::write(dir.join("a.rs"), "").unwrap();
        fs::write(dir.join("nested/b.rs"), "").unwrap();
        fs::write(dir.join("ignore.txt"), "").unwrap();

        let files = scan_sources(&[&dir], "rs").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "rs"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = scratch_dir("empty");
        assert!(scan_sources(&[&dir], "rs").unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_missing_dir_errors() {
        let missing = PathBuf::from("/nonexistent/trellis/scan");
        assert!(scan_sources(&[&missing], "rs").is_err());
    }
}
