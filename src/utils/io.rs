//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Read file contents with standardized error handling.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Read raw bytes with standardized error handling.
pub fn read_bytes(path: &Path, operation: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Recursively copy the contents of `source` into `destination`.
///
/// Existing directories are merged and existing files overwritten. Returns the
/// number of files copied.
pub fn copy_dir_contents(source: &Path, destination: &Path) -> Result<usize> {
    fs::create_dir_all(destination).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("create {}", destination.display())),
        )
    })?;

    let entries = fs::read_dir(source).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", source.display())))
    })?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", source.display())))
        })?;
        let path = entry.path();
        let target = destination.join(entry.file_name());

        if path.is_dir() {
            copied += copy_dir_contents(&path, &target)?;
        } else {
            copy_file(&path, &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy a single file, preserving permissions.
pub fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    fs::copy(source, destination).map(|_| ()).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!(
                "copy {} to {}",
                source.display(),
                destination.display()
            )),
        )
    })
}

/// File name and size of an entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
}

/// List every entry directly inside `dir` with its size, sorted by name.
///
/// Returns `Ok(None)` when the directory does not exist. Errors reading any
/// entry are returned, not skipped.
pub fn list_files(dir: &Path) -> Result<Option<Vec<FileEntry>>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let list_error =
        |e: std::io::Error| Error::internal_io(e.to_string(), Some(format!("list {}", dir.display())));

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let metadata = entry.metadata().map_err(list_error)?;
        files.push(FileEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            size: metadata.len(),
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Some(files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "test content").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("test content"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let result = read_file(Path::new("/nonexistent/path.txt"), "test read");
        let err = result.unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn copy_dir_contents_merges_nested_dirs() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::create_dir_all(src.path().join("pkg/lib")).unwrap();
        fs::write(src.path().join("top.txt"), "top").unwrap();
        fs::write(src.path().join("pkg/lib/a.py"), "a").unwrap();

        let input = dst.path().join("input");
        fs::create_dir_all(input.join("pkg")).unwrap();
        fs::write(input.join("pkg/existing.txt"), "keep").unwrap();

        let copied = copy_dir_contents(src.path(), &input).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(input.join("top.txt")).unwrap(), "top");
        assert_eq!(fs::read_to_string(input.join("pkg/lib/a.py")).unwrap(), "a");
        assert_eq!(
            fs::read_to_string(input.join("pkg/existing.txt")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn list_files_sorted_with_sizes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.xlsx"), "12345").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();

        let files = list_files(dir.path()).unwrap().unwrap();
        assert_eq!(
            files,
            vec![
                FileEntry {
                    name: "a.json".to_string(),
                    size: 2
                },
                FileEntry {
                    name: "b.xlsx".to_string(),
                    size: 5
                },
            ]
        );
    }

    #[test]
    fn list_files_includes_subdirectories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let names: Vec<String> = list_files(dir.path())
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["a.json", "nested"]);
    }

    #[test]
    fn list_files_missing_dir_is_none() {
        let dir = tempdir().unwrap();
        assert!(list_files(&dir.path().join("output")).unwrap().is_none());
    }
}
