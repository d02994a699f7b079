/*!
# Download sinks

Where converted files end up. The CLI writes into a directory; the service
and tests can collect files in memory instead.
*/

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{ConvertError, ConvertResult};

/// A generated file ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Destination for generated downloads
pub trait DownloadSink {
    /// Save the file and return where it landed
    fn save(&self, file: &OutputFile) -> ConvertResult<PathBuf>;
}

/// Writes files into a directory, creating it on first use.
///
/// Existing files are never replaced: like a browser download, a clash
/// gets a ` (1)`, ` (2)`, ... suffix before the extension.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file: &OutputFile) -> ConvertResult<PathBuf> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| ConvertError::write(&self.dir, e))?;
        }

        let target = unique_path(&self.dir, &file.filename);
        fs::write(&target, &file.bytes).map_err(|e| ConvertError::write(&target, e))?;

        tracing::info!(
            "Saved {} ({} bytes, {})",
            target.display(),
            file.bytes.len(),
            file.mime
        );
        Ok(target)
    }
}

fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    };
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{} ({}){}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Keeps saved files in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    files: RefCell<Vec<OutputFile>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<OutputFile> {
        self.files.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, file: &OutputFile) -> ConvertResult<PathBuf> {
        self.files.borrow_mut().push(file.clone());
        Ok(PathBuf::from(&file.filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::encoding::CSV_MIME;
    use tempfile::TempDir;

    fn sample() -> OutputFile {
        OutputFile {
            filename: "data_utf8sig.csv".to_string(),
            mime: CSV_MIME,
            bytes: b"\xEF\xBB\xBFa,b\n".to_vec(),
        }
    }

    #[test]
    fn test_directory_sink_creates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("converted");
        let sink = DirectorySink::new(&out_dir);

        let saved = sink.save(&sample()).unwrap();
        assert_eq!(saved, out_dir.join("data_utf8sig.csv"));
        assert_eq!(fs::read(saved).unwrap(), sample().bytes);
    }

    #[test]
    fn test_directory_sink_keeps_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("data_utf8sig.csv");
        fs::write(&existing, b"original").unwrap();
        fs::write(temp_dir.path().join("data_utf8sig (1).csv"), b"older copy").unwrap();

        let sink = DirectorySink::new(temp_dir.path());
        let saved = sink.save(&sample()).unwrap();

        assert_eq!(saved, temp_dir.path().join("data_utf8sig (2).csv"));
        assert_eq!(fs::read(&existing).unwrap(), b"original");
        assert_eq!(fs::read(saved).unwrap(), sample().bytes);
    }

    #[test]
    fn test_unique_path_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("export"), b"x").unwrap();
        assert_eq!(
            unique_path(temp_dir.path(), "export"),
            temp_dir.path().join("export (1)")
        );
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.save(&sample()).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.files()[0].filename, "data_utf8sig.csv");
    }
}
