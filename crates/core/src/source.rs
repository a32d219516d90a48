//! Source provider abstraction for filesystem-independent compilation.
//!
//! The [`SourceProvider`] trait abstracts reading the script and the local
//! media files it references, so the compiler and the media resolvers can
//! run against an in-memory tree in tests.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Trait that abstracts file I/O for compilation and local media.
pub trait SourceProvider: Send + Sync {
    /// Read the script text at `path`.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Read the raw bytes of a local media file.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error>;

    /// Resolve a media reference relative to the script's directory.
    fn resolve(&self, base: &Path, reference: &str) -> PathBuf {
        normalize_path(&base.join(reference))
    }
}

/// Default provider backed by `std::fs`.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        std::fs::read(path)
    }
}

/// In-memory provider for tests. Keys are normalized paths.
#[derive(Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(normalize_path(path.as_ref()), contents.into());
        self
    }

    fn get(&self, path: &Path) -> Result<&Vec<u8>, std::io::Error> {
        let normalized = normalize_path(path);
        self.files.get(&normalized).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let bytes = self.get(path)?;
        String::from_utf8(bytes.clone())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        self.get(path).cloned()
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty() {
                    components.pop();
                }
            }
            other => components.push(other),
        }
    }
    components.iter().collect()
}
