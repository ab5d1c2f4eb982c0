use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use url::Url;

use crate::HashMap;

/// Identifies one loaded source buffer.
///
/// Ids are handed out in load order, so `a <= b` means buffer `a` was
/// introduced no later than buffer `b`. Transactions use this ordering to
/// bound which cached buffers may be invalidated on rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A location in a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub file: FileId,
    pub offset: u32,
}

impl Loc {
    pub fn new(file: FileId, offset: u32) -> Self {
        Loc { file, offset }
    }

    /// The location of entities that were not spelled in any buffer.
    pub fn builtin() -> Self {
        Loc { file: FileId(0), offset: 0 }
    }
}

#[derive(Error, Diagnostic, Debug, Clone)]
pub enum SourceError {
    #[error("File not found: {0}")]
    FileNotFound(Url),
    #[error("Unknown file id: {0:?}")]
    UnknownFile(FileId),
    #[error("IO error: {0}")]
    Io(#[from] Arc<std::io::Error>),
}

/// Where source text comes from (file system or in-memory).
pub trait FileSource {
    /// Check if a file with the given URI exists
    fn exists(&mut self, uri: &Url) -> Result<bool, SourceError>;
    /// Read the contents of a file with the given URI
    fn read_to_string(&mut self, uri: &Url) -> Result<String, SourceError>;
    /// Write the contents of a file with the given URI
    ///
    /// Depending on the source, this may write to disk or to memory
    fn write_string(&mut self, uri: &Url, source: &str) -> Result<(), SourceError>;
}

/// A file source that keeps files in memory
pub struct InMemorySource {
    files: HashMap<Url, String>,
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySource {
    pub fn new() -> Self {
        Self { files: HashMap::default() }
    }

    pub fn insert(&mut self, uri: Url, source: String) {
        self.files.insert(uri, source);
    }
}

impl FileSource for InMemorySource {
    fn exists(&mut self, uri: &Url) -> Result<bool, SourceError> {
        Ok(self.files.contains_key(uri))
    }

    fn read_to_string(&mut self, uri: &Url) -> Result<String, SourceError> {
        self.files.get(uri).cloned().ok_or_else(|| SourceError::FileNotFound(uri.to_owned()))
    }

    fn write_string(&mut self, uri: &Url, source: &str) -> Result<(), SourceError> {
        self.files.insert(uri.clone(), source.to_string());
        Ok(())
    }
}

/// A file source that reads from and writes to the file system
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn filepath(&self, uri: &Url) -> Result<PathBuf, SourceError> {
        let filepath =
            uri.to_file_path().map_err(|_| SourceError::FileNotFound(uri.to_owned()))?;
        Ok(self.root.join(filepath))
    }
}

impl FileSource for FileSystemSource {
    fn exists(&mut self, uri: &Url) -> Result<bool, SourceError> {
        Ok(self.filepath(uri)?.exists())
    }

    fn read_to_string(&mut self, uri: &Url) -> Result<String, SourceError> {
        let path = self.filepath(uri)?;
        let source = std::fs::read_to_string(&path).map_err(Arc::new).map_err(SourceError::Io)?;
        // Depending on how git is configured on Windows, it may check-out Unix line endings (\n)
        // as Windows line endings (\r\n). To have identical offsets on all platforms, we replace
        // these by Unix line endings (\n).
        let source = source.replace("\r\n", "\n");
        Ok(source)
    }

    fn write_string(&mut self, uri: &Url, source: &str) -> Result<(), SourceError> {
        let path = self.filepath(uri)?;
        std::fs::write(&path, source).map_err(Arc::new).map_err(SourceError::Io)?;
        Ok(())
    }
}

/// One cached source buffer.
struct SourceFile {
    uri: Url,
    content: String,
    size: usize,
}

/// Tracks all loaded source buffers and their cached content.
///
/// A buffer whose cache has been dropped is re-fetched from the
/// underlying [`FileSource`] on the next read, so edits made after a
/// rollback are picked up instead of stale cached text.
pub struct SourceManager {
    source: Box<dyn FileSource>,
    files: Vec<SourceFile>,
    by_uri: HashMap<Url, FileId>,
}

impl SourceManager {
    pub fn new(source: impl FileSource + 'static) -> Self {
        SourceManager { source: Box::new(source), files: Vec::new(), by_uri: HashMap::default() }
    }

    /// Get a mutable reference to the underlying source of the files
    pub fn source_mut(&mut self) -> &mut dyn FileSource {
        &mut *self.source
    }

    /// Load a buffer and cache its content. Interning the same URI twice
    /// returns the id assigned on first load.
    pub fn intern(&mut self, uri: &Url) -> Result<FileId, SourceError> {
        if let Some(&id) = self.by_uri.get(uri) {
            return Ok(id);
        }
        let content = self.source.read_to_string(uri)?;
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile { uri: uri.clone(), size: content.len(), content });
        self.by_uri.insert(uri.clone(), id);
        Ok(id)
    }

    /// The id the next loaded buffer will receive.
    pub fn next_file_id(&self) -> FileId {
        FileId(self.files.len() as u32)
    }

    pub fn uri(&self, id: FileId) -> Option<&Url> {
        self.files.get(id.0 as usize).map(|file| &file.uri)
    }

    /// The cached content of a buffer, re-fetching it if the cache was
    /// dropped.
    pub fn read(&mut self, id: FileId) -> Result<&str, SourceError> {
        let idx = id.0 as usize;
        if idx >= self.files.len() {
            return Err(SourceError::UnknownFile(id));
        }
        if self.files[idx].size == 0 {
            let uri = self.files[idx].uri.clone();
            let content = self.source.read_to_string(&uri)?;
            self.files[idx].size = content.len();
            self.files[idx].content = content;
        }
        Ok(&self.files[idx].content)
    }

    /// Drop the cached content of a buffer and reset its recorded size,
    /// forcing a re-read on the next access.
    pub fn uncache(&mut self, id: FileId) -> bool {
        let Some(file) = self.files.get_mut(id.0 as usize) else {
            return false;
        };
        file.content.clear();
        file.size = 0;
        true
    }

    /// The recorded size of a buffer; zero after [`SourceManager::uncache`].
    pub fn cached_size(&self, id: FileId) -> Option<usize> {
        self.files.get(id.0 as usize).map(|file| file.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn intern_is_idempotent() {
        let mut source = InMemorySource::new();
        source.insert(uri("repl://input/1"), "int i;".to_owned());
        let mut sm = SourceManager::new(source);
        let a = sm.intern(&uri("repl://input/1")).unwrap();
        let b = sm.intern(&uri("repl://input/1")).unwrap();
        assert_eq!(a, b);
        assert_eq!(sm.next_file_id(), FileId(1));
    }

    #[test]
    fn uncache_forces_re_read() {
        let mut source = InMemorySource::new();
        source.insert(uri("repl://input/1"), "old".to_owned());
        let mut sm = SourceManager::new(source);
        let id = sm.intern(&uri("repl://input/1")).unwrap();
        assert_eq!(sm.read(id).unwrap(), "old");

        sm.source_mut().write_string(&uri("repl://input/1"), "new").unwrap();
        // still served from the cache
        assert_eq!(sm.read(id).unwrap(), "old");

        assert!(sm.uncache(id));
        assert_eq!(sm.cached_size(id), Some(0));
        assert_eq!(sm.read(id).unwrap(), "new");
        assert_eq!(sm.cached_size(id), Some(3));
    }

    #[test]
    fn unknown_file_is_an_error() {
        let mut sm = SourceManager::new(InMemorySource::new());
        assert!(matches!(sm.read(FileId(7)), Err(SourceError::UnknownFile(_))));
        assert!(matches!(
            sm.intern(&uri("repl://input/none")),
            Err(SourceError::FileNotFound(_))
        ));
    }
}
