/// File system abstraction.
///
/// Paths always use `/` as separator. `\` is accepted and converted, and
/// leading slashes are ignored, so `"/textures\\hero.png"` and
/// `"textures/hero.png"` name the same file.
///
/// `MemoryFileSystem` keeps files in memory; it backs tests and embedded
/// assets.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::io::data_buffer::DataBuffer;

/// Normalize a path: `/` separators, no leading slash, no empty or `.` segments
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// A file inside a file system
pub trait File {
    /// Normalized path from the root
    fn path(&self) -> &str;

    /// Read the whole file. Returns None if it cannot be read.
    fn load_content(&self) -> Option<DataBuffer>;

    fn can_read(&self) -> bool;

    fn can_write(&self) -> bool;
}

/// A directory inside a file system
pub trait Directory {
    /// Normalized path from the root ("" for the root itself)
    fn path(&self) -> &str;

    /// Find a file relative to this directory
    fn find_file(&self, path: &str) -> Option<Box<dyn File>>;

    /// Find a sub-directory relative to this directory
    fn find_directory(&self, path: &str) -> Option<Box<dyn Directory>>;

    /// Names of the files directly inside this directory
    fn file_names(&self) -> Vec<String>;

    /// Names of the directories directly inside this directory
    fn directory_names(&self) -> Vec<String>;
}

/// Root of a file hierarchy
pub trait FileSystem: Send + Sync {
    fn root_directory(&self) -> Box<dyn Directory>;

    fn find_file(&self, path: &str) -> Option<Box<dyn File>> {
        self.root_directory().find_file(path)
    }

    fn find_directory(&self, path: &str) -> Option<Box<dyn Directory>> {
        self.root_directory().find_directory(path)
    }
}

// ===== MEMORY FILE SYSTEM =====

type FileTable = Arc<RwLock<BTreeMap<String, Arc<[u8]>>>>;

/// In-memory file system
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: FileTable,
    read_only: bool,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// File system whose files report `can_write() == false`
    pub fn read_only() -> Self {
        Self {
            files: FileTable::default(),
            read_only: true,
        }
    }

    /// Add or replace a file
    pub fn insert(&self, path: &str, bytes: impl Into<Arc<[u8]>>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(normalize_path(path), bytes.into());
    }

    pub fn remove(&self, path: &str) -> bool {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(&normalize_path(path)).is_some()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl FileSystem for MemoryFileSystem {
    fn root_directory(&self) -> Box<dyn Directory> {
        Box::new(MemoryDirectory {
            files: self.files.clone(),
            path: String::new(),
            read_only: self.read_only,
        })
    }
}

struct MemoryFile {
    files: FileTable,
    path: String,
    read_only: bool,
}

impl File for MemoryFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn load_content(&self) -> Option<DataBuffer> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(&self.path).cloned().map(DataBuffer::Shared)
    }

    fn can_read(&self) -> bool {
        self.files.read().unwrap_or_else(|e| e.into_inner()).contains_key(&self.path)
    }

    fn can_write(&self) -> bool {
        !self.read_only
    }
}

struct MemoryDirectory {
    files: FileTable,
    path: String,
    read_only: bool,
}

impl MemoryDirectory {
    fn join(&self, path: &str) -> String {
        let relative = normalize_path(path);
        if self.path.is_empty() {
            relative
        } else if relative.is_empty() {
            self.path.clone()
        } else {
            format!("{}/{}", self.path, relative)
        }
    }

    fn prefix(&self) -> String {
        if self.path.is_empty() {
            String::new()
        } else {
            format!("{}/", self.path)
        }
    }

    /// Relative paths of every file below this directory
    fn entries_below(&self) -> Vec<String> {
        let prefix = self.prefix();
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect()
    }
}

impl Directory for MemoryDirectory {
    fn path(&self) -> &str {
        &self.path
    }

    fn find_file(&self, path: &str) -> Option<Box<dyn File>> {
        let full = self.join(path);
        let exists = self.files.read().unwrap_or_else(|e| e.into_inner()).contains_key(&full);
        exists.then(|| {
            Box::new(MemoryFile {
                files: self.files.clone(),
                path: full,
                read_only: self.read_only,
            }) as Box<dyn File>
        })
    }

    fn find_directory(&self, path: &str) -> Option<Box<dyn Directory>> {
        let full = self.join(path);
        let prefix = format!("{}/", full);
        let exists = full.is_empty()
            || self
                .files
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .keys()
                .any(|key| key.starts_with(&prefix));
        exists.then(|| {
            Box::new(MemoryDirectory {
                files: self.files.clone(),
                path: full,
                read_only: self.read_only,
            }) as Box<dyn Directory>
        })
    }

    fn file_names(&self) -> Vec<String> {
        self.entries_below()
            .into_iter()
            .filter(|relative| !relative.contains('/'))
            .collect()
    }

    fn directory_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries_below()
            .into_iter()
            .filter_map(|relative| relative.split_once('/').map(|(dir, _)| dir.to_string()))
            .collect();
        names.dedup();
        names
    }
}

#[cfg(test)]
#[path = "file_system_tests.rs"]
mod tests;
