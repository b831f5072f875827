//! Class-file sources: where class bytes come from.

use std::fmt;
use std::path::{Path, PathBuf};

use testify_core::errors::ClassFileError;
use testify_core::types::collections::FxHashMap;

use crate::classfile::reader::parse;
use crate::classfile::types::binary_to_internal;

/// A provider of raw class-file bytes keyed by binary class name.
pub trait ClassSource: Send + Sync + fmt::Debug {
    /// Bytes for `binary_name` (`com.acme.Foo`), or `None` when absent.
    fn load(&self, binary_name: &str) -> Option<Vec<u8>>;
}

/// Class files held in memory. Used by tests and embedders that generate
/// classes on the fly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClassSource {
    classes: FxHashMap<String, Vec<u8>>,
}

impl InMemoryClassSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under an explicit name.
    pub fn insert(&mut self, binary_name: impl Into<String>, bytes: Vec<u8>) {
        self.classes.insert(binary_name.into(), bytes);
    }

    /// Register bytes under the name found in the class header.
    pub fn add(&mut self, bytes: Vec<u8>) -> Result<String, ClassFileError> {
        let name = parse(&bytes)?.name;
        self.classes.insert(name.clone(), bytes);
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassSource for InMemoryClassSource {
    fn load(&self, binary_name: &str) -> Option<Vec<u8>> {
        self.classes.get(binary_name).cloned()
    }
}

/// A directory of `.class` files laid out by package.
#[derive(Debug, Clone)]
pub struct DirectoryClassSource {
    root: PathBuf,
}

impl DirectoryClassSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, binary_name: &str) -> PathBuf {
        self.root
            .join(format!("{}.class", binary_to_internal(binary_name)))
    }
}

impl ClassSource for DirectoryClassSource {
    fn load(&self, binary_name: &str) -> Option<Vec<u8>> {
        let path = self.path_for(binary_name);
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable class file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::ClassWriter;

    #[test]
    fn in_memory_add_uses_header_name() {
        let mut source = InMemoryClassSource::new();
        let name = source
            .add(ClassWriter::new("com.acme.Greeter").to_bytes())
            .unwrap();
        assert_eq!(name, "com.acme.Greeter");
        assert!(source.load("com.acme.Greeter").is_some());
        assert!(source.load("com.acme.Other").is_none());
    }

    #[test]
    fn directory_source_maps_packages_to_paths() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("com/acme");
        std::fs::create_dir_all(&pkg).unwrap();
        let bytes = ClassWriter::new("com.acme.Outer$Inner").to_bytes();
        std::fs::write(pkg.join("Outer$Inner.class"), &bytes).unwrap();

        let source = DirectoryClassSource::new(dir.path());
        assert_eq!(source.load("com.acme.Outer$Inner"), Some(bytes));
        assert_eq!(source.load("com.acme.Missing"), None);
    }
}
