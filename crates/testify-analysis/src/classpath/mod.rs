//! ClassPath: chained class sources with memoized parsing and hierarchy queries.

pub mod hierarchy;
pub mod source;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use moka::sync::Cache;
use testify_core::config::{AnalysisConfig, ClassPathConfig};
use testify_core::constants::OBJECT_CLASS;
use testify_core::errors::AnalysisError;
use testify_core::types::collections::FxHashSet;

use crate::classfile::reader::{parse, ClassFile};
use crate::classfile::types::TypeRef;

pub use hierarchy::TypeHierarchy;
pub use source::{ClassSource, DirectoryClassSource, InMemoryClassSource};

/// Direct supertypes of common platform classes, used when the platform
/// class itself is not on the class path.
const PLATFORM_SUPERTYPES: &[(&str, &[&str])] = &[
    (
        "java.lang.String",
        &["java.lang.CharSequence", "java.lang.Comparable", "java.io.Serializable"],
    ),
    ("java.lang.Number", &["java.io.Serializable"]),
    ("java.lang.Integer", &["java.lang.Number", "java.lang.Comparable"]),
    ("java.lang.Long", &["java.lang.Number", "java.lang.Comparable"]),
    ("java.lang.Short", &["java.lang.Number", "java.lang.Comparable"]),
    ("java.lang.Byte", &["java.lang.Number", "java.lang.Comparable"]),
    ("java.lang.Double", &["java.lang.Number", "java.lang.Comparable"]),
    ("java.lang.Float", &["java.lang.Number", "java.lang.Comparable"]),
    ("java.lang.Boolean", &["java.io.Serializable", "java.lang.Comparable"]),
    ("java.lang.Character", &["java.io.Serializable", "java.lang.Comparable"]),
    ("java.util.Collection", &["java.lang.Iterable"]),
    ("java.util.List", &["java.util.Collection"]),
    ("java.util.Set", &["java.util.Collection"]),
    ("java.util.AbstractCollection", &["java.util.Collection"]),
    ("java.util.AbstractList", &["java.util.AbstractCollection", "java.util.List"]),
    ("java.util.AbstractSet", &["java.util.AbstractCollection", "java.util.Set"]),
    ("java.util.AbstractMap", &["java.util.Map"]),
    (
        "java.util.ArrayList",
        &["java.util.AbstractList", "java.util.List", "java.util.RandomAccess", "java.lang.Cloneable", "java.io.Serializable"],
    ),
    (
        "java.util.HashSet",
        &["java.util.AbstractSet", "java.util.Set", "java.lang.Cloneable", "java.io.Serializable"],
    ),
    (
        "java.util.HashMap",
        &["java.util.AbstractMap", "java.util.Map", "java.lang.Cloneable", "java.io.Serializable"],
    ),
];

/// An ordered chain of class sources.
///
/// Parsed class files and supertype closures are memoized in moka caches.
/// Classes under a platform package prefix that no source provides resolve
/// as opaque classes whose only supertypes come from a small built-in table.
pub struct ClassPath {
    sources: Vec<Arc<dyn ClassSource>>,
    platform_packages: Vec<String>,
    classes: Cache<String, Option<Arc<ClassFile>>>,
    supertypes: Cache<String, Arc<FxHashSet<String>>>,
}

/// Builder for `ClassPath`.
#[derive(Default)]
pub struct ClassPathBuilder {
    sources: Vec<Arc<dyn ClassSource>>,
    platform_packages: Option<Vec<String>>,
    capacity: Option<u64>,
}

impl ClassPathBuilder {
    pub fn source(mut self, source: impl ClassSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn shared_source(mut self, source: Arc<dyn ClassSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn platform_packages(mut self, packages: Vec<String>) -> Self {
        self.platform_packages = Some(packages);
        self
    }

    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn build(self) -> ClassPath {
        let platform_packages = self
            .platform_packages
            .unwrap_or_else(|| ClassPathConfig::default().effective_platform_packages());
        let (classes, supertypes) = match self.capacity {
            Some(cap) => (
                Cache::builder().max_capacity(cap).build(),
                Cache::builder().max_capacity(cap).build(),
            ),
            None => (Cache::builder().build(), Cache::builder().build()),
        };
        ClassPath {
            sources: self.sources,
            platform_packages,
            classes,
            supertypes,
        }
    }
}

impl ClassPath {
    pub fn builder() -> ClassPathBuilder {
        ClassPathBuilder::default()
    }

    /// Directory sources for every configured root, in order.
    pub fn from_config(class_path: &ClassPathConfig, analysis: &AnalysisConfig) -> Self {
        let mut builder = Self::builder().platform_packages(class_path.effective_platform_packages());
        for root in &class_path.roots {
            builder = builder.source(DirectoryClassSource::new(root.clone()));
        }
        if let Some(cap) = analysis.cache_capacity {
            builder = builder.capacity(cap);
        }
        builder.build()
    }

    /// True when `name` falls under a platform package prefix.
    pub fn is_platform(&self, name: &str) -> bool {
        self.platform_packages.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Parse (once) and return the class file for `name`, or `None` when no
    /// source provides it. Malformed bytes are an error and are not cached.
    pub fn find_class(&self, name: &str) -> Result<Option<Arc<ClassFile>>, AnalysisError> {
        self.classes
            .try_get_with(name.to_string(), || {
                for source in &self.sources {
                    if let Some(bytes) = source.load(name) {
                        let class = parse(&bytes).map_err(|source| AnalysisError::ClassFile {
                            class: name.to_string(),
                            source,
                        })?;
                        tracing::trace!(class = name, "parsed class file");
                        return Ok(Some(Arc::new(class)));
                    }
                }
                Ok(None)
            })
            .map_err(|e: Arc<AnalysisError>| (*e).clone())
    }

    /// Like `find_class`, but a missing class is `ClassNotFound`.
    pub fn load_class(
        &self,
        name: &str,
        referenced_by: &str,
    ) -> Result<Arc<ClassFile>, AnalysisError> {
        self.find_class(name)?.ok_or_else(|| AnalysisError::ClassNotFound {
            class: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    /// Check that a type can be resolved: primitives always, classes when a
    /// source provides them or they are platform classes.
    pub fn resolve_type(&self, ty: &TypeRef, referenced_by: &str) -> Result<(), AnalysisError> {
        match ty {
            TypeRef::Primitive(_) => Ok(()),
            TypeRef::Array(component) => self.resolve_type(component, referenced_by),
            TypeRef::Class(name) => {
                if self.find_class(name)?.is_some() || self.is_platform(name) {
                    Ok(())
                } else {
                    Err(AnalysisError::ClassNotFound {
                        class: name.clone(),
                        referenced_by: referenced_by.to_string(),
                    })
                }
            }
        }
    }

    /// Reflexive, transitive supertypes of `name`, always including
    /// `java.lang.Object`. Unresolvable ancestors contribute only themselves.
    pub fn supertypes(&self, name: &str) -> Arc<FxHashSet<String>> {
        self.supertypes
            .get_with(name.to_string(), || Arc::new(self.compute_supertypes(name)))
    }

    fn compute_supertypes(&self, name: &str) -> FxHashSet<String> {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for parent in self.direct_supertypes(&current) {
                if !seen.contains(&parent) {
                    queue.push_back(parent);
                }
            }
        }
        seen.insert(OBJECT_CLASS.to_string());
        seen
    }

    fn direct_supertypes(&self, name: &str) -> Vec<String> {
        match self.find_class(name) {
            Ok(Some(class)) => class
                .super_name
                .iter()
                .chain(class.interfaces.iter())
                .cloned()
                .collect(),
            Ok(None) => PLATFORM_SUPERTYPES
                .iter()
                .find(|(class, _)| *class == name)
                .map(|(_, parents)| parents.iter().map(|p| p.to_string()).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(class = name, error = %e, "treating malformed ancestor as opaque");
                Vec::new()
            }
        }
    }

    /// The superclass chain of `name`, starting with `name` itself.
    /// Interfaces are not included.
    pub fn superclass_chain(&self, name: &str) -> Vec<String> {
        let mut chain = vec![name.to_string()];
        let mut current = name.to_string();
        while let Ok(Some(class)) = self.find_class(&current) {
            match &class.super_name {
                Some(parent) if !chain.contains(parent) => {
                    chain.push(parent.clone());
                    current = parent.clone();
                }
                _ => break,
            }
        }
        chain
    }

    /// Number of sources in the chain.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl TypeHierarchy for ClassPath {
    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor || ancestor == OBJECT_CLASS || self.supertypes(class).contains(ancestor)
    }
}

impl fmt::Debug for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassPath")
            .field("sources", &self.sources)
            .field("platform_packages", &self.platform_packages)
            .field("cached_classes", &self.classes.entry_count())
            .finish()
    }
}
