//! Native method bodies: Rust closures standing in for bytecode.

use std::fmt;
use std::sync::Arc;

use testify_core::types::collections::FxHashMap;

use super::heap::{ObjectId, Value};
use super::Runtime;

/// A method body. Receives the runtime, the receiver (`None` for static
/// methods) and the arguments. `Err` carries the failure message.
pub type NativeFn =
    Arc<dyn Fn(&mut Runtime, Option<ObjectId>, &[Value]) -> Result<Value, String> + Send + Sync>;

/// Identity of a method body: declaring class, name, JVM descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub class: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodKey {
    pub fn new(class: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// Registration table for native bodies. Constructor bodies use `<init>`.
#[derive(Clone, Default)]
pub struct NativeRegistry {
    methods: FxHashMap<MethodKey, NativeFn>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a body, replacing any previous one for the same key.
    pub fn bind<F>(&mut self, key: MethodKey, body: F)
    where
        F: Fn(&mut Runtime, Option<ObjectId>, &[Value]) -> Result<Value, String>
            + Send
            + Sync
            + 'static,
    {
        self.methods.insert(key, Arc::new(body));
    }

    pub fn lookup(&self, class: &str, name: &str, descriptor: &str) -> Option<NativeFn> {
        self.methods
            .get(&MethodKey::new(class, name, descriptor))
            .cloned()
    }

    pub fn contains(&self, class: &str, name: &str, descriptor: &str) -> bool {
        self.methods
            .contains_key(&MethodKey::new(class, name, descriptor))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for NativeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRegistry")
            .field("methods", &self.methods.len())
            .finish()
    }
}
