//! Lookup key for descriptor caches.

use std::fmt;

use crate::classfile::types::GenericType;

/// `(type, optional name)` key. Equality and hashing are structural, so
/// a key built for a lookup matches the key built at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorKey {
    ty: GenericType,
    name: Option<String>,
}

impl DescriptorKey {
    /// Type-only key.
    pub fn of(ty: GenericType) -> Self {
        Self { ty, name: None }
    }

    /// Type and name key.
    pub fn of_named(ty: GenericType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: Some(name.into()),
        }
    }

    pub fn ty(&self) -> &GenericType {
        &self.ty
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", self.ty, name),
            None => write!(f, "{}", self.ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn named_and_unnamed_keys_differ() {
        let ty = GenericType::class("com.acme.Gateway");
        let typed = DescriptorKey::of(ty.clone());
        let named = DescriptorKey::of_named(ty.clone(), "gateway");
        assert_ne!(typed, named);
        assert_eq!(named, DescriptorKey::of_named(ty, "gateway"));
        assert_eq!(named.to_string(), "com.acme.Gateway gateway");
    }

    #[test]
    fn generic_arguments_participate_in_hashing() {
        let strings = GenericType::parameterized("java.util.List", vec![GenericType::class("java.lang.String")]);
        let raw = GenericType::class("java.util.List");
        let set: HashSet<_> = [DescriptorKey::of(strings), DescriptorKey::of(raw)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
