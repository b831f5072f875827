//! MemberIndex: ordered members plus the type-only and (type, name) caches.

use testify_core::types::collections::{FxHashMap, SmallVec2};

use super::key::DescriptorKey;
use crate::classfile::types::GenericType;
use crate::classpath::TypeHierarchy;

/// A member that can be indexed by generic type and declared name.
pub trait IndexedMember: Clone {
    fn generic_type(&self) -> &GenericType;
    fn declared_name(&self) -> &str;
}

/// Declaration-ordered members with two lookup caches.
///
/// Every member is reachable through `DescriptorKey::of(ty)` and through
/// `DescriptorKey::of_named(ty, declared_name)`. The type-only bucket keeps
/// every member of that type so ambiguity can be detected.
#[derive(Debug, Clone)]
pub struct MemberIndex<D> {
    ordered: Vec<D>,
    by_type: FxHashMap<DescriptorKey, SmallVec2<usize>>,
    by_type_and_name: FxHashMap<DescriptorKey, usize>,
}

impl<D> Default for MemberIndex<D> {
    fn default() -> Self {
        Self {
            ordered: Vec::new(),
            by_type: FxHashMap::default(),
            by_type_and_name: FxHashMap::default(),
        }
    }
}

impl<D: IndexedMember> MemberIndex<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `member` and register it under both keys. A second member with
    /// the same (type, name) key stays in the ordered list and the type-only
    /// bucket, but the named key keeps pointing at the first.
    pub fn insert(&mut self, member: D) {
        let position = self.ordered.len();
        let ty = member.generic_type().clone();
        let named = DescriptorKey::of_named(ty.clone(), member.declared_name());

        self.by_type
            .entry(DescriptorKey::of(ty))
            .or_default()
            .push(position);
        if let Some(existing) = self.by_type_and_name.get(&named) {
            tracing::warn!(
                key = %named,
                kept = *existing,
                ignored = position,
                "duplicate (type, name) key; keeping first declaration"
            );
        } else {
            self.by_type_and_name.insert(named, position);
        }
        self.ordered.push(member);
    }

    /// Members in declaration order.
    pub fn all(&self) -> &[D] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Find by type.
    ///
    /// An exact type-only entry wins when it holds exactly one member. Several
    /// exact members are ambiguous. Without an exact entry, the members whose
    /// type is assignable to `ty` are scanned and a single match is returned.
    pub fn find(&self, ty: &GenericType, hierarchy: &dyn TypeHierarchy) -> Option<&D> {
        if let Some(bucket) = self.by_type.get(&DescriptorKey::of(ty.clone())) {
            return match bucket.as_slice() {
                [only] => self.ordered.get(*only),
                _ => None,
            };
        }

        let mut matches = self
            .ordered
            .iter()
            .filter(|m| hierarchy.is_generic_assignable(ty, m.generic_type()));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Exact (type, declared name) lookup.
    pub fn find_named(&self, ty: &GenericType, name: &str) -> Option<&D> {
        self.by_type_and_name
            .get(&DescriptorKey::of_named(ty.clone(), name))
            .and_then(|&i| self.ordered.get(i))
    }

    /// Members registered under the exact type-only key.
    pub fn exact(&self, ty: &GenericType) -> impl Iterator<Item = &D> {
        self.by_type
            .get(&DescriptorKey::of(ty.clone()))
            .into_iter()
            .flat_map(|bucket| bucket.iter().filter_map(|&i| self.ordered.get(i)))
    }
}
