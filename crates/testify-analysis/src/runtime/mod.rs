//! Runtime object model: an arena heap, native method bodies, and dispatch.

pub mod heap;
pub mod natives;

use std::sync::Arc;

use testify_core::constants::STRING_CLASS;
use testify_core::errors::AnalysisError;
use testify_core::types::collections::FxHashMap;

use crate::classfile::descriptor::parse_method_descriptor;
use crate::classfile::reader::MethodInfo;
use crate::classfile::types::{PrimitiveType, TypeRef};
use crate::classpath::{ClassPath, TypeHierarchy};

pub use heap::{Heap, Object, ObjectId, ObjectOrigin, Value};
pub use natives::{MethodKey, NativeFn, NativeRegistry};

/// Heap, native bodies, stubs and the class path for one test execution.
#[derive(Debug)]
pub struct Runtime {
    heap: Heap,
    natives: NativeRegistry,
    class_path: Arc<ClassPath>,
    /// Stubbed results keyed by receiver then method name.
    stubs: FxHashMap<ObjectId, FxHashMap<String, Value>>,
}

impl Runtime {
    pub fn new(class_path: Arc<ClassPath>) -> Self {
        Self::with_natives(class_path, NativeRegistry::new())
    }

    pub fn with_natives(class_path: Arc<ClassPath>, natives: NativeRegistry) -> Self {
        Self {
            heap: Heap::new(),
            natives,
            class_path,
            stubs: FxHashMap::default(),
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn natives(&self) -> &NativeRegistry {
        &self.natives
    }

    pub fn natives_mut(&mut self) -> &mut NativeRegistry {
        &mut self.natives
    }

    pub fn class_path(&self) -> &Arc<ClassPath> {
        &self.class_path
    }

    /// Allocate a real object of `class_name` with every field at its default.
    pub fn instantiate(&mut self, class_name: &str) -> ObjectId {
        self.heap.allocate(class_name, ObjectOrigin::Real)
    }

    /// The object whose slots back `id`. A virtual resolves to its innermost
    /// delegate, so state written through the virtual is what forwarded
    /// calls observe.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this heap.
    pub fn slot_owner(&self, id: ObjectId) -> ObjectId {
        let mut current = id;
        while let ObjectOrigin::Virtual { delegate } = self.heap.object(current).origin() {
            current = delegate;
        }
        current
    }

    /// Stub `method` on a fake or virtual receiver. Stubs match by name.
    pub fn stub(&mut self, receiver: ObjectId, method: impl Into<String>, value: Value) {
        self.stubs.entry(receiver).or_default().insert(method.into(), value);
    }

    pub fn stubbed(&self, receiver: ObjectId, method: &str) -> Option<&Value> {
        self.stubs.get(&receiver)?.get(method)
    }

    /// Whether `value` can be stored in a slot of type `ty`. Primitive values
    /// also fit their wrapper classes and the wrappers' supertypes.
    ///
    /// # Panics
    /// Panics if `value` references an object not issued by this heap.
    pub fn value_fits(&self, ty: &TypeRef, value: &Value) -> bool {
        use PrimitiveType as P;
        match (value, ty) {
            (Value::Null, t) => t.is_reference(),
            (Value::Bool(_), TypeRef::Primitive(P::Boolean)) => true,
            (Value::Char(_), TypeRef::Primitive(P::Char)) => true,
            (Value::Int(_), TypeRef::Primitive(P::Byte | P::Short | P::Int | P::Long)) => true,
            (Value::Float(_), TypeRef::Primitive(P::Float | P::Double)) => true,
            (Value::Bool(_) | Value::Char(_) | Value::Int(_) | Value::Float(_), TypeRef::Class(name)) => {
                let wrappers: &[&str] = match value {
                    Value::Bool(_) => &["java.lang.Boolean"],
                    Value::Char(_) => &["java.lang.Character"],
                    Value::Int(_) => &["java.lang.Byte", "java.lang.Short", "java.lang.Integer", "java.lang.Long"],
                    _ => &["java.lang.Float", "java.lang.Double"],
                };
                wrappers.iter().any(|w| self.class_path.is_subclass_of(w, name))
            }
            (Value::Str(_), TypeRef::Class(name)) => self.class_path.is_subclass_of(STRING_CLASS, name),
            (Value::Ref(id), t) => {
                let class = self.heap.object(*id).class_name();
                self.class_path.is_assignable(t, &TypeRef::class(class))
            }
            _ => false,
        }
    }

    /// Find the first method named `name` taking `arity` arguments, searching
    /// the superclass chain and then the remaining supertypes in name order.
    pub fn resolve_method(
        &self,
        class_name: &str,
        name: &str,
        arity: usize,
    ) -> Result<Option<(String, MethodInfo)>, AnalysisError> {
        let chain = self.class_path.superclass_chain(class_name);
        let mut others: Vec<String> = self
            .class_path
            .supertypes(class_name)
            .iter()
            .filter(|c| !chain.contains(c))
            .cloned()
            .collect();
        others.sort();

        for class in chain.iter().chain(others.iter()) {
            let Some(file) = self.class_path.find_class(class)? else {
                continue;
            };
            for method in file.methods_named(name) {
                let ty = parse_method_descriptor(&method.descriptor).map_err(|source| {
                    AnalysisError::ClassFile {
                        class: class.clone(),
                        source,
                    }
                })?;
                if ty.parameters.len() == arity {
                    return Ok(Some((class.clone(), method.clone())));
                }
            }
        }
        Ok(None)
    }

    /// Call `name` on `receiver`, resolving the descriptor by arity.
    pub fn call(
        &mut self,
        receiver: ObjectId,
        name: &str,
        args: &[Value],
    ) -> Result<Value, AnalysisError> {
        let class_name = self.heap.object(receiver).class_name().to_string();
        match self.resolve_method(&class_name, name, args.len())? {
            Some((declaring, method)) => {
                let ty = parse_method_descriptor(&method.descriptor).map_err(|source| {
                    AnalysisError::ClassFile {
                        class: declaring,
                        source,
                    }
                })?;
                self.dispatch(receiver, name, &method.descriptor, &ty.return_type, args)
            }
            None => {
                if let Some(value) = self.stubbed(receiver, name) {
                    return Ok(value.clone());
                }
                match self.heap.object(receiver).origin() {
                    ObjectOrigin::Virtual { delegate } => self.call(delegate, name, args),
                    _ => Err(AnalysisError::MethodNotFound {
                        method: name.to_string(),
                        class: class_name,
                    }),
                }
            }
        }
    }

    /// Dispatch a resolved instance method by receiver origin.
    ///
    /// Fakes answer with their stub or the return type's default. Virtuals
    /// answer with their stub or forward to the delegate. Real objects run
    /// the first native body found walking up the superclass chain.
    pub fn dispatch(
        &mut self,
        receiver: ObjectId,
        name: &str,
        descriptor: &str,
        return_type: &TypeRef,
        args: &[Value],
    ) -> Result<Value, AnalysisError> {
        let (class_name, origin) = {
            let obj = self.heap.object(receiver);
            (obj.class_name().to_string(), obj.origin())
        };
        if let Some(value) = self.stubbed(receiver, name) {
            return Ok(value.clone());
        }
        match origin {
            ObjectOrigin::Fake => Ok(Value::default_for(return_type)),
            ObjectOrigin::Virtual { delegate } => {
                self.dispatch(delegate, name, descriptor, return_type, args)
            }
            ObjectOrigin::Real => {
                let chain = self.class_path.superclass_chain(&class_name);
                let mut candidates = chain.clone();
                let mut others: Vec<String> = self
                    .class_path
                    .supertypes(&class_name)
                    .iter()
                    .filter(|c| !chain.contains(c))
                    .cloned()
                    .collect();
                others.sort();
                candidates.extend(others);

                for class in &candidates {
                    if let Some(body) = self.natives.lookup(class, name, descriptor) {
                        return self.run(body, class, name, Some(receiver), args);
                    }
                }
                Err(AnalysisError::MethodNotBound {
                    method: format!("{name}{descriptor}"),
                    declaring_class: class_name,
                })
            }
        }
    }

    /// Run a static method body.
    pub fn invoke_static(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
        args: &[Value],
    ) -> Result<Value, AnalysisError> {
        let body = self
            .natives
            .lookup(class, name, descriptor)
            .ok_or_else(|| AnalysisError::MethodNotBound {
                method: format!("{name}{descriptor}"),
                declaring_class: class.to_string(),
            })?;
        self.run(body, class, name, None, args)
    }

    pub(crate) fn run(
        &mut self,
        body: NativeFn,
        class: &str,
        name: &str,
        receiver: Option<ObjectId>,
        args: &[Value],
    ) -> Result<Value, AnalysisError> {
        body(self, receiver, args).map_err(|message| AnalysisError::InvocationFailed {
            method: name.to_string(),
            declaring_class: class.to_string(),
            message,
        })
    }
}
