//! The type registry.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::language::{self, name};
use crate::tracing_macros::trace;
use crate::{Directive, Graph, MemberRef, TypeDesc, TypeName, TypeRef, Value};

/// Handles to the intrinsic types the engine consults directly.
#[derive(Clone, Debug)]
struct Intrinsics {
    object: TypeRef,
    string: TypeRef,
    integer: TypeRef,
    double: TypeRef,
    boolean: TypeRef,
    ty: TypeRef,
    template: TypeRef,
    type_extension: TypeRef,
}

/// Registry of type descriptors, keyed by qualified name.
///
/// A fresh context already knows the intrinsic language types and directives
/// (see [`language`](crate::language)).
#[derive(Clone, Debug)]
pub struct SchemaContext {
    types: IndexMap<TypeName, TypeRef>,
    directives: Vec<MemberRef>,
    intrinsics: Intrinsics,
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaContext {
    /// A registry holding only the intrinsic types.
    pub fn new() -> Self {
        let types: IndexMap<TypeName, TypeRef> = language::intrinsic_types()
            .into_iter()
            .map(|desc| (desc.name().clone(), Arc::new(desc)))
            .collect();
        let intrinsic = |local: &str| {
            types
                .get(&name(local))
                .cloned()
                .unwrap_or_else(|| Arc::new(TypeDesc::builder(name(local)).build()))
        };
        let intrinsics = Intrinsics {
            object: intrinsic("Object"),
            string: intrinsic("String"),
            integer: intrinsic("Integer"),
            double: intrinsic("Double"),
            boolean: intrinsic("Boolean"),
            ty: intrinsic("Type"),
            template: intrinsic("Template"),
            type_extension: intrinsic("TypeExtension"),
        };

        Self {
            types,
            directives: language::directive_members(),
            intrinsics,
        }
    }

    /// Add a type, replacing any earlier registration under the same name.
    pub fn register(&mut self, desc: TypeDesc) -> TypeRef {
        let ty = Arc::new(desc);
        trace!(ty = %ty.name(), "registered type");
        self.types.insert(ty.name().clone(), ty.clone());
        ty
    }

    /// Look up a type by qualified name.
    pub fn resolve(&self, name: &TypeName) -> Option<TypeRef> {
        self.types.get(name).cloned()
    }

    /// Look up a type by namespace and local name.
    pub fn get(&self, namespace: &str, local: &str) -> Option<TypeRef> {
        self.resolve(&TypeName::new(namespace, local))
    }

    /// The first registered type with local name `local`, intrinsics first.
    pub fn find_unqualified(&self, local: &str) -> Option<TypeRef> {
        self.types
            .values()
            .find(|ty| ty.name().name == local)
            .cloned()
    }

    /// All registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.values()
    }

    /// The member standing for `directive`.
    pub fn directive(&self, directive: Directive) -> &MemberRef {
        &self.directives[directive as usize]
    }

    /// The root type every type derives from.
    pub fn object_type(&self) -> &TypeRef {
        &self.intrinsics.object
    }

    /// Intrinsic text type.
    pub fn string_type(&self) -> &TypeRef {
        &self.intrinsics.string
    }

    /// Intrinsic integer type.
    pub fn integer_type(&self) -> &TypeRef {
        &self.intrinsics.integer
    }

    /// Intrinsic floating point type.
    pub fn double_type(&self) -> &TypeRef {
        &self.intrinsics.double
    }

    /// Intrinsic boolean type.
    pub fn boolean_type(&self) -> &TypeRef {
        &self.intrinsics.boolean
    }

    /// Intrinsic type of type descriptors.
    pub fn type_type(&self) -> &TypeRef {
        &self.intrinsics.ty
    }

    /// Intrinsic type of captured node lists.
    pub fn template_type(&self) -> &TypeRef {
        &self.intrinsics.template
    }

    /// Intrinsic markup extension naming a type.
    pub fn type_extension_type(&self) -> &TypeRef {
        &self.intrinsics.type_extension
    }

    /// The type of `value`. Null and forward references have none.
    pub fn type_of(&self, value: &Value, graph: &Graph) -> Option<TypeRef> {
        match value {
            Value::Null | Value::ForwardRef(_) => None,
            Value::Bool(_) => Some(self.intrinsics.boolean.clone()),
            Value::Int(_) => Some(self.intrinsics.integer.clone()),
            Value::Float(_) => Some(self.intrinsics.double.clone()),
            Value::String(_) => Some(self.intrinsics.string.clone()),
            Value::Type(_) => Some(self.intrinsics.ty.clone()),
            Value::Template(_) => Some(self.intrinsics.template.clone()),
            Value::Object(id) => graph.get(*id).map(|object| object.ty().clone()),
        }
    }

    /// Whether values of `from` may be stored where `to` is expected: `to` is
    /// `Object`, or appears on `from`'s base chain.
    pub fn can_assign(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        if to == &*self.intrinsics.object {
            return true;
        }
        if from.name() == to.name() {
            return true;
        }
        let mut current = from.base().cloned();
        // bounded, in case of a base cycle
        for _ in 0..self.types.len() {
            let Some(name) = current else {
                return false;
            };
            if &name == to.name() {
                return true;
            }
            current = self
                .types
                .get(&name)
                .and_then(|ty| ty.base().cloned());
        }
        false
    }

    /// Whether `value` can be stored where `to` is expected without
    /// conversion.
    pub fn is_assignable(&self, value: &Value, graph: &Graph, to: &TypeDesc) -> bool {
        self.type_of(value, graph)
            .is_some_and(|from| self.can_assign(&from, to))
    }
}
