use std::fmt;
use std::sync::Arc;

use apollo_compiler::Name;

use super::default_handlers::EnumValueUnion;
use super::default_handlers::FieldUnion;
use super::default_handlers::IdenticalScalar;
use super::default_handlers::UnionMemberUnion;
use crate::error::MergeConflict;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;

/// One schema's definition of a type that several schemas define.
#[derive(Debug, Clone, Copy)]
pub struct MergeCandidate<'a> {
    /// The name of the schema the definition comes from.
    pub schema: &'a str,
    pub definition: &'a TypeDefinition,
}

/// Combines same-named type definitions from several schemas into one.
///
/// Handlers are registered for a [`TypeKind`] with a priority. They are only called for groups
/// of two or more candidates that all have that kind, and must return a definition with the
/// same name and kind.
pub trait TypeMergeHandler: Send + Sync {
    fn merge(
        &self,
        type_name: &Name,
        candidates: &[MergeCandidate<'_>],
    ) -> Result<TypeDefinition, MergeConflict>;
}

/// Adapts a closure to [`TypeMergeHandler`].
pub(crate) struct FnHandler<F>(pub(crate) F);

impl<F> TypeMergeHandler for FnHandler<F>
where
    F: Fn(&Name, &[MergeCandidate<'_>]) -> Result<TypeDefinition, MergeConflict> + Send + Sync,
{
    fn merge(
        &self,
        type_name: &Name,
        candidates: &[MergeCandidate<'_>],
    ) -> Result<TypeDefinition, MergeConflict> {
        (self.0)(type_name, candidates)
    }
}

#[derive(Clone)]
struct RegisteredHandler {
    kind: TypeKind,
    priority: i32,
    handler: Arc<dyn TypeMergeHandler>,
}

/// The handlers the merge engine dispatches to, per [`TypeKind`].
///
/// The built-in handlers are registered at [`i32::MIN`], so any user handler registered above
/// that takes over. Among handlers with the same priority the earliest registration wins.
#[derive(Clone)]
pub struct MergeHandlerRegistry {
    handlers: Vec<RegisteredHandler>,
}

impl MergeHandlerRegistry {
    pub const DEFAULT_PRIORITY: i32 = i32::MIN;

    /// A registry holding only the built-in handlers.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: Vec::new(),
        };
        let field_union: Arc<dyn TypeMergeHandler> = Arc::new(FieldUnion);
        for kind in [TypeKind::Object, TypeKind::Interface, TypeKind::InputObject] {
            registry.register(kind, Self::DEFAULT_PRIORITY, field_union.clone());
        }
        registry.register(TypeKind::Enum, Self::DEFAULT_PRIORITY, Arc::new(EnumValueUnion));
        registry.register(TypeKind::Union, Self::DEFAULT_PRIORITY, Arc::new(UnionMemberUnion));
        registry.register(TypeKind::Scalar, Self::DEFAULT_PRIORITY, Arc::new(IdenticalScalar));
        registry
    }

    pub fn register(&mut self, kind: TypeKind, priority: i32, handler: Arc<dyn TypeMergeHandler>) {
        self.handlers.push(RegisteredHandler {
            kind,
            priority,
            handler,
        });
    }

    pub fn register_fn<F>(&mut self, kind: TypeKind, priority: i32, handler: F)
    where
        F: Fn(&Name, &[MergeCandidate<'_>]) -> Result<TypeDefinition, MergeConflict>
            + Send
            + Sync
            + 'static,
    {
        self.register(kind, priority, Arc::new(FnHandler(handler)));
    }

    /// The handler with the highest priority for `kind`.
    pub fn handler_for(&self, kind: TypeKind) -> Option<&dyn TypeMergeHandler> {
        // `max_by_key` keeps the last maximum, so iterating in reverse makes the earliest
        // registration win ties.
        self.handlers
            .iter()
            .rev()
            .filter(|registered| registered.kind == kind)
            .max_by_key(|registered| registered.priority)
            .map(|registered| registered.handler.as_ref())
    }
}

impl Default for MergeHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MergeHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.handlers
                    .iter()
                    .map(|registered| (registered.kind, registered.priority)),
            )
            .finish()
    }
}
