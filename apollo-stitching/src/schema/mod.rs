//! The document model every stage of the pipeline works on.
//!
//! A [`SchemaDocument`] is an index from type name to [`TypeDefinition`]. References between
//! types (field return types, argument types, implements clauses, union members) are plain
//! names looked up against that index, so cyclic type graphs need no special handling and
//! renaming a type is a matter of updating keys.

use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast::DirectiveList;
use apollo_compiler::ast::DirectiveLocation;
use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;
use apollo_compiler::name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use itertools::Itertools;

pub(crate) mod from_ast;
mod print;
pub(crate) mod references;

pub use from_ast::parse_schema;

/// Scalars every GraphQL schema provides, whether or not a document declares them.
pub const BUILT_IN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Directives every GraphQL schema provides. They are never merged or compared across schemas.
pub(crate) const BUILT_IN_DIRECTIVES: [&str; 7] = [
    "skip",
    "include",
    "deprecated",
    "specifiedBy",
    "oneOf",
    "defer",
    "stream",
];

pub(crate) fn is_built_in_scalar(name: &str) -> bool {
    BUILT_IN_SCALARS.contains(&name)
}

pub(crate) fn is_built_in_directive(name: &str) -> bool {
    BUILT_IN_DIRECTIVES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    /// Whether values of this kind may appear in field return position.
    pub fn is_output(self) -> bool {
        !matches!(self, TypeKind::InputObject)
    }

    /// Whether values of this kind may appear in argument and input field position.
    pub fn is_input(self) -> bool {
        matches!(
            self,
            TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject
        )
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "object type",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::InputObject => "input object type",
        })
    }
}

/// One of the three entry points of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootOperation {
    Query,
    Mutation,
    Subscription,
}

impl RootOperation {
    pub const ALL: [RootOperation; 3] = [
        RootOperation::Query,
        RootOperation::Mutation,
        RootOperation::Subscription,
    ];

    /// The type name this root operation uses when a schema does not say otherwise.
    pub fn canonical_type_name(self) -> Name {
        match self {
            RootOperation::Query => name!("Query"),
            RootOperation::Mutation => name!("Mutation"),
            RootOperation::Subscription => name!("Subscription"),
        }
    }
}

impl fmt::Display for RootOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RootOperation::Query => "query",
            RootOperation::Mutation => "mutation",
            RootOperation::Subscription => "subscription",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootOperations {
    pub query: Option<Name>,
    pub mutation: Option<Name>,
    pub subscription: Option<Name>,
}

impl RootOperations {
    pub fn get(&self, operation: RootOperation) -> Option<&Name> {
        match operation {
            RootOperation::Query => self.query.as_ref(),
            RootOperation::Mutation => self.mutation.as_ref(),
            RootOperation::Subscription => self.subscription.as_ref(),
        }
    }

    pub fn get_mut(&mut self, operation: RootOperation) -> &mut Option<Name> {
        match operation {
            RootOperation::Query => &mut self.query,
            RootOperation::Mutation => &mut self.mutation,
            RootOperation::Subscription => &mut self.subscription,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RootOperation, &Name)> {
        RootOperation::ALL
            .into_iter()
            .filter_map(|operation| self.get(operation).map(|name| (operation, name)))
    }

    /// Returns the operation a type is the root of, if any.
    pub fn operation_of(&self, type_name: &str) -> Option<RootOperation> {
        self.iter()
            .find(|(_, name)| name.as_str() == type_name)
            .map(|(operation, _)| operation)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether every root operation uses its canonical type name.
    pub(crate) fn is_canonical(&self) -> bool {
        self.iter()
            .all(|(operation, name)| *name == operation.canonical_type_name())
    }
}

/// A named, self-contained GraphQL type system.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    name: String,
    pub description: Option<Node<str>>,
    pub schema_directives: DirectiveList,
    pub root_operations: RootOperations,
    pub types: IndexMap<Name, TypeDefinition>,
    pub directive_definitions: IndexMap<Name, DirectiveDefinition>,
}

impl SchemaDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema_directives: DirectiveList::default(),
            root_operations: RootOperations::default(),
            types: IndexMap::new(),
            directive_definitions: IndexMap::new(),
        }
    }

    /// The schema name this document was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// The kind of the named type. Built-in scalars resolve even when undeclared.
    pub fn type_kind(&self, name: &str) -> Option<TypeKind> {
        match self.types.get(name) {
            Some(definition) => Some(definition.kind()),
            None if is_built_in_scalar(name) => Some(TypeKind::Scalar),
            None => None,
        }
    }

    pub fn is_root_type(&self, type_name: &str) -> bool {
        self.root_operations.operation_of(type_name).is_some()
    }

    /// Points each root operation that has not been set explicitly at the object type with
    /// its canonical name, if the document defines one.
    pub(crate) fn infer_root_operations(&mut self) {
        for operation in RootOperation::ALL {
            let canonical = operation.canonical_type_name();
            let slot = self.root_operations.get_mut(operation);
            if slot.is_none()
                && self
                    .types
                    .get(&canonical)
                    .is_some_and(|ty| ty.kind() == TypeKind::Object)
            {
                *slot = Some(canonical);
            }
        }
    }

    /// Prints the document as SDL.
    pub fn to_sdl(&self) -> String {
        self.to_ast().to_string()
    }
}

/// A named type, owned by the document that defines it.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: Name,
    pub description: Option<Node<str>>,
    pub directives: DirectiveList,
    pub body: TypeBody,
}

/// The kind-specific part of a [`TypeDefinition`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Scalar,
    Object {
        implements: IndexSet<Name>,
        fields: IndexMap<Name, FieldDefinition>,
    },
    Interface {
        implements: IndexSet<Name>,
        fields: IndexMap<Name, FieldDefinition>,
    },
    Union {
        members: IndexSet<Name>,
    },
    Enum {
        values: IndexMap<Name, EnumValueDefinition>,
    },
    InputObject {
        fields: IndexMap<Name, InputValueDefinition>,
    },
}

impl TypeBody {
    pub fn empty(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Scalar => TypeBody::Scalar,
            TypeKind::Object => TypeBody::Object {
                implements: IndexSet::new(),
                fields: IndexMap::new(),
            },
            TypeKind::Interface => TypeBody::Interface {
                implements: IndexSet::new(),
                fields: IndexMap::new(),
            },
            TypeKind::Union => TypeBody::Union {
                members: IndexSet::new(),
            },
            TypeKind::Enum => TypeBody::Enum {
                values: IndexMap::new(),
            },
            TypeKind::InputObject => TypeBody::InputObject {
                fields: IndexMap::new(),
            },
        }
    }
}

impl TypeDefinition {
    /// Creates a type of the given kind with no fields, members or values.
    pub fn new(name: Name, kind: TypeKind) -> Self {
        Self {
            name,
            description: None,
            directives: DirectiveList::default(),
            body: TypeBody::empty(kind),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self.body {
            TypeBody::Scalar => TypeKind::Scalar,
            TypeBody::Object { .. } => TypeKind::Object,
            TypeBody::Interface { .. } => TypeKind::Interface,
            TypeBody::Union { .. } => TypeKind::Union,
            TypeBody::Enum { .. } => TypeKind::Enum,
            TypeBody::InputObject { .. } => TypeKind::InputObject,
        }
    }

    /// Output fields of object and interface types.
    pub fn fields(&self) -> Option<&IndexMap<Name, FieldDefinition>> {
        match &self.body {
            TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn fields_mut(&mut self) -> Option<&mut IndexMap<Name, FieldDefinition>> {
        match &mut self.body {
            TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn input_fields(&self) -> Option<&IndexMap<Name, InputValueDefinition>> {
        match &self.body {
            TypeBody::InputObject { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn implements(&self) -> Option<&IndexSet<Name>> {
        match &self.body {
            TypeBody::Object { implements, .. } | TypeBody::Interface { implements, .. } => {
                Some(implements)
            }
            _ => None,
        }
    }

    pub fn implements_interface(&self, interface: &str) -> bool {
        self.implements()
            .is_some_and(|implements| implements.contains(interface))
    }

    /// Names of the fields of object, interface and input object types, in order.
    pub fn field_names(&self) -> Vec<&Name> {
        match &self.body {
            TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => {
                fields.keys().collect()
            }
            TypeBody::InputObject { fields } => fields.keys().collect(),
            _ => Vec::new(),
        }
    }

    pub fn has_field(&self, field_name: &str) -> bool {
        match &self.body {
            TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => {
                fields.contains_key(field_name)
            }
            TypeBody::InputObject { fields } => fields.contains_key(field_name),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: Name,
    pub description: Option<Node<str>>,
    pub arguments: IndexMap<Name, InputValueDefinition>,
    pub ty: Type,
    pub directives: DirectiveList,
}

impl FieldDefinition {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            description: None,
            arguments: IndexMap::new(),
            ty,
            directives: DirectiveList::default(),
        }
    }

    /// Two fields have the same signature when their types are identical and they accept the
    /// same arguments with identical types, in any order. Descriptions, directives and
    /// default values are not part of the signature.
    pub fn same_signature(&self, other: &FieldDefinition) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.arguments.len() == other.arguments.len()
            && self.arguments.iter().all(|(name, argument)| {
                other
                    .arguments
                    .get(name)
                    .is_some_and(|other_argument| other_argument.ty == argument.ty)
            })
    }

    /// Renders the field as it would appear in SDL, without description or directives.
    pub fn signature(&self) -> String {
        if self.arguments.is_empty() {
            format!("{}: {}", self.name, self.ty)
        } else {
            format!(
                "{}({}): {}",
                self.name,
                self.arguments
                    .values()
                    .map(|argument| format!("{}: {}", argument.name, argument.ty))
                    .join(", "),
                self.ty
            )
        }
    }
}

/// An argument, input field or directive argument.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub name: Name,
    pub description: Option<Node<str>>,
    pub ty: Type,
    pub default_value: Option<Node<Value>>,
    pub directives: DirectiveList,
}

impl InputValueDefinition {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            description: None,
            ty,
            default_value: None,
            directives: DirectiveList::default(),
        }
    }

    pub fn signature(&self) -> String {
        format!("{}: {}", self.name, self.ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition {
    pub value: Name,
    pub description: Option<Node<str>>,
    pub directives: DirectiveList,
}

impl EnumValueDefinition {
    pub fn new(value: Name) -> Self {
        Self {
            value,
            description: None,
            directives: DirectiveList::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition {
    pub name: Name,
    pub description: Option<Node<str>>,
    pub arguments: IndexMap<Name, InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

impl DirectiveDefinition {
    /// Structural equality that ignores descriptions.
    pub fn same_shape(&self, other: &DirectiveDefinition) -> bool {
        self.name == other.name
            && self.repeatable == other.repeatable
            && self.locations.len() == other.locations.len()
            && self
                .locations
                .iter()
                .all(|location| other.locations.contains(location))
            && self.arguments.len() == other.arguments.len()
            && self.arguments.iter().all(|(name, argument)| {
                other.arguments.get(name).is_some_and(|other_argument| {
                    other_argument.ty == argument.ty
                        && other_argument.default_value == argument.default_value
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::ty;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn field_signatures_ignore_argument_order() {
        let mut a = FieldDefinition::new(name!("users"), ty!([User!]!));
        a.arguments
            .insert(name!("first"), InputValueDefinition::new(name!("first"), ty!(Int)));
        a.arguments.insert(
            name!("after"),
            InputValueDefinition::new(name!("after"), ty!(String)),
        );
        let mut b = FieldDefinition::new(name!("users"), ty!([User!]!));
        b.arguments.insert(
            name!("after"),
            InputValueDefinition::new(name!("after"), ty!(String)),
        );
        b.arguments
            .insert(name!("first"), InputValueDefinition::new(name!("first"), ty!(Int)));

        assert!(a.same_signature(&b));
        assert_eq!(a.signature(), "users(first: Int, after: String): [User!]!");

        b.ty = ty!([User]);
        assert!(!a.same_signature(&b));
    }

    #[test]
    fn built_in_scalars_resolve_without_declaration() {
        let document = SchemaDocument::new("a");
        assert_eq!(document.type_kind("String"), Some(TypeKind::Scalar));
        assert_eq!(document.type_kind("User"), None);
    }

    #[test]
    fn root_operations_are_inferred_from_canonical_names() {
        let mut document = SchemaDocument::new("a");
        document
            .types
            .insert(name!("Query"), TypeDefinition::new(name!("Query"), TypeKind::Object));
        document.types.insert(
            name!("Mutation"),
            TypeDefinition::new(name!("Mutation"), TypeKind::InputObject),
        );
        document.infer_root_operations();

        assert_eq!(document.root_operations.query, Some(name!("Query")));
        assert_eq!(document.root_operations.mutation, None);
        assert!(document.is_root_type("Query"));
    }
}
