//! Composition errors.
//!
//! Each pipeline stage has its own error type. A stage collects every error it can find
//! before giving up, and [`CompositionError`] carries that list for the first stage that
//! failed. There is no partial result.

use std::fmt;

use apollo_compiler::Name;
use displaydoc::Display;
use itertools::Itertools;
use thiserror::Error;

use crate::schema::RootOperation;
use crate::schema::TypeKind;
pub use crate::utils::human_readable::SchemaNames;

/// Errors found while validating what was registered on the builder.
#[derive(Debug, Clone, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// schema names must not be empty
    EmptySchemaName,
    /// schema "{0}" is registered more than once
    DuplicateSchema(String),
    /// {what} must not be empty
    EmptyArgument { what: String },
    /// `{name}` is not a valid GraphQL name
    InvalidName { name: String },
    /// {rule} targets schema "{schema}", which is not registered
    UnknownSchema { schema: String, rule: String },
    /// {what} must have exactly one of `sdl` or `file`
    InvalidSource { what: String },
    /// no schemas were registered
    NoSchemas,
    /// could not deserialize configuration: {0}
    Deserialize(String),
}

/// Errors producing a [`SchemaDocument`](crate::SchemaDocument) from a source.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum AcquisitionError {
    /// schema "{schema}" could not be parsed: {message}
    Parse { schema: String, message: String },
    /// could not read {path} for "{schema}": {source}
    FileUnreadable {
        schema: String,
        path: String,
        source: std::io::Error,
    },
    /// introspection of schema "{schema}" failed: {message}
    Transport { schema: String, message: String },
    /// schema "{schema}" returned a malformed introspection result: {message}
    MalformedIntrospection { schema: String, message: String },
    /// schema "{schema}" is not a valid type system document: {causes}
    InvalidDocument {
        schema: String,
        causes: ExtensionErrors,
    },
}

impl AcquisitionError {
    pub fn schema(&self) -> &str {
        match self {
            AcquisitionError::Parse { schema, .. }
            | AcquisitionError::FileUnreadable { schema, .. }
            | AcquisitionError::Transport { schema, .. }
            | AcquisitionError::MalformedIntrospection { schema, .. }
            | AcquisitionError::InvalidDocument { schema, .. } => schema,
        }
    }
}

/// Errors applying extension documents to a schema.
#[derive(Debug, Clone, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtensionError {
    /// extension for "{schema}" could not be parsed: {message}
    Parse { schema: String, message: String },
    /// schema "{schema}": type `{type_name}` is already defined
    TypeAlreadyDefined { schema: String, type_name: Name },
    /// schema "{schema}": directive `@{directive_name}` is already defined
    DirectiveAlreadyDefined {
        schema: String,
        directive_name: Name,
    },
    /// schema "{schema}": field `{type_name}.{field_name}` is already defined
    FieldAlreadyDefined {
        schema: String,
        type_name: Name,
        field_name: Name,
    },
    /// schema "{schema}": enum value `{type_name}.{value}` is already defined
    ValueAlreadyDefined {
        schema: String,
        type_name: Name,
        value: Name,
    },
    /// schema "{schema}": union `{type_name}` already includes `{member}`
    MemberAlreadyDefined {
        schema: String,
        type_name: Name,
        member: Name,
    },
    /// schema "{schema}": `{type_name}` already implements `{interface}`
    InterfaceAlreadyImplemented {
        schema: String,
        type_name: Name,
        interface: Name,
    },
    /// schema "{schema}": the {operation} root type is already defined as `{type_name}`
    RootOperationAlreadyDefined {
        schema: String,
        operation: RootOperation,
        type_name: Name,
    },
    /// schema "{schema}": cannot extend `{type_name}` because it does not exist
    TypeNotFound { schema: String, type_name: Name },
    /// schema "{schema}": cannot extend {found} `{type_name}` as {expected}
    KindMismatch {
        schema: String,
        type_name: Name,
        expected: TypeKind,
        found: TypeKind,
    },
    /// schema "{schema}": {message}
    InvalidDocument { schema: String, message: String },
}

/// Every problem found in one document, rendered on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionErrors(pub Vec<ExtensionError>);

impl ExtensionErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExtensionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.iter().join("; "))
    }
}

/// Errors applying a rewrite rule to a schema.
#[derive(Debug, Clone, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
pub enum RewriteError {
    /// {rule} on schema "{schema}" failed: type `{type_name}` does not exist
    TypeNotFound {
        schema: String,
        rule: String,
        type_name: Name,
    },
    /// {rule} on schema "{schema}" failed: field `{type_name}.{field_name}` does not exist
    FieldNotFound {
        schema: String,
        rule: String,
        type_name: Name,
        field_name: Name,
    },
    /// {rule} on schema "{schema}" failed: type `{type_name}` already exists
    TypeNameCollision {
        schema: String,
        rule: String,
        type_name: Name,
    },
    /// {rule} on schema "{schema}" failed: field `{type_name}.{field_name}` already exists
    FieldNameCollision {
        schema: String,
        rule: String,
        type_name: Name,
        field_name: Name,
    },
    /// {rule} on schema "{schema}" failed: {cause}
    StructuralBreakage {
        schema: String,
        rule: String,
        cause: ValidationError,
    },
    /// {rule} did not match any schema
    Unmatched { rule: String },
}

/// Same-named definitions from several schemas that could not be combined.
#[derive(Debug, Clone, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
pub enum MergeConflict {
    /// type `{type_name}` has different kinds in {schemas}: {details}
    KindMismatch {
        type_name: Name,
        schemas: SchemaNames,
        details: String,
    },
    /// field `{type_name}.{field_name}` has incompatible definitions in {schemas}: {details}
    IncompatibleField {
        type_name: Name,
        field_name: Name,
        schemas: SchemaNames,
        details: String,
    },
    /// {kind} `{type_name}` is not identical in {schemas}
    NotIdentical {
        kind: TypeKind,
        type_name: Name,
        schemas: SchemaNames,
    },
    /// directive `@{directive_name}` is defined differently in {schemas}
    IncompatibleDirective {
        directive_name: Name,
        schemas: SchemaNames,
    },
    /// type `{type_name}` from {schemas} was rejected by its merge handler: {message}
    Rejected {
        type_name: Name,
        schemas: SchemaNames,
        message: String,
    },
    /// the merge handler for `{type_name}` returned {details}
    HandlerContract { type_name: Name, details: String },
    /// {0}
    Multiple(MergeConflicts),
}

impl MergeConflict {
    /// A single conflict, or [`MergeConflict::Multiple`] when a handler found several.
    pub fn from_conflicts(conflicts: impl IntoIterator<Item = MergeConflict>) -> Self {
        let mut conflicts: Vec<_> = conflicts
            .into_iter()
            .flat_map(MergeConflict::flatten)
            .collect();
        if conflicts.len() == 1 {
            conflicts.remove(0)
        } else {
            MergeConflict::Multiple(MergeConflicts(conflicts))
        }
    }

    /// The individual conflicts, with [`MergeConflict::Multiple`] expanded.
    pub fn flatten(self) -> Vec<MergeConflict> {
        match self {
            MergeConflict::Multiple(conflicts) => conflicts.0,
            conflict => vec![conflict],
        }
    }
}

/// Several conflicts reported together by one merge handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflicts(pub Vec<MergeConflict>);

impl fmt::Display for MergeConflicts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.iter().join("; "))
    }
}

/// Problems found in a type system document.
#[derive(Debug, Clone, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// `{coordinate}` references unknown type `{type_name}`
    UnknownType { coordinate: String, type_name: Name },
    /// `{coordinate}` must have an {expected} type, found {found} `{type_name}`
    InvalidPositionType {
        coordinate: String,
        type_name: Name,
        expected: &'static str,
        found: TypeKind,
    },
    /// `{type_name}` implements `{interface}`, which is not an interface
    NotAnInterface { type_name: Name, interface: Name },
    /// union `{union_name}` includes `{member}`, which is not an object type
    InvalidUnionMember { union_name: Name, member: Name },
    /// the {operation} root type `{type_name}` is not an object type
    InvalidRootType {
        operation: RootOperation,
        type_name: Name,
    },
    /// `{type_name}` implements `{interface}` but does not provide field `{field_name}`
    MissingInterfaceField {
        type_name: Name,
        interface: Name,
        field_name: Name,
    },
    /// `{type_name}.{field_name}` has type `{found}`, which does not satisfy `{interface}.{field_name}: {expected}`
    IncompatibleInterfaceField {
        type_name: Name,
        interface: Name,
        field_name: Name,
        expected: String,
        found: String,
    },
    /// `{type_name}.{field_name}` must accept argument `{argument}: {expected}` declared by `{interface}.{field_name}`
    MissingInterfaceArgument {
        type_name: Name,
        interface: Name,
        field_name: Name,
        argument: Name,
        expected: String,
    },
    /// `{type_name}.{field_name}` adds required argument `{argument}`, which `{interface}.{field_name}` does not declare
    ExtraRequiredArgument {
        type_name: Name,
        interface: Name,
        field_name: Name,
        argument: Name,
    },
    /// `{type_name}` implements `{interface}` but not `{inherited}`, which `{interface}` implements
    MissingTransitiveInterface {
        type_name: Name,
        interface: Name,
        inherited: Name,
    },
    /// type `{type_name}` defines field `{field_name}` more than once
    DuplicateField { type_name: Name, field_name: Name },
    /// {kind} `{type_name}` has no {members}
    EmptyType {
        kind: TypeKind,
        type_name: Name,
        members: &'static str,
    },
}

/// The reason a composition did not produce a schema.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompositionError {
    Configuration(Vec<ConfigurationError>),
    Acquisition(Vec<AcquisitionError>),
    Extension(Vec<ExtensionError>),
    Rewrite(Vec<RewriteError>),
    Merge(Vec<MergeConflict>),
    Validation(Vec<ValidationError>),
}

impl CompositionError {
    /// The pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            CompositionError::Configuration(_) => "configuration",
            CompositionError::Acquisition(_) => "schema acquisition",
            CompositionError::Extension(_) => "extension application",
            CompositionError::Rewrite(_) => "rewriting",
            CompositionError::Merge(_) => "merging",
            CompositionError::Validation(_) => "validation",
        }
    }

    /// One message per error, in the order they were found.
    pub fn messages(&self) -> Vec<String> {
        fn to_strings<E: ToString>(errors: &[E]) -> Vec<String> {
            errors.iter().map(ToString::to_string).collect()
        }
        match self {
            CompositionError::Configuration(errors) => to_strings(errors),
            CompositionError::Acquisition(errors) => to_strings(errors),
            CompositionError::Extension(errors) => to_strings(errors),
            CompositionError::Rewrite(errors) => to_strings(errors),
            CompositionError::Merge(errors) => to_strings(errors),
            CompositionError::Validation(errors) => to_strings(errors),
        }
    }
}

impl fmt::Display for CompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self.messages();
        write!(
            f,
            "composition failed during {} with {} error{}:\n{}",
            self.stage(),
            messages.len(),
            if messages.len() == 1 { "" } else { "s" },
            messages.iter().map(|message| format!("  - {message}")).join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn composition_error_lists_every_message() {
        let error = CompositionError::Rewrite(vec![
            RewriteError::TypeNotFound {
                schema: "accounts".to_owned(),
                rule: "RemoveType(User)".to_owned(),
                type_name: name!("User"),
            },
            RewriteError::Unmatched {
                rule: "RenameType(Foo -> Bar)".to_owned(),
            },
        ]);
        insta::assert_snapshot!(error.to_string(), @r###"
        composition failed during rewriting with 2 errors:
          - RemoveType(User) on schema "accounts" failed: type `User` does not exist
          - RenameType(Foo -> Bar) did not match any schema
        "###);
    }

    #[test]
    fn merge_conflicts_name_every_schema() {
        let conflict = MergeConflict::IncompatibleField {
            type_name: name!("T"),
            field_name: name!("x"),
            schemas: SchemaNames::from_iter(["A", "B"]),
            details: r#"`x: String` in "A", `x: Int` in "B""#.to_owned(),
        };
        insta::assert_snapshot!(
            conflict.to_string(),
            @r###"field `T.x` has incompatible definitions in schemas "A" and "B": `x: String` in "A", `x: Int` in "B""###
        );
    }
}
