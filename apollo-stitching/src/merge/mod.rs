//! Merging rewritten documents into one unified document.
//!
//! Types are grouped by name across documents. A type defined by a single schema is copied
//! unchanged. Groups with several definitions are dispatched to the [`TypeMergeHandler`]
//! registered for their kind, except root operation types, whose fields are always unioned.
//! Alongside the unified document the engine records, for every type and field, the schemas
//! that contributed it.

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::error::MergeConflict;
use crate::schema::DirectiveDefinition;
use crate::schema::RootOperation;
use crate::schema::SchemaDocument;
use crate::schema::TypeDefinition;
use crate::schema::is_built_in_directive;
use crate::utils::human_readable::SchemaNames;
use crate::utils::logging::snapshot;

mod default_handlers;
mod handler;

pub use handler::MergeCandidate;
pub use handler::MergeHandlerRegistry;
pub use handler::TypeMergeHandler;

/// The name of the unified document.
pub const UNIFIED_SCHEMA_NAME: &str = "unified";

/// The result of a composition: the unified document and where each part of it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSchema {
    pub(crate) document: SchemaDocument,
    pub(crate) origins: OriginMap,
}

impl MergedSchema {
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn origins(&self) -> &OriginMap {
        &self.origins
    }

    pub fn to_sdl(&self) -> String {
        self.document.to_sdl()
    }

    pub fn into_parts(self) -> (SchemaDocument, OriginMap) {
        (self.document, self.origins)
    }
}

/// The schemas that contributed each type and field of a [`MergedSchema`].
///
/// Types and fields added by global extensions after the merge have an empty origin set:
/// no source schema can resolve them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginMap {
    types: IndexMap<Name, TypeOrigins>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeOrigins {
    /// Schemas that define the type.
    pub schemas: IndexSet<String>,
    /// For each field, the schemas whose definition of the type declares it.
    pub fields: IndexMap<Name, IndexSet<String>>,
}

impl OriginMap {
    pub fn get(&self, type_name: &str) -> Option<&TypeOrigins> {
        self.types.get(type_name)
    }

    /// Schemas that define `type_name`, in registration order.
    pub fn type_origins(&self, type_name: &str) -> Option<&IndexSet<String>> {
        self.types.get(type_name).map(|origins| &origins.schemas)
    }

    /// Schemas that define `type_name.field_name`, in registration order.
    pub fn field_origins(&self, type_name: &str, field_name: &str) -> Option<&IndexSet<String>> {
        self.types.get(type_name)?.fields.get(field_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &TypeOrigins)> {
        self.types.iter()
    }

    fn record(&mut self, definition: &TypeDefinition, candidates: &[MergeCandidate<'_>]) {
        let fields = definition
            .field_names()
            .into_iter()
            .map(|field_name| {
                let schemas = candidates
                    .iter()
                    .filter(|candidate| candidate.definition.has_field(field_name))
                    .map(|candidate| candidate.schema.to_owned())
                    .collect();
                (field_name.clone(), schemas)
            })
            .collect();
        self.types.insert(
            definition.name.clone(),
            TypeOrigins {
                schemas: candidates
                    .iter()
                    .map(|candidate| candidate.schema.to_owned())
                    .collect(),
                fields,
            },
        );
    }

    /// Gives types and fields of `document` that have no entry yet an empty origin set, and
    /// drops entries for types and fields `document` no longer has.
    pub(crate) fn record_additions(&mut self, document: &SchemaDocument) {
        self.types
            .retain(|type_name, _| document.types.contains_key(type_name));
        for definition in document.types.values() {
            let origins = self.types.entry(definition.name.clone()).or_default();
            origins
                .fields
                .retain(|field_name, _| definition.has_field(field_name));
            for field_name in definition.field_names() {
                origins.fields.entry(field_name.clone()).or_default();
            }
        }
    }
}

/// Merges `documents` into one document, dispatching same-named types to `handlers`.
///
/// Every conflict across all types and directives is reported.
pub fn merge_schemas(
    documents: Vec<SchemaDocument>,
    handlers: &MergeHandlerRegistry,
) -> Result<MergedSchema, Vec<MergeConflict>> {
    let mut unified = SchemaDocument::new(UNIFIED_SCHEMA_NAME);
    let mut origins = OriginMap::default();
    let mut conflicts = Vec::new();

    for operation in RootOperation::ALL {
        if documents
            .iter()
            .any(|document| document.root_operations.get(operation).is_some())
        {
            *unified.root_operations.get_mut(operation) = Some(operation.canonical_type_name());
        }
    }
    for document in &documents {
        if unified.description.is_none() {
            unified.description = document.description.clone();
        }
        for directive in document.schema_directives.iter() {
            if !unified.schema_directives.contains(directive) {
                unified.schema_directives.push(directive.clone());
            }
        }
    }

    let mut groups: IndexMap<&Name, Vec<MergeCandidate<'_>>> = IndexMap::new();
    for document in &documents {
        for (type_name, definition) in &document.types {
            groups.entry(type_name).or_default().push(MergeCandidate {
                schema: document.name(),
                definition,
            });
        }
    }

    for (type_name, candidates) in &groups {
        match merge_group(&unified, type_name, candidates, handlers) {
            Ok(definition) => {
                origins.record(&definition, candidates);
                unified.types.insert(definition.name.clone(), definition);
            }
            Err(conflict) => conflicts.extend(conflict.flatten()),
        }
    }

    merge_directive_definitions(&documents, &mut unified, &mut conflicts);

    if !conflicts.is_empty() {
        return Err(conflicts);
    }
    tracing::debug!(
        schemas = documents.len(),
        types = unified.types.len(),
        "merged schemas"
    );
    snapshot!("merged", unified.to_sdl(), "merged document");
    Ok(MergedSchema {
        document: unified,
        origins,
    })
}

fn merge_group(
    unified: &SchemaDocument,
    type_name: &Name,
    candidates: &[MergeCandidate<'_>],
    handlers: &MergeHandlerRegistry,
) -> Result<TypeDefinition, MergeConflict> {
    let [first, rest @ ..] = candidates else {
        return Err(MergeConflict::Rejected {
            type_name: type_name.clone(),
            schemas: SchemaNames::default(),
            message: "no definitions to merge".to_owned(),
        });
    };
    if rest.is_empty() {
        return Ok(first.definition.clone());
    }

    let kind = first.definition.kind();
    if rest
        .iter()
        .any(|candidate| candidate.definition.kind() != kind)
    {
        return Err(MergeConflict::KindMismatch {
            type_name: type_name.clone(),
            schemas: candidates.iter().map(|candidate| candidate.schema).collect(),
            details: default_handlers::describe_kinds(candidates),
        });
    }

    if unified.is_root_type(type_name) {
        return default_handlers::FieldUnion.merge(type_name, candidates);
    }

    let handler = handlers
        .handler_for(kind)
        .ok_or_else(|| MergeConflict::Rejected {
            type_name: type_name.clone(),
            schemas: candidates.iter().map(|candidate| candidate.schema).collect(),
            message: format!("no merge handler is registered for {kind}s"),
        })?;
    let merged = handler.merge(type_name, candidates)?;
    tracing::trace!(%type_name, %kind, candidates = candidates.len(), "merged type");

    if merged.name != *type_name {
        return Err(MergeConflict::HandlerContract {
            type_name: type_name.clone(),
            details: format!("a definition named `{}`", merged.name),
        });
    }
    if merged.kind() != kind {
        return Err(MergeConflict::HandlerContract {
            type_name: type_name.clone(),
            details: format!("{} `{type_name}` where {kind} was expected", merged.kind()),
        });
    }
    Ok(merged)
}

/// Directive definitions are not merged: every schema that defines a directive must define
/// it the same way. Built-in directives are left to the GraphQL implementation.
fn merge_directive_definitions(
    documents: &[SchemaDocument],
    unified: &mut SchemaDocument,
    conflicts: &mut Vec<MergeConflict>,
) {
    let mut groups: IndexMap<&Name, Vec<(&str, &DirectiveDefinition)>> = IndexMap::new();
    for document in documents {
        for (name, definition) in &document.directive_definitions {
            if is_built_in_directive(name) {
                continue;
            }
            groups
                .entry(name)
                .or_default()
                .push((document.name(), definition));
        }
    }
    for (name, definitions) in groups {
        let Some((_, first)) = definitions.first() else {
            continue;
        };
        if definitions
            .iter()
            .all(|(_, definition)| definition.same_shape(first))
        {
            let mut merged = (*first).clone();
            if merged.description.is_none() {
                merged.description = definitions
                    .iter()
                    .find_map(|(_, definition)| definition.description.clone());
            }
            unified.directive_definitions.insert(name.clone(), merged);
        } else {
            conflicts.push(MergeConflict::IncompatibleDirective {
                directive_name: name.clone(),
                schemas: definitions.iter().map(|(schema, _)| *schema).collect(),
            });
        }
    }
}
