//! The merge handlers registered for every [`TypeKind`] unless overridden.

use apollo_compiler::Name;
use apollo_compiler::ast::DirectiveList;
use indexmap::IndexMap;
use indexmap::IndexSet;
use itertools::Itertools;

use super::MergeCandidate;
use super::TypeMergeHandler;
use crate::error::MergeConflict;
use crate::schema::TypeBody;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;
use crate::utils::human_readable::SchemaNames;

/// Object, interface and input object types: the union of all fields and implemented
/// interfaces. A field defined by several schemas must have the same signature everywhere.
pub(crate) struct FieldUnion;

/// Enums: the union of all values.
pub(crate) struct EnumValueUnion;

/// Unions: the union of all members.
pub(crate) struct UnionMemberUnion;

/// Scalars: every definition must be the same, descriptions aside.
pub(crate) struct IdenticalScalar;

impl TypeMergeHandler for FieldUnion {
    fn merge(
        &self,
        type_name: &Name,
        candidates: &[MergeCandidate<'_>],
    ) -> Result<TypeDefinition, MergeConflict> {
        let mut merged = first(type_name, candidates)?;
        let mut incompatible = IndexSet::new();
        for candidate in &candidates[1..] {
            merge_common(&mut merged, candidate.definition);
            match (&mut merged.body, &candidate.definition.body) {
                (
                    TypeBody::Object { implements, fields },
                    TypeBody::Object {
                        implements: other_implements,
                        fields: other_fields,
                    },
                )
                | (
                    TypeBody::Interface { implements, fields },
                    TypeBody::Interface {
                        implements: other_implements,
                        fields: other_fields,
                    },
                ) => {
                    implements.extend(other_implements.iter().cloned());
                    for (name, field) in other_fields {
                        match fields.get(name) {
                            Some(existing) if existing.same_signature(field) => {}
                            Some(_) => {
                                incompatible.insert(name.clone());
                            }
                            None => {
                                fields.insert(name.clone(), field.clone());
                            }
                        }
                    }
                }
                (
                    TypeBody::InputObject { fields },
                    TypeBody::InputObject {
                        fields: other_fields,
                    },
                ) => {
                    for (name, field) in other_fields {
                        match fields.get(name) {
                            Some(existing) if existing.ty == field.ty => {}
                            Some(_) => {
                                incompatible.insert(name.clone());
                            }
                            None => {
                                fields.insert(name.clone(), field.clone());
                            }
                        }
                    }
                }
                _ => return Err(kind_mismatch(type_name, candidates)),
            }
        }
        if incompatible.is_empty() {
            Ok(merged)
        } else {
            Err(MergeConflict::from_conflicts(
                incompatible
                    .iter()
                    .map(|name| incompatible_field(type_name, name, candidates)),
            ))
        }
    }
}

impl TypeMergeHandler for EnumValueUnion {
    fn merge(
        &self,
        type_name: &Name,
        candidates: &[MergeCandidate<'_>],
    ) -> Result<TypeDefinition, MergeConflict> {
        let mut merged = first(type_name, candidates)?;
        for candidate in &candidates[1..] {
            merge_common(&mut merged, candidate.definition);
            let (TypeBody::Enum { values }, TypeBody::Enum { values: other }) =
                (&mut merged.body, &candidate.definition.body)
            else {
                return Err(kind_mismatch(type_name, candidates));
            };
            for (name, value) in other {
                values
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        Ok(merged)
    }
}

impl TypeMergeHandler for UnionMemberUnion {
    fn merge(
        &self,
        type_name: &Name,
        candidates: &[MergeCandidate<'_>],
    ) -> Result<TypeDefinition, MergeConflict> {
        let mut merged = first(type_name, candidates)?;
        for candidate in &candidates[1..] {
            merge_common(&mut merged, candidate.definition);
            let (TypeBody::Union { members }, TypeBody::Union { members: other }) =
                (&mut merged.body, &candidate.definition.body)
            else {
                return Err(kind_mismatch(type_name, candidates));
            };
            members.extend(other.iter().cloned());
        }
        Ok(merged)
    }
}

impl TypeMergeHandler for IdenticalScalar {
    fn merge(
        &self,
        type_name: &Name,
        candidates: &[MergeCandidate<'_>],
    ) -> Result<TypeDefinition, MergeConflict> {
        let mut merged = first(type_name, candidates)?;
        for candidate in &candidates[1..] {
            let definition = candidate.definition;
            if definition.body != merged.body || definition.directives != merged.directives {
                return Err(MergeConflict::NotIdentical {
                    kind: TypeKind::Scalar,
                    type_name: type_name.clone(),
                    schemas: schema_names(candidates),
                });
            }
            if merged.description.is_none() {
                merged.description = definition.description.clone();
            }
        }
        Ok(merged)
    }
}

fn first(
    type_name: &Name,
    candidates: &[MergeCandidate<'_>],
) -> Result<TypeDefinition, MergeConflict> {
    candidates
        .first()
        .map(|candidate| candidate.definition.clone())
        .ok_or_else(|| MergeConflict::Rejected {
            type_name: type_name.clone(),
            schemas: SchemaNames::default(),
            message: "no definitions to merge".to_owned(),
        })
}

/// Keeps the first description and appends directives not applied yet.
fn merge_common(merged: &mut TypeDefinition, other: &TypeDefinition) {
    if merged.description.is_none() {
        merged.description = other.description.clone();
    }
    append_directives(&mut merged.directives, &other.directives);
}

fn append_directives(directives: &mut DirectiveList, other: &DirectiveList) {
    for directive in other.iter() {
        if !directives.contains(directive) {
            directives.push(directive.clone());
        }
    }
}

fn schema_names(candidates: &[MergeCandidate<'_>]) -> SchemaNames {
    candidates.iter().map(|candidate| candidate.schema).collect()
}

fn kind_mismatch(type_name: &Name, candidates: &[MergeCandidate<'_>]) -> MergeConflict {
    MergeConflict::KindMismatch {
        type_name: type_name.clone(),
        schemas: schema_names(candidates),
        details: describe_kinds(candidates),
    }
}

/// "object type in "a", enum in "b"".
pub(super) fn describe_kinds(candidates: &[MergeCandidate<'_>]) -> String {
    candidates
        .iter()
        .map(|candidate| format!("{} in \"{}\"", candidate.definition.kind(), candidate.schema))
        .join(", ")
}

/// Lists each schema's signature for a field that does not agree across schemas.
fn incompatible_field(
    type_name: &Name,
    field_name: &Name,
    candidates: &[MergeCandidate<'_>],
) -> MergeConflict {
    let signatures: IndexMap<&str, String> = candidates
        .iter()
        .filter_map(|candidate| {
            let definition = candidate.definition;
            let signature = match &definition.body {
                TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => {
                    fields.get(field_name).map(|field| field.signature())
                }
                TypeBody::InputObject { fields } => {
                    fields.get(field_name).map(|field| field.signature())
                }
                _ => None,
            }?;
            Some((candidate.schema, signature))
        })
        .collect();
    MergeConflict::IncompatibleField {
        type_name: type_name.clone(),
        field_name: field_name.clone(),
        schemas: signatures.keys().copied().collect(),
        details: signatures
            .iter()
            .map(|(schema, signature)| format!("`{signature}` in \"{schema}\""))
            .join(", "),
    }
}
