use apollo_compiler::Name;
use indexmap::IndexSet;

use super::FieldReference;
use super::Outcome;
use super::RewriteRule;
use crate::error::RewriteError;
use crate::schema::SchemaDocument;
use crate::schema::TypeBody;

pub(super) fn remove_type(
    document: &mut SchemaDocument,
    rule: &RewriteRule,
    type_name: &Name,
) -> Result<(), Outcome> {
    if document.types.shift_remove(type_name).is_none() {
        return Err(Outcome::TargetMissing(RewriteError::TypeNotFound {
            schema: document.name().to_owned(),
            rule: rule.to_string(),
            type_name: type_name.clone(),
        }));
    }
    remove_dependents(document, type_name);
    Ok(())
}

pub(super) fn remove_field(
    document: &mut SchemaDocument,
    rule: &RewriteRule,
    field: &FieldReference,
) -> Result<(), Outcome> {
    let schema = document.name().to_owned();
    let Some(definition) = document.types.get_mut(&field.type_name) else {
        return Err(Outcome::TargetMissing(RewriteError::TypeNotFound {
            schema,
            rule: rule.to_string(),
            type_name: field.type_name.clone(),
        }));
    };
    let removed = match &mut definition.body {
        TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => {
            fields.shift_remove(&field.field_name).is_some()
        }
        TypeBody::InputObject { fields } => fields.shift_remove(&field.field_name).is_some(),
        TypeBody::Scalar | TypeBody::Union { .. } | TypeBody::Enum { .. } => false,
    };
    if removed {
        Ok(())
    } else {
        Err(Outcome::TargetMissing(RewriteError::FieldNotFound {
            schema,
            rule: rule.to_string(),
            type_name: field.type_name.clone(),
            field_name: field.field_name.clone(),
        }))
    }
}

/// Removes the query, mutation and subscription types along with their dependents. A root
/// operation pointing at a type the document does not define is simply cleared.
pub(super) fn remove_root_types(document: &mut SchemaDocument) {
    let roots: IndexSet<Name> = document
        .root_operations
        .iter()
        .map(|(_, name)| name.clone())
        .collect();
    for root in roots {
        document.types.shift_remove(&root);
        remove_dependents(document, &root);
    }
}

/// Removes what cannot exist without `removed`:
/// fields returning it, fields with a non-null argument of that type, nullable arguments,
/// input fields and nullable directive arguments of that type, implements clauses and union
/// members naming it, and root operations pointing at it.
///
/// Non-null directive arguments are left dangling: there is nothing sensible to cascade to,
/// so validation reports them.
fn remove_dependents(document: &mut SchemaDocument, removed: &Name) {
    let refers_to_removed = |ty: &apollo_compiler::ast::Type| ty.inner_named_type() == removed;
    let mut removed_fields = 0usize;

    for definition in document.types.values_mut() {
        match &mut definition.body {
            TypeBody::Object { implements, fields } | TypeBody::Interface { implements, fields } => {
                implements.shift_remove(removed);
                let before = fields.len();
                fields.retain(|_, field| {
                    !refers_to_removed(&field.ty)
                        && !field.arguments.values().any(|argument| {
                            argument.ty.is_non_null() && refers_to_removed(&argument.ty)
                        })
                });
                removed_fields += before - fields.len();
                for field in fields.values_mut() {
                    field
                        .arguments
                        .retain(|_, argument| !refers_to_removed(&argument.ty));
                }
            }
            TypeBody::Union { members } => {
                members.shift_remove(removed);
            }
            TypeBody::InputObject { fields } => {
                let before = fields.len();
                fields.retain(|_, field| !refers_to_removed(&field.ty));
                removed_fields += before - fields.len();
            }
            TypeBody::Scalar | TypeBody::Enum { .. } => {}
        }
    }

    for directive in document.directive_definitions.values_mut() {
        directive.arguments.retain(|_, argument| {
            argument.ty.is_non_null() || !refers_to_removed(&argument.ty)
        });
    }

    for operation in crate::schema::RootOperation::ALL {
        let slot = document.root_operations.get_mut(operation);
        if slot.as_ref() == Some(removed) {
            *slot = None;
        }
    }

    tracing::trace!(
        schema = document.name(),
        type_name = %removed,
        removed_fields,
        "removed type and its dependents"
    );
}
