//! Structural validation of a type system document.
//!
//! This is not a full GraphQL schema validator: applied directives and default values are not
//! checked. It covers what composition can break, which is references between types and the
//! contracts between interfaces and their implementors.

use apollo_compiler::Name;
use apollo_compiler::ast::Type;
use indexmap::IndexMap;

use crate::error::ValidationError;
use crate::schema::FieldDefinition;
use crate::schema::SchemaDocument;
use crate::schema::TypeBody;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;
use crate::schema::references::Position;

/// Checks that every reference in `document` resolves and that every type is well formed.
pub fn validate(document: &SchemaDocument) -> Result<(), Vec<ValidationError>> {
    let errors = check(document);
    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(
            schema = document.name(),
            errors = errors.len(),
            "document failed validation"
        );
        Err(errors)
    }
}

/// Every violation found in `document`, in a stable order.
pub(crate) fn check(document: &SchemaDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for reference in document.type_references() {
        let type_name = reference.ty.inner_named_type();
        let Some(kind) = document.type_kind(type_name) else {
            errors.push(ValidationError::UnknownType {
                coordinate: reference.coordinate,
                type_name: type_name.clone(),
            });
            continue;
        };
        let (valid, expected) = match reference.position {
            Position::Output => (kind.is_output(), "output"),
            Position::Input => (kind.is_input(), "input"),
        };
        if !valid {
            errors.push(ValidationError::InvalidPositionType {
                coordinate: reference.coordinate,
                type_name: type_name.clone(),
                expected,
                found: kind,
            });
        }
    }

    for definition in document.types.values() {
        check_type(document, definition, &mut errors);
    }

    for (operation, type_name) in document.root_operations.iter() {
        match document.type_kind(type_name) {
            None => errors.push(ValidationError::UnknownType {
                coordinate: format!("schema.{operation}"),
                type_name: type_name.clone(),
            }),
            Some(TypeKind::Object) => {}
            Some(_) => errors.push(ValidationError::InvalidRootType {
                operation,
                type_name: type_name.clone(),
            }),
        }
    }

    errors
}

fn check_type(
    document: &SchemaDocument,
    definition: &TypeDefinition,
    errors: &mut Vec<ValidationError>,
) {
    let type_name = &definition.name;
    match &definition.body {
        TypeBody::Scalar => {}
        TypeBody::Object { implements, fields } | TypeBody::Interface { implements, fields } => {
            check_duplicate_fields(type_name, fields.values().map(|field| &field.name), errors);
            if fields.is_empty() {
                errors.push(ValidationError::EmptyType {
                    kind: definition.kind(),
                    type_name: type_name.clone(),
                    members: "fields",
                });
            }
            for interface_name in implements {
                match document.get_type(interface_name) {
                    None => errors.push(ValidationError::UnknownType {
                        coordinate: type_name.to_string(),
                        type_name: interface_name.clone(),
                    }),
                    Some(TypeDefinition {
                        body:
                            TypeBody::Interface {
                                implements: inherited,
                                fields: interface_fields,
                            },
                        ..
                    }) => {
                        for missing in inherited.difference(implements) {
                            errors.push(ValidationError::MissingTransitiveInterface {
                                type_name: type_name.clone(),
                                interface: interface_name.clone(),
                                inherited: missing.clone(),
                            });
                        }
                        check_interface_contract(
                            document,
                            type_name,
                            fields,
                            interface_name,
                            interface_fields,
                            errors,
                        )
                    }
                    Some(_) => errors.push(ValidationError::NotAnInterface {
                        type_name: type_name.clone(),
                        interface: interface_name.clone(),
                    }),
                }
            }
        }
        TypeBody::Union { members } => {
            if members.is_empty() {
                errors.push(ValidationError::EmptyType {
                    kind: TypeKind::Union,
                    type_name: type_name.clone(),
                    members: "members",
                });
            }
            for member in members {
                match document.type_kind(member) {
                    None => errors.push(ValidationError::UnknownType {
                        coordinate: type_name.to_string(),
                        type_name: member.clone(),
                    }),
                    Some(TypeKind::Object) => {}
                    Some(_) => errors.push(ValidationError::InvalidUnionMember {
                        union_name: type_name.clone(),
                        member: member.clone(),
                    }),
                }
            }
        }
        TypeBody::Enum { values } => {
            if values.is_empty() {
                errors.push(ValidationError::EmptyType {
                    kind: TypeKind::Enum,
                    type_name: type_name.clone(),
                    members: "values",
                });
            }
        }
        TypeBody::InputObject { fields } => {
            check_duplicate_fields(type_name, fields.values().map(|field| &field.name), errors);
            if fields.is_empty() {
                errors.push(ValidationError::EmptyType {
                    kind: TypeKind::InputObject,
                    type_name: type_name.clone(),
                    members: "fields",
                });
            }
        }
    }
}

// Fields are keyed by name, but the definitions are public and a merge handler may return
// entries whose name disagrees with their key.
fn check_duplicate_fields<'a>(
    type_name: &Name,
    names: impl Iterator<Item = &'a Name>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = indexmap::IndexSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateField {
                type_name: type_name.clone(),
                field_name: name.clone(),
            });
        }
    }
}

fn check_interface_contract(
    document: &SchemaDocument,
    type_name: &Name,
    fields: &IndexMap<Name, FieldDefinition>,
    interface_name: &Name,
    interface_fields: &IndexMap<Name, FieldDefinition>,
    errors: &mut Vec<ValidationError>,
) {
    for (field_name, interface_field) in interface_fields {
        let Some(field) = fields.get(field_name) else {
            errors.push(ValidationError::MissingInterfaceField {
                type_name: type_name.clone(),
                interface: interface_name.clone(),
                field_name: field_name.clone(),
            });
            continue;
        };
        if !is_subtype(document, &field.ty, &interface_field.ty) {
            errors.push(ValidationError::IncompatibleInterfaceField {
                type_name: type_name.clone(),
                interface: interface_name.clone(),
                field_name: field_name.clone(),
                expected: interface_field.ty.to_string(),
                found: field.ty.to_string(),
            });
        }
        for (argument_name, interface_argument) in &interface_field.arguments {
            let matches = field
                .arguments
                .get(argument_name)
                .is_some_and(|argument| argument.ty == interface_argument.ty);
            if !matches {
                errors.push(ValidationError::MissingInterfaceArgument {
                    type_name: type_name.clone(),
                    interface: interface_name.clone(),
                    field_name: field_name.clone(),
                    argument: argument_name.clone(),
                    expected: interface_argument.ty.to_string(),
                });
            }
        }
        let extra_required = field.arguments.values().filter(|argument| {
            argument.ty.is_non_null()
                && argument.default_value.is_none()
                && !interface_field.arguments.contains_key(&argument.name)
        });
        for argument in extra_required {
            errors.push(ValidationError::ExtraRequiredArgument {
                type_name: type_name.clone(),
                interface: interface_name.clone(),
                field_name: field_name.clone(),
                argument: argument.name.clone(),
            });
        }
    }
}

/// Whether a field of type `sub` may implement an interface field of type `sup`.
fn is_subtype(document: &SchemaDocument, sub: &Type, sup: &Type) -> bool {
    match (sub, sup) {
        (Type::NonNullNamed(sub), Type::NonNullNamed(sup))
        | (Type::NonNullNamed(sub), Type::Named(sup))
        | (Type::Named(sub), Type::Named(sup)) => is_named_subtype(document, sub, sup),
        (Type::NonNullList(sub), Type::NonNullList(sup))
        | (Type::NonNullList(sub), Type::List(sup))
        | (Type::List(sub), Type::List(sup)) => is_subtype(document, sub, sup),
        _ => false,
    }
}

fn is_named_subtype(document: &SchemaDocument, sub: &Name, sup: &Name) -> bool {
    if sub == sup {
        return true;
    }
    match document.get_type(sup).map(|definition| &definition.body) {
        Some(TypeBody::Interface { .. }) => document
            .get_type(sub)
            .is_some_and(|definition| definition.implements_interface(sup)),
        Some(TypeBody::Union { members }) => members.contains(sub),
        _ => false,
    }
}
