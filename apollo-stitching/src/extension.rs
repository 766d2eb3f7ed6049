//! Applies extension documents to a schema.
//!
//! An extension document is an SDL fragment that may define new types and directives and
//! `extend` existing ones with fields, values, members, interfaces and directives. Nothing is
//! ever overwritten: redefining an existing element is an error.

use apollo_compiler::Name;
use apollo_compiler::ast;
use indexmap::IndexMap;

use crate::error::ExtensionError;
use crate::schema::RootOperation;
use crate::schema::SchemaDocument;
use crate::schema::TypeBody;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;
use crate::schema::from_ast;

/// Parses an extension document. `target` names the schema it will apply to and only
/// appears in error messages.
pub fn parse_extension(target: &str, sdl: &str) -> Result<ast::Document, ExtensionError> {
    ast::Document::parse(sdl, format!("{target}.extensions.graphql")).map_err(|e| {
        ExtensionError::Parse {
            schema: target.to_owned(),
            message: e.errors.to_string(),
        }
    })
}

/// Applies `extensions` in order and returns the augmented document.
///
/// The input is left untouched: the extensions are applied to a copy that is only returned
/// when every one of them applied cleanly. Otherwise every error found is returned.
pub fn apply_extensions(
    document: &SchemaDocument,
    extensions: &[ast::Document],
) -> Result<SchemaDocument, Vec<ExtensionError>> {
    let mut scratch = document.clone();
    let mut errors = Vec::new();
    for extension in extensions {
        apply_document(&mut scratch, extension, &mut errors);
    }
    if errors.is_empty() {
        tracing::debug!(
            schema = document.name(),
            extensions = extensions.len(),
            "applied extensions"
        );
        Ok(scratch)
    } else {
        Err(errors)
    }
}

/// Applies one document: definitions first, then `extend` forms, so an extension may precede
/// the definition it extends.
pub(crate) fn apply_document(
    schema: &mut SchemaDocument,
    document: &ast::Document,
    errors: &mut Vec<ExtensionError>,
) {
    let schema_name = schema.name().to_owned();

    for definition in &document.definitions {
        match definition {
            ast::Definition::OperationDefinition(_) | ast::Definition::FragmentDefinition(_) => {
                errors.push(ExtensionError::InvalidDocument {
                    schema: schema_name.clone(),
                    message: "executable definitions are not allowed in a type system document"
                        .to_owned(),
                });
            }
            ast::Definition::DirectiveDefinition(def) => {
                let directive = from_ast::convert_directive_definition(&schema_name, def, errors);
                if schema.directive_definitions.contains_key(&directive.name) {
                    errors.push(ExtensionError::DirectiveAlreadyDefined {
                        schema: schema_name.clone(),
                        directive_name: directive.name,
                    });
                } else {
                    schema
                        .directive_definitions
                        .insert(directive.name.clone(), directive);
                }
            }
            ast::Definition::SchemaDefinition(def) => {
                if def.description.is_some() {
                    schema.description = def.description.clone();
                }
                schema
                    .schema_directives
                    .extend(def.directives.iter().cloned());
                add_root_operations(schema, &def.root_operations, errors);
            }
            _ => {
                let Some(ty) = from_ast::convert_type_definition(&schema_name, definition, errors)
                else {
                    continue;
                };
                if schema.types.contains_key(&ty.name) {
                    errors.push(ExtensionError::TypeAlreadyDefined {
                        schema: schema_name.clone(),
                        type_name: ty.name,
                    });
                } else {
                    schema.types.insert(ty.name.clone(), ty);
                }
            }
        }
    }

    for definition in &document.definitions {
        match definition {
            ast::Definition::SchemaExtension(ext) => {
                schema
                    .schema_directives
                    .extend(ext.directives.iter().cloned());
                add_root_operations(schema, &ext.root_operations, errors);
            }
            ast::Definition::ScalarTypeExtension(ext) => {
                if let Some(ty) = extension_target(schema, &ext.name, TypeKind::Scalar, errors) {
                    ty.directives.extend(ext.directives.iter().cloned());
                }
            }
            ast::Definition::ObjectTypeExtension(ext) => {
                let fields = from_ast::convert_fields(&schema_name, &ext.name, &ext.fields, errors);
                if let Some(ty) = extension_target(schema, &ext.name, TypeKind::Object, errors) {
                    ty.directives.extend(ext.directives.iter().cloned());
                    add_interfaces(&schema_name, ty, &ext.implements_interfaces, errors);
                    add_fields(&schema_name, ty, fields, errors);
                }
            }
            ast::Definition::InterfaceTypeExtension(ext) => {
                let fields = from_ast::convert_fields(&schema_name, &ext.name, &ext.fields, errors);
                if let Some(ty) = extension_target(schema, &ext.name, TypeKind::Interface, errors)
                {
                    ty.directives.extend(ext.directives.iter().cloned());
                    add_interfaces(&schema_name, ty, &ext.implements_interfaces, errors);
                    add_fields(&schema_name, ty, fields, errors);
                }
            }
            ast::Definition::UnionTypeExtension(ext) => {
                let added = from_ast::convert_members(&schema_name, &ext.name, &ext.members, errors);
                if let Some(ty) = extension_target(schema, &ext.name, TypeKind::Union, errors) {
                    ty.directives.extend(ext.directives.iter().cloned());
                    if let TypeBody::Union { members } = &mut ty.body {
                        for member in added {
                            if members.contains(&member) {
                                errors.push(ExtensionError::MemberAlreadyDefined {
                                    schema: schema_name.clone(),
                                    type_name: ext.name.clone(),
                                    member,
                                });
                            } else {
                                members.insert(member);
                            }
                        }
                    }
                }
            }
            ast::Definition::EnumTypeExtension(ext) => {
                let added =
                    from_ast::convert_enum_values(&schema_name, &ext.name, &ext.values, errors);
                if let Some(ty) = extension_target(schema, &ext.name, TypeKind::Enum, errors) {
                    ty.directives.extend(ext.directives.iter().cloned());
                    if let TypeBody::Enum { values } = &mut ty.body {
                        for (name, value) in added {
                            if values.contains_key(&name) {
                                errors.push(ExtensionError::ValueAlreadyDefined {
                                    schema: schema_name.clone(),
                                    type_name: ext.name.clone(),
                                    value: name,
                                });
                            } else {
                                values.insert(name, value);
                            }
                        }
                    }
                }
            }
            ast::Definition::InputObjectTypeExtension(ext) => {
                let added =
                    from_ast::convert_input_fields(&schema_name, &ext.name, &ext.fields, errors);
                if let Some(ty) =
                    extension_target(schema, &ext.name, TypeKind::InputObject, errors)
                {
                    ty.directives.extend(ext.directives.iter().cloned());
                    if let TypeBody::InputObject { fields } = &mut ty.body {
                        for (name, field) in added {
                            if fields.contains_key(&name) {
                                errors.push(ExtensionError::FieldAlreadyDefined {
                                    schema: schema_name.clone(),
                                    type_name: ext.name.clone(),
                                    field_name: name,
                                });
                            } else {
                                fields.insert(name, field);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn extension_target<'a>(
    schema: &'a mut SchemaDocument,
    type_name: &Name,
    expected: TypeKind,
    errors: &mut Vec<ExtensionError>,
) -> Option<&'a mut TypeDefinition> {
    let schema_name = schema.name().to_owned();
    let Some(ty) = schema.types.get_mut(type_name) else {
        errors.push(ExtensionError::TypeNotFound {
            schema: schema_name,
            type_name: type_name.clone(),
        });
        return None;
    };
    if ty.kind() != expected {
        errors.push(ExtensionError::KindMismatch {
            schema: schema_name,
            type_name: type_name.clone(),
            expected,
            found: ty.kind(),
        });
        return None;
    }
    Some(ty)
}

fn add_interfaces(
    schema_name: &str,
    ty: &mut TypeDefinition,
    interfaces: &[Name],
    errors: &mut Vec<ExtensionError>,
) {
    let type_name = ty.name.clone();
    let (TypeBody::Object { implements, .. } | TypeBody::Interface { implements, .. }) =
        &mut ty.body
    else {
        return;
    };
    for interface in interfaces {
        if !implements.insert(interface.clone()) {
            errors.push(ExtensionError::InterfaceAlreadyImplemented {
                schema: schema_name.to_owned(),
                type_name: type_name.clone(),
                interface: interface.clone(),
            });
        }
    }
}

fn add_fields(
    schema_name: &str,
    ty: &mut TypeDefinition,
    added: IndexMap<Name, crate::schema::FieldDefinition>,
    errors: &mut Vec<ExtensionError>,
) {
    let type_name = ty.name.clone();
    let Some(fields) = ty.fields_mut() else {
        return;
    };
    for (name, field) in added {
        if fields.contains_key(&name) {
            errors.push(ExtensionError::FieldAlreadyDefined {
                schema: schema_name.to_owned(),
                type_name: type_name.clone(),
                field_name: name,
            });
        } else {
            fields.insert(name, field);
        }
    }
}

fn add_root_operations(
    schema: &mut SchemaDocument,
    root_operations: &[apollo_compiler::Node<(ast::OperationType, Name)>],
    errors: &mut Vec<ExtensionError>,
) {
    for root in root_operations {
        let (operation_type, type_name) = &**root;
        let operation = match operation_type {
            ast::OperationType::Query => RootOperation::Query,
            ast::OperationType::Mutation => RootOperation::Mutation,
            ast::OperationType::Subscription => RootOperation::Subscription,
        };
        let schema_name = schema.name().to_owned();
        let slot = schema.root_operations.get_mut(operation);
        if let Some(existing) = slot.clone() {
            errors.push(ExtensionError::RootOperationAlreadyDefined {
                schema: schema_name,
                operation,
                type_name: existing,
            });
        } else {
            *slot = Some(type_name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::parse_schema;

    fn base() -> SchemaDocument {
        parse_schema(
            "accounts",
            r#"
            type Query { me: User }
            type User { id: ID! }
            enum Role { ADMIN }
            union Entity = User
            "#,
        )
        .unwrap()
    }

    #[test]
    fn adds_types_fields_values_and_members() {
        let extension = parse_extension(
            "accounts",
            r#"
            type Team { id: ID! }
            extend type User @key(fields: "id") { name: String team: Team }
            extend enum Role { MEMBER }
            extend union Entity = Team
            directive @key(fields: String!) on OBJECT
            "#,
        )
        .unwrap();
        let extended = apply_extensions(&base(), &[extension]).unwrap();

        let user = extended.get_type("User").unwrap();
        assert_eq!(user.field_names(), vec!["id", "name", "team"]);
        assert_eq!(user.directives.len(), 1);
        assert!(extended.get_type("Team").is_some());
        assert!(extended.directive_definitions.contains_key("key"));
        let TypeBody::Enum { values } = &extended.get_type("Role").unwrap().body else {
            panic!("Role is an enum");
        };
        assert_eq!(values.len(), 2);
        let TypeBody::Union { members } = &extended.get_type("Entity").unwrap().body else {
            panic!("Entity is a union");
        };
        assert!(members.contains("Team"));
    }

    #[test]
    fn never_overwrites_an_existing_field() {
        let original = base();
        let extension = parse_extension("accounts", "extend type User { id: String }").unwrap();
        let errors = apply_extensions(&original, &[extension]).unwrap_err();
        assert_eq!(
            errors,
            vec![ExtensionError::FieldAlreadyDefined {
                schema: "accounts".to_owned(),
                type_name: apollo_compiler::name!("User"),
                field_name: apollo_compiler::name!("id"),
            }]
        );
        assert_eq!(original, base());
    }

    #[test]
    fn collects_every_error() {
        let extension = parse_extension(
            "accounts",
            r#"
            type User { other: Int }
            extend type Missing { a: Int }
            extend interface User { b: Int }
            "#,
        )
        .unwrap();
        let errors = apply_extensions(&base(), &[extension]).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ExtensionError::TypeAlreadyDefined { .. }));
        assert!(matches!(errors[1], ExtensionError::TypeNotFound { .. }));
        assert!(matches!(
            errors[2],
            ExtensionError::KindMismatch {
                expected: TypeKind::Interface,
                found: TypeKind::Object,
                ..
            }
        ));
    }

    #[test]
    fn later_extensions_see_earlier_ones() {
        let first = parse_extension("accounts", "type Team { id: ID! }").unwrap();
        let second = parse_extension("accounts", "extend type Team { name: String }").unwrap();
        let extended = apply_extensions(&base(), &[first, second]).unwrap();
        assert_eq!(
            extended.get_type("Team").unwrap().field_names(),
            vec!["id", "name"]
        );
    }
}
