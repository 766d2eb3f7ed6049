use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexMap;
use indexmap::IndexSet;

use super::DirectiveDefinition;
use super::EnumValueDefinition;
use super::FieldDefinition;
use super::InputValueDefinition;
use super::SchemaDocument;
use super::TypeBody;
use super::TypeDefinition;
use crate::error::AcquisitionError;
use crate::error::ExtensionError;
use crate::error::ExtensionErrors;
use crate::extension;

/// Parses SDL text into a [`SchemaDocument`] named `schema_name`.
///
/// Type extensions present in the text are folded into their base definitions. Root operation
/// types default to `Query`, `Mutation` and `Subscription` unless a `schema` definition says
/// otherwise.
pub fn parse_schema(schema_name: &str, sdl: &str) -> Result<SchemaDocument, AcquisitionError> {
    let document = ast::Document::parse(sdl, format!("{schema_name}.graphql")).map_err(|e| {
        AcquisitionError::Parse {
            schema: schema_name.to_owned(),
            message: e.errors.to_string(),
        }
    })?;
    from_document(schema_name, &document)
}

pub(crate) fn from_document(
    schema_name: &str,
    document: &ast::Document,
) -> Result<SchemaDocument, AcquisitionError> {
    let mut schema = SchemaDocument::new(schema_name);
    let mut errors = Vec::new();
    extension::apply_document(&mut schema, document, &mut errors);
    if !errors.is_empty() {
        return Err(AcquisitionError::InvalidDocument {
            schema: schema_name.to_owned(),
            causes: ExtensionErrors(errors),
        });
    }
    let explicit_roots = document
        .definitions
        .iter()
        .any(|definition| matches!(definition, ast::Definition::SchemaDefinition(_)));
    if !explicit_roots {
        schema.infer_root_operations();
    }
    Ok(schema)
}

/// Converts a type definition node. Returns `None` for definitions that are not type
/// definitions (schema definitions, directive definitions, extensions, executables).
pub(crate) fn convert_type_definition(
    schema: &str,
    definition: &ast::Definition,
    errors: &mut Vec<ExtensionError>,
) -> Option<TypeDefinition> {
    let converted = match definition {
        ast::Definition::ScalarTypeDefinition(def) => TypeDefinition {
            name: def.name.clone(),
            description: def.description.clone(),
            directives: def.directives.clone(),
            body: TypeBody::Scalar,
        },
        ast::Definition::ObjectTypeDefinition(def) => TypeDefinition {
            name: def.name.clone(),
            description: def.description.clone(),
            directives: def.directives.clone(),
            body: TypeBody::Object {
                implements: def.implements_interfaces.iter().cloned().collect(),
                fields: convert_fields(schema, &def.name, &def.fields, errors),
            },
        },
        ast::Definition::InterfaceTypeDefinition(def) => TypeDefinition {
            name: def.name.clone(),
            description: def.description.clone(),
            directives: def.directives.clone(),
            body: TypeBody::Interface {
                implements: def.implements_interfaces.iter().cloned().collect(),
                fields: convert_fields(schema, &def.name, &def.fields, errors),
            },
        },
        ast::Definition::UnionTypeDefinition(def) => TypeDefinition {
            name: def.name.clone(),
            description: def.description.clone(),
            directives: def.directives.clone(),
            body: TypeBody::Union {
                members: convert_members(schema, &def.name, &def.members, errors),
            },
        },
        ast::Definition::EnumTypeDefinition(def) => TypeDefinition {
            name: def.name.clone(),
            description: def.description.clone(),
            directives: def.directives.clone(),
            body: TypeBody::Enum {
                values: convert_enum_values(schema, &def.name, &def.values, errors),
            },
        },
        ast::Definition::InputObjectTypeDefinition(def) => TypeDefinition {
            name: def.name.clone(),
            description: def.description.clone(),
            directives: def.directives.clone(),
            body: TypeBody::InputObject {
                fields: convert_input_fields(schema, &def.name, &def.fields, errors),
            },
        },
        _ => return None,
    };
    Some(converted)
}

pub(crate) fn convert_directive_definition(
    schema: &str,
    definition: &ast::DirectiveDefinition,
    errors: &mut Vec<ExtensionError>,
) -> DirectiveDefinition {
    DirectiveDefinition {
        name: definition.name.clone(),
        description: definition.description.clone(),
        arguments: convert_arguments(
            schema,
            &format!("@{}", definition.name),
            &definition.arguments,
            errors,
        ),
        repeatable: definition.repeatable,
        locations: definition.locations.clone(),
    }
}

pub(crate) fn convert_fields(
    schema: &str,
    type_name: &Name,
    fields: &[Node<ast::FieldDefinition>],
    errors: &mut Vec<ExtensionError>,
) -> IndexMap<Name, FieldDefinition> {
    let mut converted = IndexMap::with_capacity(fields.len());
    for field in fields {
        if converted.contains_key(&field.name) {
            errors.push(ExtensionError::FieldAlreadyDefined {
                schema: schema.to_owned(),
                type_name: type_name.clone(),
                field_name: field.name.clone(),
            });
            continue;
        }
        let definition = FieldDefinition {
            name: field.name.clone(),
            description: field.description.clone(),
            arguments: convert_arguments(
                schema,
                &format!("{type_name}.{}", field.name),
                &field.arguments,
                errors,
            ),
            ty: field.ty.clone(),
            directives: field.directives.clone(),
        };
        converted.insert(field.name.clone(), definition);
    }
    converted
}

pub(crate) fn convert_input_fields(
    schema: &str,
    type_name: &Name,
    fields: &[Node<ast::InputValueDefinition>],
    errors: &mut Vec<ExtensionError>,
) -> IndexMap<Name, InputValueDefinition> {
    let mut converted = IndexMap::with_capacity(fields.len());
    for field in fields {
        if converted.contains_key(&field.name) {
            errors.push(ExtensionError::FieldAlreadyDefined {
                schema: schema.to_owned(),
                type_name: type_name.clone(),
                field_name: field.name.clone(),
            });
            continue;
        }
        converted.insert(field.name.clone(), convert_input_value(field));
    }
    converted
}

pub(crate) fn convert_members(
    schema: &str,
    type_name: &Name,
    members: &[Name],
    errors: &mut Vec<ExtensionError>,
) -> IndexSet<Name> {
    let mut converted = IndexSet::with_capacity(members.len());
    for member in members {
        if !converted.insert(member.clone()) {
            errors.push(ExtensionError::MemberAlreadyDefined {
                schema: schema.to_owned(),
                type_name: type_name.clone(),
                member: member.clone(),
            });
        }
    }
    converted
}

pub(crate) fn convert_enum_values(
    schema: &str,
    type_name: &Name,
    values: &[Node<ast::EnumValueDefinition>],
    errors: &mut Vec<ExtensionError>,
) -> IndexMap<Name, EnumValueDefinition> {
    let mut converted = IndexMap::with_capacity(values.len());
    for value in values {
        if converted.contains_key(&value.value) {
            errors.push(ExtensionError::ValueAlreadyDefined {
                schema: schema.to_owned(),
                type_name: type_name.clone(),
                value: value.value.clone(),
            });
            continue;
        }
        converted.insert(
            value.value.clone(),
            EnumValueDefinition {
                value: value.value.clone(),
                description: value.description.clone(),
                directives: value.directives.clone(),
            },
        );
    }
    converted
}

fn convert_arguments(
    schema: &str,
    coordinate: &str,
    arguments: &[Node<ast::InputValueDefinition>],
    errors: &mut Vec<ExtensionError>,
) -> IndexMap<Name, InputValueDefinition> {
    let mut converted = IndexMap::with_capacity(arguments.len());
    for argument in arguments {
        if converted.contains_key(&argument.name) {
            errors.push(ExtensionError::InvalidDocument {
                schema: schema.to_owned(),
                message: format!(
                    "argument `{coordinate}({}:)` is defined more than once",
                    argument.name
                ),
            });
            continue;
        }
        converted.insert(argument.name.clone(), convert_input_value(argument));
    }
    converted
}

fn convert_input_value(value: &ast::InputValueDefinition) -> InputValueDefinition {
    InputValueDefinition {
        name: value.name.clone(),
        description: value.description.clone(),
        ty: (*value.ty).clone(),
        default_value: value.default_value.clone(),
        directives: value.directives.clone(),
    }
}
