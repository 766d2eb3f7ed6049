//! Walking and rewriting the type references held by a document.

use apollo_compiler::Name;
use apollo_compiler::ast::Type;

use super::SchemaDocument;
use super::TypeBody;

/// Where a type reference sits in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Field return types. Must be output types.
    Output,
    /// Arguments, input fields and directive arguments. Must be input types.
    Input,
}

/// A single use of a type name by another schema element.
#[derive(Debug, Clone)]
pub(crate) struct TypeReference<'a> {
    pub(crate) coordinate: String,
    pub(crate) ty: &'a Type,
    pub(crate) position: Position,
}

pub(crate) fn rename_in_type(ty: &mut Type, from: &Name, to: &Name) {
    match ty {
        Type::Named(name) | Type::NonNullNamed(name) => {
            if *name == *from {
                *name = to.clone();
            }
        }
        Type::List(inner) | Type::NonNullList(inner) => rename_in_type(inner, from, to),
    }
}

impl SchemaDocument {
    /// Every type reference made through a field, argument, input field or directive
    /// argument, with the coordinate of the element that makes it.
    pub(crate) fn type_references(&self) -> Vec<TypeReference<'_>> {
        let mut references = Vec::new();
        for definition in self.types.values() {
            match &definition.body {
                TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => {
                    for field in fields.values() {
                        references.push(TypeReference {
                            coordinate: format!("{}.{}", definition.name, field.name),
                            ty: &field.ty,
                            position: Position::Output,
                        });
                        for argument in field.arguments.values() {
                            references.push(TypeReference {
                                coordinate: format!(
                                    "{}.{}({}:)",
                                    definition.name, field.name, argument.name
                                ),
                                ty: &argument.ty,
                                position: Position::Input,
                            });
                        }
                    }
                }
                TypeBody::InputObject { fields } => {
                    for field in fields.values() {
                        references.push(TypeReference {
                            coordinate: format!("{}.{}", definition.name, field.name),
                            ty: &field.ty,
                            position: Position::Input,
                        });
                    }
                }
                TypeBody::Scalar | TypeBody::Union { .. } | TypeBody::Enum { .. } => {}
            }
        }
        for directive in self.directive_definitions.values() {
            for argument in directive.arguments.values() {
                references.push(TypeReference {
                    coordinate: format!("@{}({}:)", directive.name, argument.name),
                    ty: &argument.ty,
                    position: Position::Input,
                });
            }
        }
        references
    }

    /// Replaces every reference to `from` with `to`: field, argument, input field and
    /// directive argument types, implements clauses, union members and root operations.
    /// The definition itself is not touched.
    pub(crate) fn rename_type_references(&mut self, from: &Name, to: &Name) {
        for definition in self.types.values_mut() {
            match &mut definition.body {
                TypeBody::Object { implements, fields }
                | TypeBody::Interface { implements, fields } => {
                    if implements.contains(from) {
                        *implements = implements
                            .drain(..)
                            .map(|name| if name == *from { to.clone() } else { name })
                            .collect();
                    }
                    for field in fields.values_mut() {
                        rename_in_type(&mut field.ty, from, to);
                        for argument in field.arguments.values_mut() {
                            rename_in_type(&mut argument.ty, from, to);
                        }
                    }
                }
                TypeBody::Union { members } => {
                    if members.contains(from) {
                        *members = members
                            .drain(..)
                            .map(|name| if name == *from { to.clone() } else { name })
                            .collect();
                    }
                }
                TypeBody::InputObject { fields } => {
                    for field in fields.values_mut() {
                        rename_in_type(&mut field.ty, from, to);
                    }
                }
                TypeBody::Scalar | TypeBody::Enum { .. } => {}
            }
        }
        for directive in self.directive_definitions.values_mut() {
            for argument in directive.arguments.values_mut() {
                rename_in_type(&mut argument.ty, from, to);
            }
        }
        for operation in super::RootOperation::ALL {
            let slot = self.root_operations.get_mut(operation);
            if slot.as_ref() == Some(from) {
                *slot = Some(to.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;
    use apollo_compiler::ty;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::parse_schema;

    #[test]
    fn renames_nested_list_references() {
        let mut ty = ty!([[User!]]!);
        rename_in_type(&mut ty, &name!("User"), &name!("Account"));
        assert_eq!(ty, ty!([[Account!]]!));
    }

    #[test]
    fn collects_references_with_coordinates() {
        let document = parse_schema(
            "a",
            r#"
            directive @limit(max: Int!) on FIELD_DEFINITION
            type Query { users(filter: Filter): [User] }
            type User { id: ID! }
            input Filter { name: String }
            "#,
        )
        .unwrap();
        let coordinates: Vec<_> = document
            .type_references()
            .into_iter()
            .map(|reference| reference.coordinate)
            .collect();
        assert_eq!(
            coordinates,
            vec![
                "Query.users",
                "Query.users(filter:)",
                "User.id",
                "Filter.name",
                "@limit(max:)",
            ]
        );
    }
}
