use apollo_compiler::Node;
use apollo_compiler::ast;

use super::DirectiveDefinition;
use super::FieldDefinition;
use super::InputValueDefinition;
use super::RootOperation;
use super::SchemaDocument;
use super::TypeBody;
use super::TypeDefinition;

impl SchemaDocument {
    /// Builds the `apollo-compiler` AST for this document. Directive definitions come first,
    /// then types in index order. A `schema` definition is only emitted when it carries
    /// information: a description, directives, or non-canonical root type names.
    pub fn to_ast(&self) -> ast::Document {
        let mut document = ast::Document::new();

        if self.description.is_some()
            || !self.schema_directives.is_empty()
            || !self.root_operations.is_canonical()
        {
            let root_operations = self
                .root_operations
                .iter()
                .map(|(operation, name)| Node::new((operation_type(operation), name.clone())))
                .collect();
            document
                .definitions
                .push(ast::Definition::SchemaDefinition(Node::new(
                    ast::SchemaDefinition {
                        description: self.description.clone(),
                        directives: self.schema_directives.clone(),
                        root_operations,
                    },
                )));
        }

        document
            .definitions
            .extend(self.directive_definitions.values().map(|definition| {
                ast::Definition::DirectiveDefinition(Node::new(directive_definition(definition)))
            }));
        document
            .definitions
            .extend(self.types.values().map(type_definition));
        document
    }
}

fn operation_type(operation: RootOperation) -> ast::OperationType {
    match operation {
        RootOperation::Query => ast::OperationType::Query,
        RootOperation::Mutation => ast::OperationType::Mutation,
        RootOperation::Subscription => ast::OperationType::Subscription,
    }
}

fn type_definition(definition: &TypeDefinition) -> ast::Definition {
    let name = definition.name.clone();
    let description = definition.description.clone();
    let directives = definition.directives.clone();
    match &definition.body {
        TypeBody::Scalar => ast::Definition::ScalarTypeDefinition(Node::new(
            ast::ScalarTypeDefinition {
                description,
                name,
                directives,
            },
        )),
        TypeBody::Object { implements, fields } => {
            ast::Definition::ObjectTypeDefinition(Node::new(ast::ObjectTypeDefinition {
                description,
                name,
                implements_interfaces: implements.iter().cloned().collect(),
                directives,
                fields: fields.values().map(field_definition).collect(),
            }))
        }
        TypeBody::Interface { implements, fields } => {
            ast::Definition::InterfaceTypeDefinition(Node::new(ast::InterfaceTypeDefinition {
                description,
                name,
                implements_interfaces: implements.iter().cloned().collect(),
                directives,
                fields: fields.values().map(field_definition).collect(),
            }))
        }
        TypeBody::Union { members } => {
            ast::Definition::UnionTypeDefinition(Node::new(ast::UnionTypeDefinition {
                description,
                name,
                directives,
                members: members.iter().cloned().collect(),
            }))
        }
        TypeBody::Enum { values } => {
            ast::Definition::EnumTypeDefinition(Node::new(ast::EnumTypeDefinition {
                description,
                name,
                directives,
                values: values
                    .values()
                    .map(|value| {
                        Node::new(ast::EnumValueDefinition {
                            description: value.description.clone(),
                            value: value.value.clone(),
                            directives: value.directives.clone(),
                        })
                    })
                    .collect(),
            }))
        }
        TypeBody::InputObject { fields } => {
            ast::Definition::InputObjectTypeDefinition(Node::new(ast::InputObjectTypeDefinition {
                description,
                name,
                directives,
                fields: fields.values().map(input_value_definition).collect(),
            }))
        }
    }
}

fn field_definition(field: &FieldDefinition) -> Node<ast::FieldDefinition> {
    Node::new(ast::FieldDefinition {
        description: field.description.clone(),
        name: field.name.clone(),
        arguments: field
            .arguments
            .values()
            .map(input_value_definition)
            .collect(),
        ty: field.ty.clone(),
        directives: field.directives.clone(),
    })
}

fn input_value_definition(value: &InputValueDefinition) -> Node<ast::InputValueDefinition> {
    Node::new(ast::InputValueDefinition {
        description: value.description.clone(),
        name: value.name.clone(),
        ty: Node::new(value.ty.clone()),
        default_value: value.default_value.clone(),
        directives: value.directives.clone(),
    })
}

fn directive_definition(definition: &DirectiveDefinition) -> ast::DirectiveDefinition {
    ast::DirectiveDefinition {
        description: definition.description.clone(),
        name: definition.name.clone(),
        arguments: definition
            .arguments
            .values()
            .map(input_value_definition)
            .collect(),
        repeatable: definition.repeatable,
        locations: definition.locations.clone(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::schema::parse_schema;

    #[test]
    fn printed_sdl_parses_back_to_the_same_document() {
        let sdl = r#"
            directive @auth(role: String = "user") repeatable on FIELD_DEFINITION | OBJECT
            type Query {
              "Looks a user up"
              user(id: ID!): User @auth
            }
            type User implements Node { id: ID! tags: [String!] }
            interface Node { id: ID! }
            enum Role { ADMIN USER }
            input UserFilter { role: Role = USER }
            union Entity = User
        "#;
        let document = parse_schema("a", sdl).unwrap();
        let reparsed = parse_schema("a", &document.to_sdl()).unwrap();
        assert_eq!(document, reparsed);
    }

    #[test]
    fn non_canonical_roots_are_printed() {
        let document = parse_schema(
            "a",
            "schema { query: RootQuery } type RootQuery { a: Int }",
        )
        .unwrap();
        let sdl = document.to_sdl();
        assert!(sdl.contains("query: RootQuery"));

        let canonical = parse_schema("a", "type Query { a: Int }").unwrap();
        assert!(!canonical.to_sdl().contains("schema"));
    }
}
