//! Building a [`SchemaDocument`] from an introspection result.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Deserialize;

use crate::error::AcquisitionError;
use crate::schema::DirectiveDefinition;
use crate::schema::EnumValueDefinition;
use crate::schema::FieldDefinition;
use crate::schema::InputValueDefinition;
use crate::schema::SchemaDocument;
use crate::schema::TypeBody;
use crate::schema::TypeDefinition;
use crate::schema::is_built_in_directive;
use crate::schema::is_built_in_scalar;

pub(crate) const INTROSPECTION_OPERATION_NAME: &str = "IntrospectionQuery";

/// The introspection query sent to remote schemas.
pub const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
      isRepeatable
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  specifiedByURL
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// The body sent through an [`IntrospectionTransport`](super::IntrospectionTransport).
pub(crate) fn introspection_request() -> serde_json::Value {
    serde_json::json!({
        "query": INTROSPECTION_QUERY,
        "operationName": INTROSPECTION_OPERATION_NAME,
    })
}

#[derive(Deserialize)]
struct Response {
    data: Option<Data>,
    #[serde(rename = "__schema")]
    schema: Option<IntrospectedSchema>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Deserialize)]
struct Data {
    #[serde(rename = "__schema")]
    schema: IntrospectedSchema,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectedSchema {
    query_type: Option<NamedTypeRef>,
    mutation_type: Option<NamedTypeRef>,
    subscription_type: Option<NamedTypeRef>,
    types: Vec<FullType>,
    #[serde(default)]
    directives: Vec<IntrospectedDirective>,
}

#[derive(Deserialize)]
struct NamedTypeRef {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Kind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullType {
    kind: Kind,
    name: String,
    description: Option<String>,
    #[serde(rename = "specifiedByURL")]
    specified_by_url: Option<String>,
    fields: Option<Vec<IntrospectedField>>,
    input_fields: Option<Vec<IntrospectedInputValue>>,
    interfaces: Option<Vec<TypeRef>>,
    enum_values: Option<Vec<IntrospectedEnumValue>>,
    possible_types: Option<Vec<TypeRef>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectedField {
    name: String,
    description: Option<String>,
    #[serde(default)]
    args: Vec<IntrospectedInputValue>,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectedInputValue {
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    ty: TypeRef,
    default_value: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectedEnumValue {
    name: String,
    description: Option<String>,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeRef {
    kind: Kind,
    name: Option<String>,
    of_type: Option<Box<TypeRef>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectedDirective {
    name: String,
    description: Option<String>,
    locations: Vec<String>,
    #[serde(default)]
    args: Vec<IntrospectedInputValue>,
    #[serde(default)]
    is_repeatable: bool,
}

/// Deserializes an introspection response, either `{"data": {"__schema": ...}}` or a bare
/// `{"__schema": ...}`, into a document named `schema_name`.
pub(crate) fn from_introspection(
    schema_name: &str,
    response: &str,
) -> Result<SchemaDocument, AcquisitionError> {
    let malformed = |message: String| AcquisitionError::MalformedIntrospection {
        schema: schema_name.to_owned(),
        message,
    };
    let response: Response =
        serde_json::from_str(response).map_err(|e| malformed(e.to_string()))?;
    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(malformed(format!(
            "the response contains errors: {}",
            messages.join("; ")
        )));
    }
    let schema = response
        .data
        .map(|data| data.schema)
        .or(response.schema)
        .ok_or_else(|| malformed("the response contains no `__schema`".to_owned()))?;

    Converter { schema_name }
        .convert(schema)
        .map_err(malformed)
}

struct Converter<'a> {
    schema_name: &'a str,
}

impl Converter<'_> {
    fn convert(&self, schema: IntrospectedSchema) -> Result<SchemaDocument, String> {
        let mut document = SchemaDocument::new(self.schema_name);
        document.root_operations.query = schema.query_type.map(|r| name(&r.name)).transpose()?;
        document.root_operations.mutation =
            schema.mutation_type.map(|r| name(&r.name)).transpose()?;
        document.root_operations.subscription = schema
            .subscription_type
            .map(|r| name(&r.name))
            .transpose()?;

        for ty in schema.types {
            if ty.name.starts_with("__") || is_built_in_scalar(&ty.name) {
                continue;
            }
            let definition = self.type_definition(ty)?;
            if document.types.contains_key(&definition.name) {
                return Err(format!("type `{}` is listed more than once", definition.name));
            }
            document.types.insert(definition.name.clone(), definition);
        }

        for directive in schema.directives {
            if is_built_in_directive(&directive.name) {
                continue;
            }
            let definition = DirectiveDefinition {
                name: name(&directive.name)?,
                description: description(directive.description),
                arguments: self.input_values(&directive.name, directive.args)?,
                repeatable: directive.is_repeatable,
                locations: directive
                    .locations
                    .iter()
                    .map(|location| directive_location(location))
                    .collect::<Result<_, _>>()?,
            };
            document
                .directive_definitions
                .insert(definition.name.clone(), definition);
        }
        Ok(document)
    }

    fn type_definition(&self, ty: FullType) -> Result<TypeDefinition, String> {
        let type_name = name(&ty.name)?;
        let mut directives = ast::DirectiveList::default();
        let body = match ty.kind {
            Kind::Scalar => {
                if let Some(url) = ty.specified_by_url {
                    directives.push(directive(name!("specifiedBy"), name!("url"), url));
                }
                TypeBody::Scalar
            }
            Kind::Object | Kind::Interface => {
                let implements = named_refs(ty.interfaces.unwrap_or_default())?;
                let mut fields = IndexMap::new();
                for field in ty.fields.unwrap_or_default() {
                    let definition = FieldDefinition {
                        name: name(&field.name)?,
                        description: description(field.description),
                        arguments: self
                            .input_values(&format!("{}.{}", ty.name, field.name), field.args)?,
                        ty: type_ref(field.ty)?,
                        directives: deprecation(field.is_deprecated, field.deprecation_reason),
                    };
                    if fields.insert(definition.name.clone(), definition).is_some() {
                        return Err(format!("field `{}.{}` is listed more than once", ty.name, field.name));
                    }
                }
                if ty.kind == Kind::Object {
                    TypeBody::Object { implements, fields }
                } else {
                    TypeBody::Interface { implements, fields }
                }
            }
            Kind::Union => TypeBody::Union {
                members: named_refs(ty.possible_types.unwrap_or_default())?,
            },
            Kind::Enum => {
                let mut values = IndexMap::new();
                for value in ty.enum_values.unwrap_or_default() {
                    let definition = EnumValueDefinition {
                        value: name(&value.name)?,
                        description: description(value.description),
                        directives: deprecation(value.is_deprecated, value.deprecation_reason),
                    };
                    if values.insert(definition.value.clone(), definition).is_some() {
                        return Err(format!(
                            "enum value `{}.{}` is listed more than once",
                            ty.name, value.name
                        ));
                    }
                }
                TypeBody::Enum { values }
            }
            Kind::InputObject => TypeBody::InputObject {
                fields: self.input_values(&ty.name, ty.input_fields.unwrap_or_default())?,
            },
            Kind::List | Kind::NonNull => {
                return Err(format!("`{}` is listed as a wrapping type", ty.name));
            }
        };
        Ok(TypeDefinition {
            name: type_name,
            description: description(ty.description),
            directives,
            body,
        })
    }

    fn input_values(
        &self,
        coordinate: &str,
        values: Vec<IntrospectedInputValue>,
    ) -> Result<IndexMap<Name, InputValueDefinition>, String> {
        let mut converted = IndexMap::with_capacity(values.len());
        for value in values {
            let ty = type_ref(value.ty)?;
            let default_value = value
                .default_value
                .as_deref()
                .map(|raw| {
                    parse_default_value(raw).ok_or_else(|| {
                        format!(
                            "`{coordinate}({}:)` has an invalid default value `{raw}`",
                            value.name
                        )
                    })
                })
                .transpose()?;
            let definition = InputValueDefinition {
                name: name(&value.name)?,
                description: description(value.description),
                ty,
                default_value,
                directives: Default::default(),
            };
            if converted.insert(definition.name.clone(), definition).is_some() {
                return Err(format!(
                    "input value `{coordinate}({}:)` is listed more than once",
                    value.name
                ));
            }
        }
        Ok(converted)
    }
}

fn name(value: &str) -> Result<Name, String> {
    Name::new(value).map_err(|_| format!("`{value}` is not a valid GraphQL name"))
}

fn description(description: Option<String>) -> Option<Node<str>> {
    description
        .filter(|description| !description.is_empty())
        .map(|description| description.as_str().into())
}

fn named_refs(refs: Vec<TypeRef>) -> Result<IndexSet<Name>, String> {
    refs.into_iter()
        .map(|r| {
            r.name
                .as_deref()
                .ok_or_else(|| "a named type reference has no name".to_owned())
                .and_then(name)
        })
        .collect()
}

fn type_ref(reference: TypeRef) -> Result<ast::Type, String> {
    match reference.kind {
        Kind::NonNull => {
            let inner = reference
                .of_type
                .ok_or_else(|| "a NON_NULL type reference has no `ofType`".to_owned())?;
            match type_ref(*inner)? {
                ast::Type::Named(named) => Ok(ast::Type::NonNullNamed(named)),
                ast::Type::List(item) => Ok(ast::Type::NonNullList(item)),
                _ => Err("a NON_NULL type reference wraps another NON_NULL".to_owned()),
            }
        }
        Kind::List => {
            let inner = reference
                .of_type
                .ok_or_else(|| "a LIST type reference has no `ofType`".to_owned())?;
            Ok(ast::Type::List(Box::new(type_ref(*inner)?)))
        }
        _ => {
            let type_name = reference
                .name
                .ok_or_else(|| "a named type reference has no name".to_owned())?;
            Ok(ast::Type::Named(name(&type_name)?))
        }
    }
}

fn deprecation(is_deprecated: bool, reason: Option<String>) -> ast::DirectiveList {
    let mut directives = ast::DirectiveList::default();
    if is_deprecated {
        directives.push(match reason {
            Some(reason) => directive(name!("deprecated"), name!("reason"), reason),
            None => Node::new(ast::Directive {
                name: name!("deprecated"),
                arguments: Vec::new(),
            }),
        });
    }
    directives
}

/// A directive application with a single string argument.
fn directive(directive_name: Name, argument: Name, value: String) -> Node<ast::Directive> {
    Node::new(ast::Directive {
        name: directive_name,
        arguments: vec![Node::new(ast::Argument {
            name: argument,
            value: Node::new(ast::Value::String(value)),
        })],
    })
}

/// Introspection reports default values as GraphQL value literals. They are parsed by
/// embedding them in a throwaway input type; the declared type does not matter to the parser.
fn parse_default_value(raw: &str) -> Option<Node<ast::Value>> {
    let document =
        ast::Document::parse(format!("input Default {{ value: Int = {raw} }}"), "default.graphql")
            .ok()?;
    document.definitions.into_iter().find_map(|definition| match definition {
        ast::Definition::InputObjectTypeDefinition(input) => {
            input.fields.first().and_then(|field| field.default_value.clone())
        }
        _ => None,
    })
}

fn directive_location(location: &str) -> Result<ast::DirectiveLocation, String> {
    use ast::DirectiveLocation::*;
    Ok(match location {
        "QUERY" => Query,
        "MUTATION" => Mutation,
        "SUBSCRIPTION" => Subscription,
        "FIELD" => Field,
        "FRAGMENT_DEFINITION" => FragmentDefinition,
        "FRAGMENT_SPREAD" => FragmentSpread,
        "INLINE_FRAGMENT" => InlineFragment,
        "VARIABLE_DEFINITION" => VariableDefinition,
        "SCHEMA" => Schema,
        "SCALAR" => Scalar,
        "OBJECT" => Object,
        "FIELD_DEFINITION" => FieldDefinition,
        "ARGUMENT_DEFINITION" => ArgumentDefinition,
        "INTERFACE" => Interface,
        "UNION" => Union,
        "ENUM" => Enum,
        "ENUM_VALUE" => EnumValue,
        "INPUT_OBJECT" => InputObject,
        "INPUT_FIELD_DEFINITION" => InputFieldDefinition,
        other => return Err(format!("unknown directive location `{other}`")),
    })
}
