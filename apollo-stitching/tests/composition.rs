use std::io::Write;
use std::sync::Arc;

use apollo_stitching::CompositionError;
use apollo_stitching::IntrospectionTransport;
use apollo_stitching::StitchingBuilder;
use apollo_stitching::acquisition::BoxError;
use apollo_stitching::schema::TypeBody;
use apollo_stitching::schema::parse_schema;
use async_trait::async_trait;
use indexmap::IndexSet;
use pretty_assertions::assert_eq;

use crate::builder;
use crate::compose;
use crate::compose_err;

const USERS: &str = r#"
    "The users service"
    type Query {
      users: [User!]!
      node(id: ID!): Node
    }

    interface Node {
      id: ID!
    }

    type User implements Node {
      id: ID!
      name: String
      role: Role
    }

    enum Role {
      ADMIN
      MEMBER
    }
"#;

fn origins<const N: usize>(schemas: [&str; N]) -> IndexSet<String> {
    schemas.into_iter().map(str::to_owned).collect()
}

#[tokio::test]
async fn a_single_schema_composes_to_itself() {
    let merged = compose(builder(&[("users", USERS)])).await;
    assert_eq!(
        merged.to_sdl(),
        parse_schema("users", USERS).unwrap().to_sdl()
    );
    for (_, type_origins) in merged.origins().iter() {
        assert_eq!(type_origins.schemas, origins(["users"]));
    }
}

#[tokio::test]
async fn root_fields_are_additive() {
    let merged = compose(builder(&[
        ("A", "type Query { a: Int }"),
        ("B", "type Query { b: Int }"),
    ]))
    .await;

    let query = merged.document().get_type("Query").unwrap();
    assert_eq!(query.field_names(), vec!["a", "b"]);
    let origin_map = merged.origins();
    assert_eq!(origin_map.type_origins("Query"), Some(&origins(["A", "B"])));
    assert_eq!(origin_map.field_origins("Query", "a"), Some(&origins(["A"])));
    assert_eq!(origin_map.field_origins("Query", "b"), Some(&origins(["B"])));
}

#[tokio::test]
async fn non_canonical_root_types_are_normalized_before_merging() {
    let merged = compose(builder(&[
        (
            "A",
            "schema { query: RootQuery } type RootQuery { a: Int }",
        ),
        ("B", "type Query { b: Int }"),
    ]))
    .await;

    assert!(merged.document().get_type("RootQuery").is_none());
    assert_eq!(
        merged.document().get_type("Query").unwrap().field_names(),
        vec!["a", "b"]
    );
}

#[tokio::test]
async fn extensions_apply_before_rewriting() {
    let merged = compose(
        builder(&[("users", USERS)])
            .add_schema_extensions_from_string("users", "extend type User { nickname: String }")
            .rename_type_of("users", "User", "Account"),
    )
    .await;

    let account = merged.document().get_type("Account").unwrap();
    assert_eq!(account.field_names(), vec!["id", "name", "role", "nickname"]);
    assert!(merged.document().get_type("User").is_none());
}

#[tokio::test]
async fn global_extensions_apply_to_the_unified_schema() {
    let merged = compose(
        builder(&[
            ("A", "type Query { a: Int }"),
            ("B", "type Query { b: Int }"),
        ])
        .add_extensions_from_string("extend type Query { version: String }"),
    )
    .await;

    assert_eq!(
        merged.document().get_type("Query").unwrap().field_names(),
        vec!["a", "b", "version"]
    );
    assert_eq!(
        merged.origins().field_origins("Query", "version"),
        Some(&IndexSet::new())
    );
    assert_eq!(
        merged.origins().type_origins("Query"),
        Some(&origins(["A", "B"]))
    );
}

#[tokio::test]
async fn reads_schemas_and_extensions_from_files() {
    let directory = tempfile::tempdir().unwrap();
    let schema_path = directory.path().join("users.graphql");
    let extension_path = directory.path().join("users.extensions.graphql");
    std::fs::File::create(&schema_path)
        .unwrap()
        .write_all(USERS.as_bytes())
        .unwrap();
    std::fs::File::create(&extension_path)
        .unwrap()
        .write_all(b"extend enum Role { GUEST }")
        .unwrap();

    let merged = compose(
        StitchingBuilder::new()
            .add_schema_from_file("users", &schema_path)
            .add_schema_extensions_from_file("users", &extension_path),
    )
    .await;

    let role = merged.document().get_type("Role").unwrap();
    match &role.body {
        TypeBody::Enum { values } => {
            assert_eq!(
                values.keys().map(|value| value.as_str()).collect::<Vec<_>>(),
                vec!["ADMIN", "MEMBER", "GUEST"]
            );
        }
        other => panic!("expected an enum, found {other:?}"),
    }
}

struct StaticTransport(&'static str);

#[async_trait]
impl IntrospectionTransport for StaticTransport {
    async fn execute(
        &self,
        _schema_name: &str,
        _request: serde_json::Value,
    ) -> Result<String, BoxError> {
        Ok(self.0.to_owned())
    }
}

#[tokio::test]
async fn composes_local_and_introspected_schemas() {
    let remote = StaticTransport(
        r#"{
          "data": {
            "__schema": {
              "queryType": { "name": "Query" },
              "mutationType": null,
              "subscriptionType": null,
              "types": [
                {
                  "kind": "OBJECT",
                  "name": "Query",
                  "fields": [
                    { "name": "reviews", "args": [], "type": { "kind": "LIST", "ofType": { "kind": "SCALAR", "name": "String" } } }
                  ],
                  "interfaces": []
                },
                { "kind": "SCALAR", "name": "String" }
              ],
              "directives": []
            }
          }
        }"#,
    );
    let merged = compose(
        builder(&[("users", USERS)]).add_schema_from_introspection("reviews", Arc::new(remote)),
    )
    .await;

    assert_eq!(
        merged.origins().field_origins("Query", "reviews"),
        Some(&origins(["reviews"]))
    );
    assert_eq!(
        merged.origins().field_origins("Query", "users"),
        Some(&origins(["users"]))
    );
}

#[tokio::test]
async fn introspected_directives_and_scalars_match_their_sdl_definitions() {
    let remote = StaticTransport(
        r#"{
          "data": {
            "__schema": {
              "queryType": { "name": "Query" },
              "types": [
                {
                  "kind": "OBJECT",
                  "name": "Query",
                  "fields": [
                    { "name": "publishedAt", "args": [], "type": { "kind": "SCALAR", "name": "DateTime" } }
                  ],
                  "interfaces": []
                },
                {
                  "kind": "SCALAR",
                  "name": "DateTime",
                  "specifiedByURL": "https://scalars.graphql.org/andimarek/date-time"
                }
              ],
              "directives": [
                {
                  "name": "tag",
                  "locations": ["OBJECT"],
                  "args": [{ "name": "name", "type": { "kind": "SCALAR", "name": "String" }, "defaultValue": null }],
                  "isRepeatable": true
                }
              ]
            }
          }
        }"#,
    );
    let local = r#"
        directive @tag(name: String) repeatable on OBJECT
        type Query { createdAt: DateTime }
        scalar DateTime @specifiedBy(url: "https://scalars.graphql.org/andimarek/date-time")
    "#;
    let merged = compose(
        builder(&[("local", local)]).add_schema_from_introspection("remote", Arc::new(remote)),
    )
    .await;

    let document = merged.document();
    assert!(document.directive_definitions["tag"].repeatable);
    assert_eq!(
        document.get_type("DateTime").unwrap().directives.len(),
        1
    );
    assert_eq!(
        merged.origins().type_origins("DateTime"),
        Some(&origins(["local", "remote"]))
    );
}

#[tokio::test]
async fn configuration_errors_are_reported_together() {
    let error = compose_err(
        StitchingBuilder::new()
            .add_schema_from_string("", "type Query { a: Int }")
            .rename_type_of("missing", "User", "Account")
            .add_schema_extensions_from_string("elsewhere", "extend type Query { b: Int }"),
    )
    .await;

    insta::assert_snapshot!(error, @r###"
    composition failed during configuration with 4 errors:
      - schema names must not be empty
      - RenameType(User -> Account) targets schema "missing", which is not registered
      - an extension targets schema "elsewhere", which is not registered
      - no schemas were registered
    "###);
}

#[tokio::test]
async fn every_unreadable_source_is_reported() {
    let directory = tempfile::tempdir().unwrap();
    let error = compose_err(
        StitchingBuilder::new()
            .add_schema_from_string("broken", "type Query {")
            .add_schema_from_string("fine", "type Query { a: Int }")
            .add_schema_from_file("missing", directory.path().join("missing.graphql")),
    )
    .await;

    let CompositionError::Acquisition(errors) = &error else {
        panic!("expected an acquisition error, found {error}");
    };
    assert_eq!(
        errors.iter().map(|error| error.schema()).collect::<Vec<_>>(),
        vec!["broken", "missing"]
    );
}

#[tokio::test]
async fn extension_errors_abort_before_merging() {
    let error = compose_err(
        builder(&[("users", USERS)])
            .add_schema_extensions_from_string("users", "extend type Missing { a: Int }")
            .add_schema_extensions_from_string("users", "extend type User { name: String }"),
    )
    .await;

    insta::assert_snapshot!(error, @r###"
    composition failed during extension application with 2 errors:
      - schema "users": cannot extend `Missing` because it does not exist
      - schema "users": field `User.name` is already defined
    "###);
}

#[tokio::test]
async fn the_unified_schema_is_validated() {
    let error = compose_err(
        builder(&[("A", "type Query { a: Int }")])
            .add_extensions_from_string("extend type Query { b: Missing }"),
    )
    .await;

    insta::assert_snapshot!(error, @r###"
    composition failed during validation with 1 error:
      - `Query.b` references unknown type `Missing`
    "###);
}

#[tokio::test]
async fn builders_can_be_composed_more_than_once() {
    let builder = builder(&[("A", "type Query { a: Int }")]);
    let first = builder.compose().await.unwrap();
    let second = builder.compose().await.unwrap();
    assert_eq!(first, second);
}
