use apollo_compiler::name;
use apollo_stitching::CompositionError;
use apollo_stitching::FieldReference;
use apollo_stitching::error::RewriteError;
use pretty_assertions::assert_eq;

use crate::builder;
use crate::compose;
use crate::compose_err;

const ACCOUNTS: &str = r#"
    type Query {
      me: User
      users(filter: UserFilter): [User!]!
    }

    type Mutation {
      updateUser(id: ID!): User
    }

    type User {
      id: ID!
      name: String
      friends: [User!]
    }

    input UserFilter {
      name: String
    }

    union SearchResult = User | Team

    type Team {
      members: [User]
    }
"#;

const PROFILES: &str = r#"
    type Query {
      me: User
      profiles: [Profile]
    }

    type User {
      id: ID!
    }

    type Profile {
      owner: User
      bio: String
    }
"#;

const REVIEWS: &str = r#"
    type Query {
      reviews: [Review]
    }

    type Review {
      body: String
    }
"#;

#[tokio::test]
async fn renaming_a_type_replaces_every_reference() {
    let merged = compose(builder(&[("accounts", ACCOUNTS)]).rename_type("User", "Account")).await;
    let sdl = merged.to_sdl();

    assert!(!sdl.contains("User!") && !sdl.contains("User]") && !sdl.contains("type User "));
    let document = merged.document();
    assert!(document.get_type("User").is_none());
    assert_eq!(
        document.get_type("Account").unwrap().field_names(),
        vec!["id", "name", "friends"]
    );
    let query = document.get_type("Query").unwrap().fields().unwrap();
    assert_eq!(query["me"].ty.inner_named_type(), "Account");
    assert_eq!(query["users"].ty.to_string(), "[Account!]!");
    assert_eq!(
        document.get_type("Team").unwrap().fields().unwrap()["members"]
            .ty
            .to_string(),
        "[Account]"
    );
    assert!(sdl.contains("union SearchResult = Account | Team"));
}

#[tokio::test]
async fn global_rules_skip_schemas_without_the_target() {
    let merged = compose(
        builder(&[("accounts", ACCOUNTS), ("reviews", REVIEWS)]).rename_type("User", "Account"),
    )
    .await;

    assert_eq!(
        merged.origins().type_origins("Account").unwrap().len(),
        1
    );
    assert!(merged.document().get_type("Review").is_some());
}

#[tokio::test]
async fn removing_a_missing_field_fails() {
    let error = compose_err(builder(&[("accounts", ACCOUNTS)]).ignore_field(
        "accounts",
        FieldReference::new(name!("User"), name!("email")),
    ))
    .await;

    insta::assert_snapshot!(error, @r###"
    composition failed during rewriting with 1 error:
      - RemoveField(User.email) on schema "accounts" failed: field `User.email` does not exist
    "###);
}

#[tokio::test]
async fn removing_a_field_removes_only_that_field() {
    let merged = compose(builder(&[("accounts", ACCOUNTS)]).ignore_field(
        "accounts",
        FieldReference::new(name!("User"), name!("friends")),
    ))
    .await;

    let document = merged.document();
    assert_eq!(
        document.get_type("User").unwrap().field_names(),
        vec!["id", "name"]
    );
    assert_eq!(
        document.get_type("Query").unwrap().field_names(),
        vec!["me", "users"]
    );
    assert!(document.get_type("Team").is_some());
}

#[tokio::test]
async fn rename_then_remove_equals_removing_the_original() {
    let renamed_then_removed = compose(
        builder(&[("profiles", PROFILES), ("reviews", REVIEWS)])
            .rename_type_of("profiles", "User", "Account")
            .ignore_type_of("profiles", "Account"),
    )
    .await;
    let removed = compose(
        builder(&[("profiles", PROFILES), ("reviews", REVIEWS)])
            .ignore_type_of("profiles", "User"),
    )
    .await;

    assert_eq!(renamed_then_removed.to_sdl(), removed.to_sdl());
    let document = removed.document();
    assert!(document.get_type("Account").is_none());
    assert!(document.get_type("User").is_none());
    assert_eq!(
        document.get_type("Query").unwrap().field_names(),
        vec!["profiles", "reviews"]
    );
    assert_eq!(
        document.get_type("Profile").unwrap().field_names(),
        vec!["bio"]
    );
}

#[tokio::test]
async fn removing_the_old_name_after_a_rename_fails() {
    let error = compose_err(
        builder(&[("profiles", PROFILES)])
            .rename_type_of("profiles", "User", "Account")
            .ignore_type_of("profiles", "User"),
    )
    .await;

    let CompositionError::Rewrite(errors) = &error else {
        panic!("expected a rewrite error, found {error}");
    };
    assert_eq!(
        errors,
        &vec![RewriteError::TypeNotFound {
            schema: "profiles".to_owned(),
            rule: "RemoveType(User)".to_owned(),
            type_name: name!("User"),
        }]
    );
}

#[tokio::test]
async fn removals_that_empty_a_type_fail() {
    let error = compose_err(builder(&[("accounts", ACCOUNTS)]).ignore_type("User")).await;

    let CompositionError::Rewrite(errors) = &error else {
        panic!("expected a rewrite error, found {error}");
    };
    assert!(errors.iter().all(|error| matches!(
        error,
        RewriteError::StructuralBreakage { schema, .. } if schema == "accounts"
    )));
    assert!(error.messages()[0].contains("RemoveType(User) on schema \"accounts\" failed"));
}

#[tokio::test]
async fn ignoring_root_types_keeps_the_rest() {
    let merged = compose(
        builder(&[("accounts", ACCOUNTS), ("reviews", REVIEWS)]).ignore_root_types_of("accounts"),
    )
    .await;

    let document = merged.document();
    assert!(document.get_type("Mutation").is_none());
    assert_eq!(
        document.get_type("Query").unwrap().field_names(),
        vec!["reviews"]
    );
    assert!(document.get_type("User").is_some());
}

#[tokio::test]
async fn unmatched_global_rules_are_errors() {
    let error = compose_err(builder(&[("reviews", REVIEWS)]).ignore_type("User")).await;

    insta::assert_snapshot!(error, @r###"
    composition failed during rewriting with 1 error:
      - RemoveType(User) did not match any schema
    "###);
}

#[tokio::test]
async fn renaming_fields_in_a_scope() {
    let merged = compose(
        builder(&[("accounts", ACCOUNTS), ("reviews", REVIEWS)])
            .rename_field(
                FieldReference::new(name!("Query"), name!("reviews")).in_schema("reviews"),
                "allReviews",
            )
            .rename_field_of(
                "accounts",
                FieldReference::new(name!("User"), name!("name")),
                "fullName",
            ),
    )
    .await;

    let document = merged.document();
    assert_eq!(
        document.get_type("Query").unwrap().field_names(),
        vec!["me", "users", "allReviews"]
    );
    assert_eq!(
        document.get_type("User").unwrap().field_names(),
        vec!["id", "fullName", "friends"]
    );
    assert_eq!(
        merged.origins().field_origins("Query", "allReviews").unwrap().len(),
        1
    );
}
