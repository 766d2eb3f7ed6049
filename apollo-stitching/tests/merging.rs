use std::sync::Arc;

use apollo_compiler::Name;
use apollo_stitching::CompositionError;
use apollo_stitching::MergeCandidate;
use apollo_stitching::TypeDefinition;
use apollo_stitching::TypeKind;
use apollo_stitching::TypeMergeHandler;
use apollo_stitching::error::MergeConflict;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::builder;
use crate::compose;
use crate::compose_err;

#[tokio::test]
async fn disjoint_object_fields_are_unioned() {
    let merged = compose(builder(&[
        ("A", "type Query { t: T } type T { x: String }"),
        ("B", "type Query { u: T } type T { y: Int }"),
    ]))
    .await;

    assert_eq!(
        merged.document().get_type("T").unwrap().field_names(),
        vec!["x", "y"]
    );
    assert_eq!(
        merged
            .origins()
            .field_origins("T", "y")
            .unwrap()
            .iter()
            .collect::<Vec<_>>(),
        vec!["B"]
    );
}

#[tokio::test]
async fn incompatible_fields_name_both_schemas() {
    let error = compose_err(builder(&[
        ("A", "type Query { t: T } type T { x: String }"),
        ("B", "type Query { u: T } type T { x: Int }"),
    ]))
    .await;

    insta::assert_snapshot!(error, @r###"
    composition failed during merging with 1 error:
      - field `T.x` has incompatible definitions in schemas "A" and "B": `x: String` in "A", `x: Int` in "B"
    "###);
}

#[rstest]
#[case::enum_values(
    "enum E { A B }",
    "enum E { B C }",
    "enum E {\n  A\n  B\n  C\n}"
)]
#[case::union_members(
    "union U = X | Y type X { x: Int } type Y { y: Int }",
    "union U = Y | Z type Y { y: Int } type Z { z: Int }",
    "union U = X | Y | Z"
)]
#[tokio::test]
async fn same_named_types_are_combined(
    #[case] first: &str,
    #[case] second: &str,
    #[case] expected: &str,
) {
    let merged = compose(builder(&[
        ("A", &format!("type Query {{ a: Int }} {first}")),
        ("B", &format!("type Query {{ b: Int }} {second}")),
    ]))
    .await;
    assert!(
        merged.to_sdl().contains(expected),
        "{expected} not found in:\n{}",
        merged.to_sdl()
    );
}

#[tokio::test]
async fn every_conflict_is_reported() {
    let error = compose_err(builder(&[
        ("A", "type Query { a: Int } scalar Date enum E { A } type T { x: Int }"),
        ("B", "type Query { b: Int } enum Date { TODAY } scalar E type T { x: ID }"),
    ]))
    .await;

    assert_eq!(error.stage(), "merging");
    insta::assert_snapshot!(error.messages().join("\n"), @r###"
    type `Date` has different kinds in schemas "A" and "B": scalar in "A", enum in "B"
    type `E` has different kinds in schemas "A" and "B": enum in "A", scalar in "B"
    field `T.x` has incompatible definitions in schemas "A" and "B": `x: Int` in "A", `x: ID` in "B"
    "###);
}

/// Keeps the definition from the last schema.
struct LastWins;

impl TypeMergeHandler for LastWins {
    fn merge(
        &self,
        _type_name: &Name,
        candidates: &[MergeCandidate<'_>],
    ) -> Result<TypeDefinition, MergeConflict> {
        Ok(candidates[candidates.len() - 1].definition.clone())
    }
}

#[tokio::test]
async fn custom_handlers_override_the_defaults() {
    let merged = compose(
        builder(&[
            ("A", "type Query { t: T } type T { x: String }"),
            ("B", "type Query { u: T } type T { x: Int }"),
        ])
        .add_merge_handler(TypeKind::Object, 0, Arc::new(LastWins)),
    )
    .await;

    let t = merged.document().get_type("T").unwrap();
    assert_eq!(t.fields().unwrap()["x"].ty.to_string(), "Int");
    // Root types are always unioned.
    assert_eq!(
        merged.document().get_type("Query").unwrap().field_names(),
        vec!["t", "u"]
    );
}

#[tokio::test]
async fn handler_closures_can_reject_a_group() {
    let error = compose_err(
        builder(&[
            ("A", "type Query { a: Int } enum E { A }"),
            ("B", "type Query { b: Int } enum E { A }"),
        ])
        .add_merge_handler_fn(TypeKind::Enum, 1, |type_name, candidates| {
            Err(MergeConflict::Rejected {
                type_name: type_name.clone(),
                schemas: candidates.iter().map(|candidate| candidate.schema).collect(),
                message: "enums must not be shared".to_owned(),
            })
        }),
    )
    .await;

    insta::assert_snapshot!(error, @r###"
    composition failed during merging with 1 error:
      - type `E` from schemas "A" and "B" was rejected by its merge handler: enums must not be shared
    "###);
}

#[tokio::test]
async fn handlers_must_keep_the_kind() {
    let error = compose_err(
        builder(&[
            ("A", "type Query { a: Int } scalar S"),
            ("B", "type Query { b: Int } scalar S"),
        ])
        .add_merge_handler_fn(TypeKind::Scalar, 1, |type_name, _| {
            Ok(TypeDefinition::new(type_name.clone(), TypeKind::Enum))
        }),
    )
    .await;

    assert!(matches!(
        error,
        CompositionError::Merge(ref conflicts)
            if matches!(conflicts[..], [MergeConflict::HandlerContract { .. }])
    ));
}
