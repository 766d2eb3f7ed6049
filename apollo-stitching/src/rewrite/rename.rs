use apollo_compiler::Name;

use super::FieldReference;
use super::Outcome;
use super::RewriteRule;
use crate::error::RewriteError;
use crate::schema::SchemaDocument;
use crate::schema::TypeBody;
use crate::schema::is_built_in_scalar;

pub(super) fn rename_type(
    document: &mut SchemaDocument,
    rule: &RewriteRule,
    from: &Name,
    to: &Name,
) -> Result<(), Outcome> {
    let schema = document.name().to_owned();
    if !document.types.contains_key(from) {
        return Err(Outcome::TargetMissing(RewriteError::TypeNotFound {
            schema,
            rule: rule.to_string(),
            type_name: from.clone(),
        }));
    }
    if document.types.contains_key(to) || is_built_in_scalar(to) {
        return Err(Outcome::Failed(vec![RewriteError::TypeNameCollision {
            schema,
            rule: rule.to_string(),
            type_name: to.clone(),
        }]));
    }

    // Rebuilt rather than removed and reinserted so the type keeps its position.
    document.types = std::mem::take(&mut document.types)
        .into_iter()
        .map(|(name, mut definition)| {
            if name == *from {
                definition.name = to.clone();
                (to.clone(), definition)
            } else {
                (name, definition)
            }
        })
        .collect();
    document.rename_type_references(from, to);
    Ok(())
}

pub(super) fn rename_field(
    document: &mut SchemaDocument,
    rule: &RewriteRule,
    field: &FieldReference,
    to: &Name,
) -> Result<(), Outcome> {
    let schema = document.name().to_owned();
    let Some(definition) = document.types.get_mut(&field.type_name) else {
        return Err(Outcome::TargetMissing(RewriteError::TypeNotFound {
            schema,
            rule: rule.to_string(),
            type_name: field.type_name.clone(),
        }));
    };
    if !definition.has_field(&field.field_name) {
        return Err(Outcome::TargetMissing(RewriteError::FieldNotFound {
            schema,
            rule: rule.to_string(),
            type_name: field.type_name.clone(),
            field_name: field.field_name.clone(),
        }));
    }
    if definition.has_field(to) {
        return Err(Outcome::Failed(vec![RewriteError::FieldNameCollision {
            schema,
            rule: rule.to_string(),
            type_name: field.type_name.clone(),
            field_name: to.clone(),
        }]));
    }

    let from = &field.field_name;
    match &mut definition.body {
        TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => {
            *fields = std::mem::take(fields)
                .into_iter()
                .map(|(name, mut field)| {
                    if name == *from {
                        field.name = to.clone();
                        (to.clone(), field)
                    } else {
                        (name, field)
                    }
                })
                .collect();
        }
        TypeBody::InputObject { fields } => {
            *fields = std::mem::take(fields)
                .into_iter()
                .map(|(name, mut field)| {
                    if name == *from {
                        field.name = to.clone();
                        (to.clone(), field)
                    } else {
                        (name, field)
                    }
                })
                .collect();
        }
        TypeBody::Scalar | TypeBody::Union { .. } | TypeBody::Enum { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::rewrite::Rewriter;
    use crate::schema::parse_schema;

    #[test]
    fn renaming_a_type_rewrites_every_reference() {
        let document = parse_schema(
            "a",
            r#"
            directive @owner(user: UserRef) on OBJECT
            type Query { me: User users(filter: UserRef): [User!]! node: Node }
            interface Node { id: ID! }
            type User implements Node { id: ID! friends: [[User]] }
            union Entity = User
            input UserRef { id: ID! }
            "#,
        )
        .unwrap();
        let rewritten = Rewriter::global(RewriteRule::RenameType {
            from: name!("User"),
            to: name!("Account"),
        })
        .apply(&document)
        .unwrap();
        let rewritten = Rewriter::global(RewriteRule::RenameType {
            from: name!("UserRef"),
            to: name!("AccountRef"),
        })
        .apply(&rewritten)
        .unwrap();

        let expected = parse_schema(
            "a",
            r#"
            directive @owner(user: AccountRef) on OBJECT
            type Query { me: Account users(filter: AccountRef): [Account!]! node: Node }
            interface Node { id: ID! }
            type Account implements Node { id: ID! friends: [[Account]] }
            union Entity = Account
            input AccountRef { id: ID! }
            "#,
        )
        .unwrap();
        assert_eq!(rewritten, expected);
    }

    #[test]
    fn renaming_an_interface_rewrites_implements_clauses() {
        let document = parse_schema(
            "a",
            "type Query { n: Node } interface Node { id: ID } type User implements Node { id: ID }",
        )
        .unwrap();
        let rewritten = Rewriter::global(RewriteRule::RenameType {
            from: name!("Node"),
            to: name!("Entity"),
        })
        .apply(&document)
        .unwrap();
        assert!(rewritten.get_type("User").unwrap().implements_interface("Entity"));
        assert_eq!(
            rewritten.types.keys().collect::<Vec<_>>(),
            vec!["Query", "Entity", "User"]
        );
    }

    #[test]
    fn renaming_a_type_onto_an_existing_name_collides() {
        let document = parse_schema("a", "type Query { a: A b: B } type A { a: Int } type B { b: Int }")
            .unwrap();
        for to in [name!("B"), name!("String")] {
            let errors = Rewriter::global(RewriteRule::RenameType {
                from: name!("A"),
                to: to.clone(),
            })
            .apply(&document)
            .unwrap_err();
            assert!(matches!(
                &errors[..],
                [RewriteError::TypeNameCollision { type_name, .. }] if *type_name == to
            ));
        }
    }

    #[test]
    fn renames_a_field_in_place() {
        let document = parse_schema("a", "type Query { a: Int b: Int c: Int }").unwrap();
        let rewritten = Rewriter::global(RewriteRule::RenameField {
            field: FieldReference::new(name!("Query"), name!("b")),
            to: name!("renamed"),
        })
        .apply(&document)
        .unwrap();
        assert_eq!(
            rewritten.get_type("Query").unwrap().field_names(),
            vec!["a", "renamed", "c"]
        );
    }

    #[test]
    fn renaming_a_field_reports_collisions_and_broken_contracts() {
        let document = parse_schema(
            "a",
            "type Query { n: Node } interface Node { id: ID } type User implements Node { id: ID name: String }",
        )
        .unwrap();

        let collision = Rewriter::global(RewriteRule::RenameField {
            field: FieldReference::new(name!("User"), name!("id")),
            to: name!("name"),
        })
        .apply(&document)
        .unwrap_err();
        assert!(matches!(
            &collision[..],
            [RewriteError::FieldNameCollision { .. }]
        ));

        let broken = Rewriter::global(RewriteRule::RenameField {
            field: FieldReference::new(name!("User"), name!("id")),
            to: name!("identifier"),
        })
        .apply(&document)
        .unwrap_err();
        insta::assert_snapshot!(broken[0].to_string(), @r###"RenameField(User.id -> identifier) on schema "a" failed: `User` implements `Node` but does not provide field `id`"###);
    }
}
