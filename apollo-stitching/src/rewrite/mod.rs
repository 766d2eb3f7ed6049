//! Rewriting schema documents before they are merged.
//!
//! A [`Rewriter`] pairs a [`RewriteRule`] with the [`RewriteScope`] it applies to. Rewriters
//! run per document in registration order, so a rule sees the output of every rule before
//! it. Each rule runs against a scratch copy of the document that only replaces it when the
//! rule succeeded.

use std::fmt;

use apollo_compiler::Name;

use crate::error::RewriteError;
use crate::schema::RootOperation;
use crate::schema::SchemaDocument;
use crate::utils::logging::snapshot;
use crate::validation;

mod remove;
mod rename;

/// A field of a type, optionally qualified by the schema that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldReference {
    pub schema: Option<String>,
    pub type_name: Name,
    pub field_name: Name,
}

impl FieldReference {
    pub fn new(type_name: Name, field_name: Name) -> Self {
        Self {
            schema: None,
            type_name,
            field_name,
        }
    }

    /// Qualifies the reference with a schema name.
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// A single transformation of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// Removes a type and everything that cannot exist without it.
    RemoveType { type_name: Name },
    /// Removes one field.
    RemoveField { field: FieldReference },
    /// Removes the query, mutation and subscription types.
    RemoveRootTypes,
    /// Renames a type and every reference to it.
    RenameType { from: Name, to: Name },
    /// Renames one field.
    RenameField { field: FieldReference, to: Name },
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteRule::RemoveType { type_name } => write!(f, "RemoveType({type_name})"),
            RewriteRule::RemoveField { field } => write!(f, "RemoveField({field})"),
            RewriteRule::RemoveRootTypes => write!(f, "RemoveRootTypes"),
            RewriteRule::RenameType { from, to } => write!(f, "RenameType({from} -> {to})"),
            RewriteRule::RenameField { field, to } => write!(f, "RenameField({field} -> {to})"),
        }
    }
}

/// The documents a [`Rewriter`] applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteScope {
    /// Every document. Documents that lack the rule's target are skipped.
    Global,
    /// Only the document registered under this schema name.
    Schema(String),
}

impl RewriteScope {
    pub fn includes(&self, schema_name: &str) -> bool {
        match self {
            RewriteScope::Global => true,
            RewriteScope::Schema(name) => name == schema_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewriter {
    pub scope: RewriteScope,
    pub rule: RewriteRule,
}

impl Rewriter {
    pub fn global(rule: RewriteRule) -> Self {
        Self {
            scope: RewriteScope::Global,
            rule,
        }
    }

    pub fn scoped(schema: impl Into<String>, rule: RewriteRule) -> Self {
        Self {
            scope: RewriteScope::Schema(schema.into()),
            rule,
        }
    }

    /// Applies the rule to `document`, ignoring the scope.
    ///
    /// The input is never modified. On success the rewritten copy is returned.
    pub fn apply(&self, document: &SchemaDocument) -> Result<SchemaDocument, Vec<RewriteError>> {
        match apply_rule(&self.rule, document) {
            Outcome::Applied(rewritten) => Ok(rewritten),
            Outcome::TargetMissing(error) => Err(vec![error]),
            Outcome::Failed(errors) => Err(errors),
        }
    }
}

pub(crate) enum Outcome {
    Applied(SchemaDocument),
    /// The type or field the rule targets does not exist in the document.
    TargetMissing(RewriteError),
    Failed(Vec<RewriteError>),
}

fn apply_rule(rule: &RewriteRule, document: &SchemaDocument) -> Outcome {
    let mut scratch = document.clone();
    let result = match rule {
        RewriteRule::RemoveType { type_name } => remove::remove_type(&mut scratch, rule, type_name),
        RewriteRule::RemoveField { field } => remove::remove_field(&mut scratch, rule, field),
        RewriteRule::RemoveRootTypes => {
            remove::remove_root_types(&mut scratch);
            Ok(())
        }
        RewriteRule::RenameType { from, to } => rename::rename_type(&mut scratch, rule, from, to),
        RewriteRule::RenameField { field, to } => {
            rename::rename_field(&mut scratch, rule, field, to)
        }
    };
    if let Err(outcome) = result {
        return outcome;
    }

    let breakage = new_violations(rule, document, &scratch);
    if !breakage.is_empty() {
        return Outcome::Failed(breakage);
    }
    tracing::debug!(schema = document.name(), %rule, "applied rewrite rule");
    Outcome::Applied(scratch)
}

/// Violations present after the rule that were not present before it.
fn new_violations(
    rule: &RewriteRule,
    before: &SchemaDocument,
    after: &SchemaDocument,
) -> Vec<RewriteError> {
    let existing = validation::check(before);
    validation::check(after)
        .into_iter()
        .filter(|violation| !existing.contains(violation))
        .map(|cause| RewriteError::StructuralBreakage {
            schema: before.name().to_owned(),
            rule: rule.to_string(),
            cause,
        })
        .collect()
}

/// Applies `rewriters` to every document, then renames root operation types to their
/// canonical names.
///
/// Every failure across all documents is collected. A global rule that applied to none of
/// the documents is reported as [`RewriteError::Unmatched`].
pub fn rewrite_all(
    documents: Vec<SchemaDocument>,
    rewriters: &[Rewriter],
) -> Result<Vec<SchemaDocument>, Vec<RewriteError>> {
    let mut matched = vec![false; rewriters.len()];
    let mut errors = Vec::new();
    let mut rewritten = Vec::with_capacity(documents.len());

    for mut document in documents {
        for (index, rewriter) in rewriters.iter().enumerate() {
            if !rewriter.scope.includes(document.name()) {
                continue;
            }
            match apply_rule(&rewriter.rule, &document) {
                Outcome::Applied(next) => {
                    matched[index] = true;
                    document = next;
                }
                Outcome::TargetMissing(error) => match rewriter.scope {
                    RewriteScope::Global => {
                        tracing::debug!(
                            schema = document.name(),
                            rule = %rewriter.rule,
                            "skipping global rule, target not present"
                        );
                    }
                    RewriteScope::Schema(_) => {
                        matched[index] = true;
                        errors.push(error);
                    }
                },
                Outcome::Failed(failures) => {
                    matched[index] = true;
                    errors.extend(failures);
                }
            }
        }
        match normalize_root_types(&document) {
            Ok(normalized) => {
                snapshot!("rewritten", normalized.to_sdl(), "rewritten document");
                rewritten.push(normalized);
            }
            Err(failures) => errors.extend(failures),
        }
    }

    for (rewriter, matched) in rewriters.iter().zip(matched) {
        if !matched {
            tracing::warn!(rule = %rewriter.rule, "rewrite rule did not match any schema");
            errors.push(RewriteError::Unmatched {
                rule: rewriter.rule.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(rewritten)
    } else {
        Err(errors)
    }
}

/// Renames root operation types to `Query`, `Mutation` and `Subscription`.
pub(crate) fn normalize_root_types(
    document: &SchemaDocument,
) -> Result<SchemaDocument, Vec<RewriteError>> {
    let mut document = document.clone();
    for operation in RootOperation::ALL {
        let canonical = operation.canonical_type_name();
        let Some(current) = document.root_operations.get(operation).cloned() else {
            continue;
        };
        if current == canonical {
            continue;
        }
        let rewriter = Rewriter::global(RewriteRule::RenameType {
            from: current,
            to: canonical,
        });
        document = rewriter.apply(&document)?;
    }
    Ok(document)
}
