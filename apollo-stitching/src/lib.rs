//! ## Usage
//!
//! Composes independently authored GraphQL schemas into one unified schema.
//!
//! Schemas are registered on a [`StitchingBuilder`] from SDL text, files or remote
//! introspection, optionally extended with additional type system documents, rewritten
//! (types and fields removed or renamed) and finally merged. The result is a
//! [`MergedSchema`]: the unified type system plus an [`OriginMap`] recording which source
//! schemas contributed each type and field, so a delegation layer knows where to route
//! execution.
//!
//! ```no_run
//! # async fn run() -> Result<(), apollo_stitching::CompositionError> {
//! use apollo_stitching::StitchingBuilder;
//!
//! let merged = StitchingBuilder::new()
//!     .add_schema_from_string("accounts", "type Query { me: User } type User { id: ID! }")
//!     .add_schema_from_string("reviews", "type Query { reviews: [String] }")
//!     .rename_type_of("accounts", "User", "Account")
//!     .compose()
//!     .await?;
//! println!("{}", merged.to_sdl());
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! Acquisition → extension application → rewriting (per schema) → merge → validation.
//! Only acquisition performs I/O and runs concurrently; every later stage is sequential and
//! deterministic, and its output depends only on registration order.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod acquisition;
mod builder;
mod composition;
pub mod configuration;
pub mod error;
pub mod extension;
pub mod merge;
pub mod rewrite;
pub mod schema;
pub(crate) mod utils;
pub mod validation;

pub use crate::acquisition::IntrospectionTransport;
pub use crate::acquisition::SchemaSource;
pub use crate::builder::StitchingBuilder;
pub use crate::error::CompositionError;
pub use crate::merge::MergeCandidate;
pub use crate::merge::MergedSchema;
pub use crate::merge::OriginMap;
pub use crate::merge::TypeMergeHandler;
pub use crate::rewrite::FieldReference;
pub use crate::rewrite::RewriteRule;
pub use crate::rewrite::RewriteScope;
pub use crate::rewrite::Rewriter;
pub use crate::schema::SchemaDocument;
pub use crate::schema::TypeDefinition;
pub use crate::schema::TypeKind;

const _: () = {
    const fn assert_thread_safe<T: Sync + Send>() {}

    assert_thread_safe::<MergedSchema>();
    assert_thread_safe::<StitchingBuilder>();
};
