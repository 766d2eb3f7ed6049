//! Producing schema documents from their sources.
//!
//! This is the only stage that performs I/O. All sources are acquired concurrently and the
//! results are returned in registration order.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::Instrument;

use crate::error::AcquisitionError;
use crate::schema::SchemaDocument;
use crate::schema::parse_schema;

mod introspection;

pub use introspection::INTROSPECTION_QUERY;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Sends the introspection request to a remote schema and returns the raw response body.
///
/// How the request reaches the remote service (HTTP client, headers, retries) is up to the
/// implementation.
#[async_trait]
pub trait IntrospectionTransport: Send + Sync {
    async fn execute(
        &self,
        schema_name: &str,
        request: serde_json::Value,
    ) -> Result<String, BoxError>;
}

/// Where a schema comes from.
#[derive(Clone)]
pub enum SchemaSource {
    /// SDL text.
    Sdl(String),
    /// A file containing SDL.
    File(PathBuf),
    /// A remote schema, introspected through the given transport.
    Introspection(Arc<dyn IntrospectionTransport>),
}

impl fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Sdl(sdl) => f.debug_tuple("Sdl").field(&sdl.len()).finish(),
            SchemaSource::File(path) => f.debug_tuple("File").field(path).finish(),
            SchemaSource::Introspection(_) => f.write_str("Introspection"),
        }
    }
}

/// Where an extension document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSource {
    Sdl(String),
    File(PathBuf),
}

/// Produces the document for one schema.
pub async fn acquire(
    schema_name: &str,
    source: &SchemaSource,
) -> Result<SchemaDocument, AcquisitionError> {
    let document = match source {
        SchemaSource::Sdl(sdl) => parse_schema(schema_name, sdl)?,
        SchemaSource::File(path) => {
            let sdl = read_file(schema_name, path).await?;
            parse_schema(schema_name, &sdl)?
        }
        SchemaSource::Introspection(transport) => {
            let response = transport
                .execute(schema_name, introspection::introspection_request())
                .await
                .map_err(|e| AcquisitionError::Transport {
                    schema: schema_name.to_owned(),
                    message: e.to_string(),
                })?;
            introspection::from_introspection(schema_name, &response)?
        }
    };
    tracing::debug!(
        schema = schema_name,
        types = document.types.len(),
        "acquired schema"
    );
    Ok(document)
}

/// Acquires every schema concurrently. Results keep the order of `schemas`.
///
/// Every failure is reported, not just the first.
pub async fn acquire_all(
    schemas: &[(String, SchemaSource)],
) -> Result<Vec<SchemaDocument>, Vec<AcquisitionError>> {
    let results = join_all(schemas.iter().map(|(schema_name, source)| {
        acquire(schema_name, source)
            .instrument(tracing::info_span!("acquire", schema = %schema_name))
    }))
    .await;

    let mut documents = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(document) => documents.push(document),
            Err(error) => errors.push(error),
        }
    }
    if errors.is_empty() {
        Ok(documents)
    } else {
        Err(errors)
    }
}

/// Loads the text of an extension document. `owner` names the schema it applies to and only
/// appears in error messages.
pub(crate) async fn load_extension(
    owner: &str,
    source: &ExtensionSource,
) -> Result<String, AcquisitionError> {
    match source {
        ExtensionSource::Sdl(sdl) => Ok(sdl.clone()),
        ExtensionSource::File(path) => read_file(owner, path).await,
    }
}

async fn read_file(schema_name: &str, path: &Path) -> Result<String, AcquisitionError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AcquisitionError::FileUnreadable {
            schema: schema_name.to_owned(),
            path: path.display().to_string(),
            source,
        })
}
