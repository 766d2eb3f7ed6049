//! Runs the composition pipeline for a [`StitchingBuilder`].

use apollo_compiler::ast;
use futures::future::join_all;
use tracing::Instrument;

use crate::StitchingBuilder;
use crate::acquisition;
use crate::error::AcquisitionError;
use crate::error::CompositionError;
use crate::error::ConfigurationError;
use crate::error::ExtensionError;
use crate::extension;
use crate::merge;
use crate::merge::MergedSchema;
use crate::merge::UNIFIED_SCHEMA_NAME;
use crate::rewrite;
use crate::rewrite::RewriteScope;
use crate::schema::SchemaDocument;
use crate::validation;

pub(crate) async fn compose(builder: &StitchingBuilder) -> Result<MergedSchema, CompositionError> {
    let span = tracing::info_span!(
        "compose",
        schemas = builder.schemas.len(),
        rewriters = builder.rewriters.len()
    );
    run(builder).instrument(span).await
}

async fn run(builder: &StitchingBuilder) -> Result<MergedSchema, CompositionError> {
    check_configuration(builder).map_err(CompositionError::Configuration)?;

    let extension_sources = join_all(builder.extensions.iter().map(|(schema, source)| {
        let owner = schema.as_deref().unwrap_or(UNIFIED_SCHEMA_NAME);
        async move { (schema.as_deref(), acquisition::load_extension(owner, source).await) }
    }));
    let (documents, extension_sources) = futures::join!(
        acquisition::acquire_all(&builder.schemas),
        extension_sources
    );
    let documents = documents.map_err(CompositionError::Acquisition)?;

    let mut loading_errors: Vec<AcquisitionError> = Vec::new();
    let mut scoped = Vec::new();
    let mut global = Vec::new();
    for (schema, result) in extension_sources {
        match result {
            Ok(sdl) => match schema {
                Some(schema) => scoped.push((schema, sdl)),
                None => global.push(sdl),
            },
            Err(error) => loading_errors.push(error),
        }
    }
    if !loading_errors.is_empty() {
        return Err(CompositionError::Acquisition(loading_errors));
    }
    tracing::debug!(documents = documents.len(), "acquired all schemas");

    let documents = extend_schemas(documents, &scoped).map_err(CompositionError::Extension)?;

    let documents = rewrite::rewrite_all(documents, &builder.rewriters)
        .map_err(CompositionError::Rewrite)?;
    tracing::debug!("rewrote all schemas");

    let MergedSchema {
        document,
        mut origins,
    } = merge::merge_schemas(documents, &builder.handlers).map_err(CompositionError::Merge)?;

    let document = if global.is_empty() {
        document
    } else {
        let extended = parse_all(UNIFIED_SCHEMA_NAME, global.iter().map(String::as_str))
            .and_then(|extensions| extension::apply_extensions(&document, &extensions))
            .map_err(CompositionError::Extension)?;
        origins.record_additions(&extended);
        extended
    };

    validation::validate(&document).map_err(CompositionError::Validation)?;
    tracing::info!(types = document.types.len(), "composed unified schema");
    Ok(MergedSchema { document, origins })
}

/// Reports what was rejected while registering, then every rule and extension that targets a
/// schema that was never registered.
fn check_configuration(builder: &StitchingBuilder) -> Result<(), Vec<ConfigurationError>> {
    let mut errors = builder.errors.clone();
    let registered = |schema: &str| builder.schemas.iter().any(|(name, _)| name == schema);

    for rewriter in &builder.rewriters {
        if let RewriteScope::Schema(schema) = &rewriter.scope
            && !registered(schema)
        {
            errors.push(ConfigurationError::UnknownSchema {
                schema: schema.clone(),
                rule: rewriter.rule.to_string(),
            });
        }
    }
    for schema in builder.extensions.iter().filter_map(|(schema, _)| schema.as_ref()) {
        if !registered(schema) {
            errors.push(ConfigurationError::UnknownSchema {
                schema: schema.clone(),
                rule: "an extension".to_owned(),
            });
        }
    }
    if builder.schemas.is_empty() {
        errors.push(ConfigurationError::NoSchemas);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Applies the scoped extensions of each document, in registration order.
fn extend_schemas(
    documents: Vec<SchemaDocument>,
    extensions: &[(&str, String)],
) -> Result<Vec<SchemaDocument>, Vec<ExtensionError>> {
    let mut errors = Vec::new();
    let mut extended = Vec::with_capacity(documents.len());
    for document in documents {
        let sources = extensions
            .iter()
            .filter(|(schema, _)| *schema == document.name())
            .map(|(_, sdl)| sdl.as_str());
        let result = parse_all(document.name(), sources)
            .and_then(|parsed| extension::apply_extensions(&document, &parsed));
        match result {
            Ok(document) => extended.push(document),
            Err(failures) => errors.extend(failures),
        }
    }
    if errors.is_empty() {
        Ok(extended)
    } else {
        Err(errors)
    }
}

/// Parses every extension, collecting all parse errors.
fn parse_all<'a>(
    target: &str,
    sources: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<ast::Document>, Vec<ExtensionError>> {
    let mut documents = Vec::new();
    let mut errors = Vec::new();
    for sdl in sources {
        match extension::parse_extension(target, sdl) {
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
