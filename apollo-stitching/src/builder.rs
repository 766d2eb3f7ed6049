use std::path::PathBuf;
use std::sync::Arc;

use apollo_compiler::Name;

use crate::acquisition::ExtensionSource;
use crate::acquisition::IntrospectionTransport;
use crate::acquisition::SchemaSource;
use crate::composition;
use crate::configuration::Configuration;
use crate::configuration::RewriteConfig;
use crate::error::CompositionError;
use crate::error::ConfigurationError;
use crate::error::MergeConflict;
use crate::merge::MergeCandidate;
use crate::merge::MergeHandlerRegistry;
use crate::merge::MergedSchema;
use crate::merge::TypeMergeHandler;
use crate::rewrite::FieldReference;
use crate::rewrite::RewriteRule;
use crate::rewrite::Rewriter;
use crate::schema::TypeDefinition;
use crate::schema::TypeKind;

/// Registers schemas, extensions, rewrite rules and merge handlers, then composes them.
///
/// Every method returns the builder so registrations can be chained. Invalid arguments do not
/// panic: they are recorded and [`compose`](Self::compose) reports all of them as a
/// [`CompositionError::Configuration`].
#[derive(Debug, Clone, Default)]
pub struct StitchingBuilder {
    pub(crate) schemas: Vec<(String, SchemaSource)>,
    pub(crate) extensions: Vec<(Option<String>, ExtensionSource)>,
    pub(crate) rewriters: Vec<Rewriter>,
    pub(crate) handlers: MergeHandlerRegistry,
    pub(crate) errors: Vec<ConfigurationError>,
}

impl StitchingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays a declarative [`Configuration`] through the builder.
    pub fn from_configuration(configuration: &Configuration) -> Self {
        let mut builder = Self::new();
        for schema in &configuration.schemas {
            match schema.source() {
                Ok(source) => builder = builder.add_schema(&schema.name, source),
                Err(error) => builder.errors.push(error),
            }
        }
        for extension in &configuration.extensions {
            match extension.source() {
                Ok(source) => {
                    builder = builder.add_extension(extension.schema.as_deref(), source)
                }
                Err(error) => builder.errors.push(error),
            }
        }
        for rewrite in &configuration.rewrites {
            builder = match rewrite {
                RewriteConfig::RemoveType { schema, type_name } => match schema {
                    Some(schema) => builder.ignore_type_of(schema, type_name),
                    None => builder.ignore_type(type_name),
                },
                RewriteConfig::RemoveField {
                    schema,
                    type_name,
                    field,
                } => match builder.field_reference(type_name, field) {
                    Some(field) => builder
                        .add_rewriter(schema.as_deref(), RewriteRule::RemoveField { field }),
                    None => builder,
                },
                RewriteConfig::RemoveRootTypes { schema } => match schema {
                    Some(schema) => builder.ignore_root_types_of(schema),
                    None => builder.ignore_root_types(),
                },
                RewriteConfig::RenameType { schema, from, to } => match schema {
                    Some(schema) => builder.rename_type_of(schema, from, to),
                    None => builder.rename_type(from, to),
                },
                RewriteConfig::RenameField {
                    schema,
                    type_name,
                    field,
                    to,
                } => match (builder.field_reference(type_name, field), builder.name(to)) {
                    (Some(field), Some(to)) => builder.add_rewriter(
                        schema.as_deref(),
                        RewriteRule::RenameField { field, to },
                    ),
                    _ => builder,
                },
            };
        }
        builder
    }

    /// Registers a schema given as SDL text.
    pub fn add_schema_from_string(self, name: &str, sdl: impl Into<String>) -> Self {
        let sdl = sdl.into();
        if sdl.trim().is_empty() {
            return self.reject(ConfigurationError::EmptyArgument {
                what: format!("the SDL of schema \"{name}\""),
            });
        }
        self.add_schema(name, SchemaSource::Sdl(sdl))
    }

    /// Registers a schema read from an SDL file.
    pub fn add_schema_from_file(self, name: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return self.reject(ConfigurationError::EmptyArgument {
                what: format!("the file path of schema \"{name}\""),
            });
        }
        self.add_schema(name, SchemaSource::File(path))
    }

    /// Registers a remote schema, fetched with the introspection query through `transport`.
    pub fn add_schema_from_introspection(
        self,
        name: &str,
        transport: Arc<dyn IntrospectionTransport>,
    ) -> Self {
        self.add_schema(name, SchemaSource::Introspection(transport))
    }

    /// Registers a schema from any source.
    pub fn add_schema(mut self, name: &str, source: SchemaSource) -> Self {
        if name.is_empty() {
            return self.reject(ConfigurationError::EmptySchemaName);
        }
        if self.schemas.iter().any(|(existing, _)| existing == name) {
            return self.reject(ConfigurationError::DuplicateSchema(name.to_owned()));
        }
        self.schemas.push((name.to_owned(), source));
        self
    }

    /// Registers an extension document applied to the unified schema after merging.
    pub fn add_extensions_from_string(self, sdl: impl Into<String>) -> Self {
        self.add_extension_from_string(None, sdl.into())
    }

    /// Registers an extension file applied to the unified schema after merging.
    pub fn add_extensions_from_file(self, path: impl Into<PathBuf>) -> Self {
        self.add_extension_from_file(None, path.into())
    }

    /// Registers an extension document applied to one schema before rewriting.
    pub fn add_schema_extensions_from_string(self, schema: &str, sdl: impl Into<String>) -> Self {
        self.add_extension_from_string(Some(schema), sdl.into())
    }

    /// Registers an extension file applied to one schema before rewriting.
    pub fn add_schema_extensions_from_file(self, schema: &str, path: impl Into<PathBuf>) -> Self {
        self.add_extension_from_file(Some(schema), path.into())
    }

    /// Removes the root operation types of every schema.
    pub fn ignore_root_types(self) -> Self {
        self.add_rewriter(None, RewriteRule::RemoveRootTypes)
    }

    /// Removes the root operation types of one schema.
    pub fn ignore_root_types_of(self, schema: &str) -> Self {
        self.add_rewriter(Some(schema), RewriteRule::RemoveRootTypes)
    }

    /// Removes a type from every schema that defines it.
    pub fn ignore_type(self, type_name: &str) -> Self {
        self.ignore_type_in(None, type_name)
    }

    /// Removes a type from one schema.
    pub fn ignore_type_of(self, schema: &str, type_name: &str) -> Self {
        self.ignore_type_in(Some(schema), type_name)
    }

    /// Removes a field from one schema.
    pub fn ignore_field(self, schema: &str, field: FieldReference) -> Self {
        self.add_rewriter(Some(schema), RewriteRule::RemoveField { field })
    }

    /// Renames a type in every schema that defines it.
    pub fn rename_type(self, from: &str, to: &str) -> Self {
        self.rename_type_in(None, from, to)
    }

    /// Renames a type in one schema.
    pub fn rename_type_of(self, schema: &str, from: &str, to: &str) -> Self {
        self.rename_type_in(Some(schema), from, to)
    }

    /// Renames a field. The rule is scoped to `field.schema` when it is set.
    pub fn rename_field(self, field: FieldReference, to: &str) -> Self {
        let schema = field.schema.clone();
        self.rename_field_in(schema.as_deref(), field, to)
    }

    /// Renames a field in one schema.
    pub fn rename_field_of(self, schema: &str, field: FieldReference, to: &str) -> Self {
        self.rename_field_in(Some(schema), field, to)
    }

    /// Registers a merge handler for `kind`. The handler with the highest priority is used;
    /// the built-in handlers have priority [`i32::MIN`].
    pub fn add_merge_handler(
        mut self,
        kind: TypeKind,
        priority: i32,
        handler: Arc<dyn TypeMergeHandler>,
    ) -> Self {
        self.handlers.register(kind, priority, handler);
        self
    }

    /// Registers a closure as a merge handler for `kind`.
    pub fn add_merge_handler_fn<F>(mut self, kind: TypeKind, priority: i32, handler: F) -> Self
    where
        F: Fn(&Name, &[MergeCandidate<'_>]) -> Result<TypeDefinition, MergeConflict>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.register_fn(kind, priority, handler);
        self
    }

    /// Acquires, extends, rewrites, merges and validates every registered schema.
    pub async fn compose(&self) -> Result<MergedSchema, CompositionError> {
        composition::compose(self).await
    }

    fn reject(mut self, error: ConfigurationError) -> Self {
        self.errors.push(error);
        self
    }

    fn name(&mut self, name: &str) -> Option<Name> {
        if name.is_empty() {
            self.errors.push(ConfigurationError::EmptyArgument {
                what: "type and field names".to_owned(),
            });
            return None;
        }
        match Name::new(name) {
            Ok(name) => Some(name),
            Err(_) => {
                self.errors.push(ConfigurationError::InvalidName {
                    name: name.to_owned(),
                });
                None
            }
        }
    }

    fn field_reference(&mut self, type_name: &str, field_name: &str) -> Option<FieldReference> {
        let type_name = self.name(type_name);
        let field_name = self.name(field_name);
        Some(FieldReference::new(type_name?, field_name?))
    }

    fn add_extension(self, schema: Option<&str>, source: ExtensionSource) -> Self {
        match source {
            ExtensionSource::Sdl(sdl) => self.add_extension_from_string(schema, sdl),
            ExtensionSource::File(path) => self.add_extension_from_file(schema, path),
        }
    }

    fn add_extension_from_string(mut self, schema: Option<&str>, sdl: String) -> Self {
        if sdl.trim().is_empty() {
            return self.reject(ConfigurationError::EmptyArgument {
                what: "extension SDL".to_owned(),
            });
        }
        if schema.is_some_and(str::is_empty) {
            return self.reject(ConfigurationError::EmptySchemaName);
        }
        self.extensions
            .push((schema.map(str::to_owned), ExtensionSource::Sdl(sdl)));
        self
    }

    fn add_extension_from_file(mut self, schema: Option<&str>, path: PathBuf) -> Self {
        if path.as_os_str().is_empty() {
            return self.reject(ConfigurationError::EmptyArgument {
                what: "extension file path".to_owned(),
            });
        }
        if schema.is_some_and(str::is_empty) {
            return self.reject(ConfigurationError::EmptySchemaName);
        }
        self.extensions
            .push((schema.map(str::to_owned), ExtensionSource::File(path)));
        self
    }

    fn ignore_type_in(mut self, schema: Option<&str>, type_name: &str) -> Self {
        match self.name(type_name) {
            Some(type_name) => self.add_rewriter(schema, RewriteRule::RemoveType { type_name }),
            None => self,
        }
    }

    fn rename_type_in(mut self, schema: Option<&str>, from: &str, to: &str) -> Self {
        match (self.name(from), self.name(to)) {
            (Some(from), Some(to)) => self.add_rewriter(schema, RewriteRule::RenameType { from, to }),
            _ => self,
        }
    }

    fn rename_field_in(mut self, schema: Option<&str>, field: FieldReference, to: &str) -> Self {
        match self.name(to) {
            Some(to) => self.add_rewriter(schema, RewriteRule::RenameField { field, to }),
            None => self,
        }
    }

    /// Registers `rule`, globally when `schema` is `None`.
    fn add_rewriter(mut self, schema: Option<&str>, rule: RewriteRule) -> Self {
        let rewriter = match schema {
            None => Rewriter::global(rule),
            Some("") => return self.reject(ConfigurationError::EmptySchemaName),
            Some(schema) => Rewriter::scoped(schema, rule),
        };
        self.rewriters.push(rewriter);
        self
    }
}
