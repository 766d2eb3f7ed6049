//! Declarative composition configuration.
//!
//! Everything the [`StitchingBuilder`](crate::StitchingBuilder) can register, except remote
//! schemas and custom merge handlers, can also be described in YAML:
//!
//! ```yaml
//! schemas:
//!   - name: accounts
//!     file: ./accounts.graphql
//!   - name: reviews
//!     sdl: "type Query { reviews: [String] }"
//! extensions:
//!   - schema: accounts
//!     sdl: "extend type User { nickname: String }"
//! rewrites:
//!   - rename_type: { schema: accounts, from: User, to: Account }
//!   - remove_root_types: { schema: reviews }
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::acquisition::ExtensionSource;
use crate::acquisition::SchemaSource;
use crate::error::ConfigurationError;

/// The root of a composition configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// The schemas to compose, in order.
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,

    /// Extension documents. Extensions without a schema are applied to the unified schema.
    #[serde(default)]
    pub extensions: Vec<ExtensionConfig>,

    /// Rewrite rules, applied in order.
    #[serde(default)]
    pub rewrites: Vec<RewriteConfig>,
}

/// A schema and where to load it from. Exactly one of `sdl` and `file` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// The name the schema is registered under.
    pub name: String,
    /// Inline SDL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdl: Option<String>,
    /// Path to a file containing SDL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// An extension document. Exactly one of `sdl` and `file` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
    /// The schema to extend. Global when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// A rewrite rule. Rules without a schema apply to every schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum RewriteConfig {
    RemoveType {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        #[serde(rename = "type")]
        type_name: String,
    },
    RemoveField {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        #[serde(rename = "type")]
        type_name: String,
        field: String,
    },
    RemoveRootTypes {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
    },
    RenameType {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        from: String,
        to: String,
    },
    RenameField {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        #[serde(rename = "type")]
        type_name: String,
        field: String,
        to: String,
    },
}

impl Configuration {
    /// The JSON schema of the configuration file, for editor support.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s).map_err(|e| ConfigurationError::Deserialize(e.to_string()))
    }
}

impl SchemaConfig {
    pub(crate) fn source(&self) -> Result<SchemaSource, ConfigurationError> {
        match (&self.sdl, &self.file) {
            (Some(sdl), None) => Ok(SchemaSource::Sdl(sdl.clone())),
            (None, Some(file)) => Ok(SchemaSource::File(file.clone())),
            _ => Err(ConfigurationError::InvalidSource {
                what: format!("schema \"{}\"", self.name),
            }),
        }
    }
}

impl ExtensionConfig {
    pub(crate) fn source(&self) -> Result<ExtensionSource, ConfigurationError> {
        match (&self.sdl, &self.file) {
            (Some(sdl), None) => Ok(ExtensionSource::Sdl(sdl.clone())),
            (None, Some(file)) => Ok(ExtensionSource::File(file.clone())),
            _ => Err(ConfigurationError::InvalidSource {
                what: match &self.schema {
                    Some(schema) => format!("an extension of schema \"{schema}\""),
                    None => "a global extension".to_owned(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_yaml() {
        let configuration: Configuration = r#"
schemas:
  - name: accounts
    file: ./accounts.graphql
  - name: reviews
    sdl: "type Query { reviews: [String] }"
extensions:
  - sdl: "extend type Query { version: String }"
rewrites:
  - rename_type: { schema: accounts, from: User, to: Account }
  - remove_field: { type: Query, field: internal }
  - remove_root_types: {}
"#
        .parse()
        .unwrap();

        assert_eq!(configuration.schemas.len(), 2);
        assert_eq!(
            configuration.schemas[0].file,
            Some(PathBuf::from("./accounts.graphql"))
        );
        assert_eq!(configuration.extensions[0].schema, None);
        assert_eq!(
            configuration.rewrites,
            vec![
                RewriteConfig::RenameType {
                    schema: Some("accounts".to_owned()),
                    from: "User".to_owned(),
                    to: "Account".to_owned(),
                },
                RewriteConfig::RemoveField {
                    schema: None,
                    type_name: "Query".to_owned(),
                    field: "internal".to_owned(),
                },
                RewriteConfig::RemoveRootTypes { schema: None },
            ]
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = "schemas:\n  - name: a\n    url: http://localhost\n"
            .parse::<Configuration>()
            .unwrap_err();
        assert!(matches!(error, ConfigurationError::Deserialize(_)));
    }

    #[test]
    fn sources_need_exactly_one_of_sdl_and_file() {
        let both = SchemaConfig {
            name: "a".to_owned(),
            sdl: Some("type Query { a: Int }".to_owned()),
            file: Some(PathBuf::from("a.graphql")),
        };
        insta::assert_snapshot!(both.source().unwrap_err().to_string(), @r###"schema "a" must have exactly one of `sdl` or `file`"###);
    }

    #[test]
    fn exports_a_json_schema() {
        let schema = serde_json::to_value(Configuration::json_schema()).unwrap();
        assert_eq!(schema["title"], "Configuration");
        assert!(schema["properties"]["rewrites"].is_object());
    }
}
