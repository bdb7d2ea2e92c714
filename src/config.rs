//! Declarative configuration files.
//!
//! Everything except predicate matchers can be declared in YAML or JSON and
//! built into [`Configuration`]s.

use crate::combine::combine;
use crate::matcher::Matcher;
use crate::model::{Configuration, Interceptors, TransformerEntry};
use crate::schema::Schema;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    /// Configuration version
    pub version: String,
    /// When set, all configurations are combined under this URL
    pub base_url: Option<String>,
    /// Configurations, in registration order
    pub configurations: Vec<ConfigurationDef>,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            base_url: None,
            configurations: vec![],
        }
    }
}

/// A configuration as declared in a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationDef {
    /// Base URL, or a relative URL when combined
    pub url: String,
    #[serde(default)]
    pub interceptors: InterceptorsDef,
}

/// Declared request and response entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterceptorsDef {
    #[serde(default)]
    pub requests: Vec<EntryDef>,
    #[serde(default)]
    pub responses: Vec<EntryDef>,
}

/// A declared matcher + schema entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDef {
    pub matcher: MatcherConfig,
    pub schema: Schema,
    #[serde(default)]
    pub data_selector: Option<String>,
}

/// Declared matcher: a bare string is a path template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatcherConfig {
    Template(String),
    Pattern(PatternMatcher),
}

/// Matcher with an explicit pattern type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatcher {
    /// The pattern to match
    pub pattern: String,
    /// Match type: path, regex
    #[serde(default, rename = "type")]
    pub pattern_type: PatternType,
}

/// Pattern matching type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Path template with `:name` segments
    #[default]
    Path,
    /// Regular expression
    Regex,
}

impl MorphConfig {
    /// Parse a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file, YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Compile the declared configurations.
    ///
    /// With a `base_url` the result is a single combined configuration, which
    /// carries no request entries.
    pub fn build(&self) -> Result<Vec<Configuration>, ConfigError> {
        let configurations = self
            .configurations
            .iter()
            .map(ConfigurationDef::build)
            .collect::<Result<Vec<_>, _>>()?;

        for configuration in configurations.iter().filter(|c| c.is_empty()) {
            warn!(url = %configuration.url, "Configuration declares no entries");
        }

        let Some(base_url) = &self.base_url else {
            return Ok(configurations);
        };

        for configuration in &configurations {
            if !configuration.interceptors.requests.is_empty() {
                warn!(
                    url = %configuration.url,
                    requests = configuration.interceptors.requests.len(),
                    "Request entries are not combined and will be ignored"
                );
            }
        }

        Ok(vec![combine(base_url, &configurations)])
    }
}

impl ConfigurationDef {
    /// Compile this configuration's entries.
    pub fn build(&self) -> Result<Configuration, ConfigError> {
        Ok(Configuration {
            url: self.url.clone(),
            interceptors: Interceptors {
                requests: self
                    .interceptors
                    .requests
                    .iter()
                    .map(EntryDef::build)
                    .collect::<Result<_, _>>()?,
                responses: self
                    .interceptors
                    .responses
                    .iter()
                    .map(EntryDef::build)
                    .collect::<Result<_, _>>()?,
            },
        })
    }
}

impl EntryDef {
    /// Compile this entry for either phase.
    pub fn build<S>(&self) -> Result<TransformerEntry<S>, ConfigError> {
        Ok(TransformerEntry {
            matcher: self.matcher.build()?,
            schema: self.schema.clone(),
            data_selector: self.data_selector.clone(),
        })
    }
}

impl MatcherConfig {
    /// Compile into a typed matcher.
    pub fn build<S>(&self) -> Result<Matcher<S>, ConfigError> {
        match self {
            Self::Template(template) => Ok(Matcher::path(template.clone())),
            Self::Pattern(PatternMatcher {
                pattern,
                pattern_type: PatternType::Path,
            }) => Ok(Matcher::path(pattern.clone())),
            Self::Pattern(PatternMatcher {
                pattern,
                pattern_type: PatternType::Regex,
            }) => Regex::new(pattern)
                .map(Matcher::Regex)
                .map_err(|source| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    source,
                }),
        }
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
