use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;

/// Options as they appear in the plugin's JSON config (`.swcrc` / `next.config.js`).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginOptions {
    pub import_sources: Vec<String>,
    pub only_match_import_suffix: bool,
    pub import_source_pattern: Option<String>,
    pub gql_tag_identifiers: Vec<String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            import_sources: vec!["graphql-tag".to_string()],
            only_match_import_suffix: false,
            import_source_pattern: None,
            gql_tag_identifiers: vec!["gql".to_string()],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub tag_identifiers: Vec<String>,
    import_source: Regex,
}

impl Config {
    pub fn from_options(options: PluginOptions) -> Result<Self, ConfigError> {
        let pattern = match options.import_source_pattern {
            Some(pattern) => pattern,
            None => {
                let alternatives = options
                    .import_sources
                    .iter()
                    .map(|s| regex::escape(s))
                    .collect::<Vec<_>>()
                    .join("|");
                if options.only_match_import_suffix {
                    format!("(?:^|/)(?:{alternatives})$")
                } else {
                    format!("^(?:{alternatives})$")
                }
            }
        };

        Ok(Self {
            tag_identifiers: options.gql_tag_identifiers,
            import_source: Regex::new(&pattern)?,
        })
    }

    /// Parse the raw plugin config string. Malformed JSON falls back to the defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let options = serde_json::from_str::<PluginOptions>(raw).unwrap_or_else(|err| {
            tracing::warn!("ignoring unreadable graphql-tag plugin config: {err}");
            PluginOptions::default()
        });
        Self::from_options(options)
    }

    pub fn is_import_source(&self, source: &str) -> bool {
        self.import_source.is_match(source)
    }

    pub fn is_tag_identifier(&self, name: &str) -> bool {
        self.tag_identifiers.iter().any(|t| t == name)
    }
}
