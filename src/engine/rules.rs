//! Rule records as they appear in the Matomo YAML files. The compiled
//! parsers carry these payloads as-is; only the pattern is taken out.

use indexmap::IndexMap;
use serde::Deserialize;

/// A pattern plus whatever its file attaches to it.
#[derive(Debug, Deserialize)]
pub(crate) struct Rule<T> {
    pub regex: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Rule<T> {
    pub fn into_pair(self) -> (String, T) {
        (self.regex, self.data)
    }
}

/// `bots.yml`
#[derive(Debug, Deserialize)]
pub(crate) struct BotRule {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub producer: Option<Producer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Producer {
    pub name: Option<String>,
    pub url: Option<String>,
}

/// `oss.yml`; `version` is a `$n` template.
#[derive(Debug, Deserialize)]
pub(crate) struct OsRule {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// `client/*.yml`. Only browsers carry `engine`.
#[derive(Debug, Deserialize)]
pub(crate) struct ClientRule {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub engine: Option<EngineRef>,
}

impl ClientRule {
    pub fn default_engine(&self) -> Option<&str> {
        self.engine.as_ref()?.default.as_deref()
    }

    /// Browser version threshold → engine name, in file order.
    pub fn engine_versions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.engine
            .iter()
            .filter_map(|e| e.versions.as_ref())
            .flatten()
            .map(|(threshold, name)| (threshold.as_str(), name.as_str()))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EngineRef {
    pub default: Option<String>,
    #[serde(default)]
    pub versions: Option<IndexMap<String, String>>,
}

/// `client/browser_engine.yml`
#[derive(Debug, Deserialize)]
pub(crate) struct EngineRule {
    pub name: String,
}

/// One brand in a `device/*.yml` file. Brands without a pattern are
/// skipped.
#[derive(Debug, Deserialize)]
pub(crate) struct BrandRule {
    pub regex: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub models: Vec<Rule<ModelRule>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelRule {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    /// Overrides the brand for this model only.
    #[serde(default)]
    pub brand: Option<String>,
}

/// Brand name → rule, in file order (first match wins).
pub(crate) type BrandMap = IndexMap<String, BrandRule>;
