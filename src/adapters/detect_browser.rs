use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_str, first_string};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::helpers::is_truthy;
use crate::types::{NamedVersion, ParsedResult};
use serde_json::Value;

pub(crate) const NAME: &str = "detect-browser";

const PROBES: &[Probe] = &[
    Probe::call(&["detect"]),
    Probe::call(&["default"]),
    Probe::call(&["default", "detect"]),
    Probe::call(&[]),
    Probe::call(&["parseUserAgent"]),
];

pub struct DetectBrowserAdapter {
    backend: Backend,
}

impl DetectBrowserAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, "detect-browser", PROBES)?,
        })
    }
}

impl Adapter for DetectBrowserAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn parse(&self, ua: Option<&str>) -> ParsedResult {
        self.backend.run(ua, |_, raw| normalize(raw))
    }

    fn entry_shapes(&self) -> Vec<EntryPointShape> {
        self.backend.shapes()
    }
}

/// `{ type, name, version, os }`, with `type` one of `browser`, `bot`,
/// `bot-device`, `react-native` or `node`. There is no device data.
fn normalize(raw: &Value) -> Extracted {
    let kind = first_str(raw, &["type"]);
    let bot = kind.is_some_and(|k| k.starts_with("bot")) || raw.get("bot").is_some_and(is_truthy);

    Extracted {
        browser: first_string(raw, &["name"])
            .map(|name| NamedVersion::new(Some(name), raw.get("version").unwrap_or(&Value::Null))),
        os: first_string(raw, &["os"]).map(|os| NamedVersion::new(Some(os), &Value::Null)),
        bot_signal: kind.map(|_| Value::Bool(bot)),
        ..Default::default()
    }
}
