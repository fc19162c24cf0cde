use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_str, first_string, known};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::types::{NamedVersion, ParsedResult};
use serde_json::Value;

pub(crate) const NAME: &str = "woothee";

const PROBES: &[Probe] = &[Probe::call(&["parse"]), Probe::call(&[])];

const UNKNOWN: &[&str] = &["UNKNOWN"];

pub struct WootheeAdapter {
    backend: Backend,
}

impl WootheeAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, "woothee", PROBES)?,
        })
    }
}

impl Adapter for WootheeAdapter {
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

fn device_type(category: &str) -> Option<&'static str> {
    Some(match category {
        "pc" => "desktop",
        "smartphone" => "smartphone",
        "mobilephone" => "mobile",
        "crawler" => "crawler",
        "appliance" => "appliance",
        "misc" => "misc",
        _ => return None,
    })
}

/// `{ name, category, os, os_version, browser_type, version, vendor }`,
/// with `"UNKNOWN"` standing in for missing values.
fn normalize(raw: &Value) -> Extracted {
    let category = first_str(raw, &["category"]);
    let field = |key: &str| known(first_string(raw, &[key]), UNKNOWN);

    Extracted {
        browser: field("name").map(|name| {
            let version = field("version").map(Value::String).unwrap_or(Value::Null);
            NamedVersion::new(Some(name), &version)
        }),
        os: field("os").map(|os| {
            let version = field("os_version").map(Value::String).unwrap_or(Value::Null);
            NamedVersion::new(Some(os), &version)
        }),
        device_type: category.and_then(device_type).map(str::to_string),
        vendor: field("vendor"),
        bot_signal: category.map(|c| Value::Bool(c == "crawler")),
        ..Default::default()
    }
}
