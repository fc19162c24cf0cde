use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_present, first_string, join_version, known};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::types::{NamedVersion, ParsedResult};
use serde_json::Value;

pub(crate) const NAME: &str = "useragent";

const PROBES: &[Probe] = &[
    Probe::call(&["parse"]),
    Probe::call(&["lookup"]),
    Probe::call(&["default", "parse"]),
];

const VERSION_KEYS: &[&str] = &["major", "minor", "patch"];

/// ua-parser family placeholders.
const PLACEHOLDERS: &[&str] = &["Other"];

pub struct UseragentAdapter {
    backend: Backend,
}

impl UseragentAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, "useragent", PROBES)?,
        })
    }
}

impl Adapter for UseragentAdapter {
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

fn family(component: &Value) -> Option<NamedVersion> {
    known(first_string(component, &["family"]), PLACEHOLDERS)
        .map(|name| NamedVersion::new(Some(name), &join_version(component, VERSION_KEYS)))
}

/// An agent `{ family, major, minor, patch, os, device }`, optionally
/// wrapped as `{ agent, os, device }`.
fn normalize(raw: &Value) -> Extracted {
    let agent = first_present(raw, &["agent"]).unwrap_or(raw);
    let nested = |key: &str| first_present(raw, &[key]).or_else(|| first_present(agent, &[key]));
    let device_family = nested("device").and_then(|d| first_string(d, &["family"]));
    let spider = device_family.as_deref() == Some("Spider");

    Extracted {
        browser: family(agent),
        os: nested("os").and_then(family),
        model: known(device_family, PLACEHOLDERS).filter(|_| !spider),
        bot_signal: spider.then_some(Value::Bool(true)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendModule, Export};
    use crate::types::DeviceCategory;
    use serde_json::json;

    fn agent() -> Value {
        json!({
            "family": "Chrome Mobile", "major": "120", "minor": "0", "patch": "6090",
            "os": { "family": "Android", "major": "14", "minor": null, "patch": null },
            "device": { "family": "Pixel 8", "major": "0", "minor": "0", "patch": "0" }
        })
    }

    #[test]
    fn agent_shape() {
        let mut registry = ModuleRegistry::new();
        registry.register(
            "useragent",
            BackendModule::new().export("parse", Export::function(|_| Ok(agent()))),
        );
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6090.0 Mobile Safari/537.36";
        let result = UseragentAdapter::new(&registry).unwrap().parse(Some(ua));

        let browser = result.browser.as_ref().unwrap();
        assert_eq!(browser.name.as_deref(), Some("Chrome Mobile"));
        assert_eq!(browser.version.as_deref(), Some("120.0.6090"));
        let os = result.os.as_ref().unwrap();
        assert_eq!(os.name.as_deref(), Some("Android"));
        assert_eq!(os.version.as_deref(), Some("14"));
        assert_eq!(result.device.as_ref().unwrap().model.as_deref(), Some("Pixel 8"));
        assert_eq!(result.device_category, DeviceCategory::Phone);
    }

    #[test]
    fn wrapped_shape() {
        let raw = json!({
            "agent": { "family": "Firefox", "major": "121", "minor": "0", "patch": "0" },
            "os": { "family": "Other" },
            "device": { "family": "Other" }
        });
        let extracted = normalize(&raw);
        assert_eq!(extracted.browser.unwrap().version.as_deref(), Some("121.0.0"));
        assert!(extracted.os.is_none());
        assert!(extracted.model.is_none());
    }

    #[test]
    fn spider_device_is_bot() {
        let raw = json!({
            "family": "Googlebot", "major": "2", "minor": "1", "patch": null,
            "os": { "family": "Other" },
            "device": { "family": "Spider" }
        });
        let result = normalize(&raw).into_result("Googlebot/2.1", raw.clone());
        assert!(result.is_bot);
        assert_eq!(result.device.unwrap().model, None);
    }
}
