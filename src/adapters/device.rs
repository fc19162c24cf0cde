use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_present, first_string, named_version, AliasTable};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::helpers::is_truthy;
use crate::types::ParsedResult;
use serde_json::Value;

pub(crate) const NAME: &str = "device";

const PROBES: &[Probe] = &[
    Probe::call(&[]),
    Probe::call(&["default"]),
    Probe::call(&["detect"]),
    Probe::call(&["parse"]),
];

const ALIASES: AliasTable = AliasTable {
    browser: &["browser", "client"],
    os: &["os", "OS"],
    ..AliasTable::STANDARD
};

/// Form-factor booleans some versions report instead of `type`.
const FORM_FLAGS: &[(&str, &str)] = &[("tablet", "tablet"), ("mobile", "phone"), ("desktop", "desktop")];

pub struct DeviceAdapter {
    backend: Backend,
}

impl DeviceAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, "device", PROBES)?,
        })
    }
}

impl Adapter for DeviceAdapter {
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

/// `{ type, model }`, or `{ mobile, tablet, desktop, os, browser }`.
fn normalize(raw: &Value) -> Extracted {
    let device_type = first_string(raw, ALIASES.device_type).or_else(|| {
        FORM_FLAGS
            .iter()
            .find(|(flag, _)| raw.get(*flag).is_some_and(is_truthy))
            .map(|(_, kind)| kind.to_string())
    });

    Extracted {
        browser: named_version(first_present(raw, ALIASES.browser), &ALIASES),
        os: named_version(first_present(raw, ALIASES.os), &ALIASES),
        device_type,
        model: first_string(raw, ALIASES.model),
        ..Default::default()
    }
}
