use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_present, AliasTable};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::types::ParsedResult;
use serde_json::Value;

pub(crate) const NAME: &str = "bowser";

const PROBES: &[Probe] = &[
    Probe::call(&["parse"]),
    Probe::construct(&["getParser"]),
    Probe::call(&["default", "parse"]),
    Probe::construct(&["default", "getParser"]),
    Probe::call(&[]),
];

/// Bowser reports the form factor under `platform`.
const ALIASES: AliasTable = AliasTable {
    device: &["platform"],
    vendor: &["vendor"],
    ..AliasTable::STANDARD
};

pub struct BowserAdapter {
    backend: Backend,
}

impl BowserAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, "bowser", PROBES)?,
        })
    }
}

impl Adapter for BowserAdapter {
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

fn normalize(raw: &Value) -> Extracted {
    let mut extracted = Extracted::standard(raw, &ALIASES);
    // Older bowser builds report the platform as a bare string.
    if let Some(Value::String(platform)) = first_present(raw, ALIASES.device) {
        extracted.device_type = Some(platform.clone()).filter(|p| !p.is_empty());
    }
    extracted
}
