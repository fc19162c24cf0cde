use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_present, first_string, AliasTable};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::types::{CpuInfo, NamedVersion, ParsedResult};
use serde_json::Value;

pub(crate) const NAME: &str = "device-detector-js";

/// The detector is a class; it is constructed once and reused.
const PROBES: &[Probe] = &[
    Probe::instance(&[]),
    Probe::instance(&["DeviceDetector"]),
    Probe::instance(&["default"]),
];

const ALIASES: AliasTable = AliasTable {
    browser: &["client", "browser"],
    vendor: &["brand", "vendor"],
    ..AliasTable::STANDARD
};

pub struct DeviceDetectorAdapter {
    backend: Backend,
}

impl DeviceDetectorAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, "device-detector-js", PROBES)?,
        })
    }
}

impl Adapter for DeviceDetectorAdapter {
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

/// `{ client, os, device, bot }`. `bot` is always present (null for
/// humans), and the rendering engine hangs off the client.
fn normalize(raw: &Value) -> Extracted {
    let mut extracted = Extracted::standard(raw, &ALIASES);
    let client = first_present(raw, ALIASES.browser);

    extracted.engine = client
        .and_then(|c| first_string(c, &["engine"]))
        .map(|engine| {
            let version = client
                .and_then(|c| first_present(c, &["engineVersion"]))
                .unwrap_or(&Value::Null);
            NamedVersion::new(Some(engine), version)
        });
    extracted.cpu = first_present(raw, ALIASES.os)
        .and_then(|os| first_string(os, &["platform"]))
        .map(|platform| CpuInfo {
            architecture: Some(platform),
        });
    extracted.bot_signal = Some(raw.get("bot").cloned().unwrap_or(Value::Null));
    extracted
}
