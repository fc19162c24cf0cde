use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_present, first_str, AliasTable};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::types::ParsedResult;
use serde_json::Value;

pub(crate) const NAME: &str = "ua-parser-js";
pub(crate) const MODULE: &str = "ua-parser-js";

pub(crate) const PROBES: &[Probe] = &[
    Probe::construct(&["UAParser"]),
    Probe::construct(&[]),
    Probe::call(&[]),
    Probe::call(&["parse"]),
    Probe::construct(&["default"]),
    Probe::call(&["default"]),
];

/// `browser.type` values (v2) that mean an automated client.
const AUTOMATED: &[&str] = &["crawler", "fetcher"];

pub struct UaParserJsAdapter {
    backend: Backend,
}

impl UaParserJsAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, MODULE, PROBES)?,
        })
    }
}

impl Adapter for UaParserJsAdapter {
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

/// `{ ua, browser, engine, os, device, cpu }`, shared with forks of the
/// same parser.
pub(crate) fn normalize(raw: &Value) -> Extracted {
    let mut extracted = Extracted::standard(raw, &AliasTable::STANDARD);
    extracted.bot_signal = first_present(raw, AliasTable::STANDARD.browser)
        .and_then(|browser| first_str(browser, &["type"]))
        .map(|kind| Value::Bool(AUTOMATED.contains(&kind)));
    extracted
}
