//! Backends that ship with the crate.
//!
//! `device-detector-js` is served by the bundled [`RegexDetector`] and
//! `woothee` by the `woothee` crate. Everything else has to be registered by
//! the host.

use crate::backend::{BackendFailure, BackendModule, BackendResult, Export, ModuleRegistry, ParserInstance};
use crate::engine::RegexDetector;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A registry holding every bundled backend, using the embedded rule set.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    install(&mut registry, None);
    registry
}

/// Like [`registry`], but the regex detector loads its rules from a
/// device-detector `regexes/` checkout.
pub fn registry_with_regexes(dir: impl AsRef<Path>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    install(&mut registry, Some(dir.as_ref().to_path_buf()));
    registry
}

/// Add the bundled backends to an existing registry, replacing any module
/// already registered under the same name.
pub fn install(registry: &mut ModuleRegistry, regexes_dir: Option<PathBuf>) {
    registry
        .register("device-detector-js", device_detector(regexes_dir))
        .register("woothee", woothee());
}

struct DetectorInstance(RegexDetector);

impl ParserInstance for DetectorInstance {
    fn parse(&self, ua: &str) -> BackendResult<Value> {
        serde_json::to_value(self.0.parse(ua)).map_err(|e| BackendFailure::threw(e.to_string()))
    }
}

/// A class export: the detector is compiled when the adapter resolves it.
fn device_detector(regexes_dir: Option<PathBuf>) -> BackendModule {
    let class = Export::class(move || {
        let detector = match &regexes_dir {
            Some(dir) => RegexDetector::from_dir(dir),
            None => RegexDetector::bundled(),
        }
        .map_err(|e| BackendFailure::threw(e.to_string()))?;
        Ok(Arc::new(DetectorInstance(detector)) as Arc<dyn ParserInstance>)
    });
    BackendModule::new().callable(class)
}

fn woothee() -> BackendModule {
    BackendModule::new().export("parse", Export::function(woothee_parse))
}

fn woothee_parse(ua: &str) -> BackendResult<Value> {
    let parser = woothee::parser::Parser::new();
    Ok(match parser.parse(ua) {
        Some(r) => json!({
            "name": r.name,
            "category": r.category,
            "os": r.os,
            "os_version": r.os_version.to_string(),
            "browser_type": r.browser_type,
            "version": r.version,
            "vendor": r.vendor,
        }),
        // Unrecognised agents yield no parse result.
        None => Value::Null,
    })
}
