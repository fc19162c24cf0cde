//! Runs every configured adapter over one UA and renders the combined
//! report used by the dump file and the echo server.

use crate::adapters::{Adapter, BackendKind};
use crate::backend::ModuleRegistry;
use serde_json::{json, Value};
use std::fmt::Write;

const BANNER: &str = "================================================================================";

/// One output block: the adapter, or the setup error that kept it from
/// being built.
struct Slot {
    name: &'static str,
    adapter: std::result::Result<Box<dyn Adapter>, String>,
}

/// Adapters in the fixed output order, with setup failures kept in place
/// so every report still has one block per backend.
pub struct Aggregator {
    slots: Vec<Slot>,
}

impl Aggregator {
    /// Every known backend.
    pub fn new(registry: &ModuleRegistry) -> Self {
        Self::with_backends(registry, &BackendKind::ALL)
    }

    /// A subset of backends. Output keeps the fixed backend order whatever
    /// order `kinds` is given in; duplicates are dropped.
    pub fn with_backends(registry: &ModuleRegistry, kinds: &[BackendKind]) -> Self {
        let slots = BackendKind::ALL
            .into_iter()
            .filter(|kind| kinds.contains(kind))
            .map(|kind| {
                let adapter = kind.build(registry).map_err(|e| {
                    tracing::warn!(backend = kind.name(), error = %e, "backend unavailable");
                    e.to_string()
                });
                Slot {
                    name: kind.name(),
                    adapter,
                }
            })
            .collect();
        Self { slots }
    }

    pub fn backends(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|slot| slot.name)
    }

    /// Backends that failed setup, with the reason.
    pub fn unavailable(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.adapter.as_ref().err().map(|e| (slot.name, e.as_str())))
    }

    /// One `(backend, result)` pair per backend. A backend that could not be
    /// built reports `{ "error": ... }`.
    pub fn parse_all(&self, ua: &str) -> Vec<(&'static str, Value)> {
        self.slots
            .iter()
            .map(|slot| {
                let value = match &slot.adapter {
                    Ok(adapter) => serde_json::to_value(adapter.parse(Some(ua)))
                        .unwrap_or_else(|e| error_envelope(&e.to_string())),
                    Err(message) => error_envelope(message),
                };
                (slot.name, value)
            })
            .collect()
    }

    /// The per-backend blocks: `"<name> Parsed Info:"`, the pretty JSON,
    /// then a blank line.
    pub fn render_blocks(&self, ua: &str) -> String {
        let mut out = String::new();
        for (name, value) in self.parse_all(ua) {
            let _ = write!(out, "{name} Parsed Info:\n{}\n\n", pretty(&value));
        }
        out
    }

    /// A full report for one UA: banner, the UA as JSON, then every block.
    pub fn render(&self, ua: &str) -> String {
        let mut out = String::new();
        for _ in 0..3 {
            out.push_str(BANNER);
            out.push('\n');
        }
        let _ = write!(out, "{}\n\n", pretty(&json!({ "user-agent": ua })));
        out.push_str(&self.render_blocks(ua));
        out
    }
}

fn error_envelope(message: &str) -> Value {
    json!({ "error": message })
}

pub(crate) fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    const WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn missing_backends_get_error_blocks() {
        let aggregator = Aggregator::new(&builtin::registry());
        let results = aggregator.parse_all(WINDOWS);

        let names: Vec<_> = results.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, BackendKind::ALL.map(|kind| kind.name()).to_vec());

        let (_, bowser) = &results[0];
        assert_eq!(bowser["error"], "bowser is not installed");

        let (_, woothee) = results.iter().find(|(name, _)| *name == "woothee").unwrap();
        assert_eq!(woothee["deviceCategory"], "desktop");
        assert_eq!(woothee["error"], Value::Null);

        let unavailable: Vec<_> = aggregator.unavailable().map(|(name, _)| name).collect();
        assert!(unavailable.contains(&"bowser"));
        assert!(!unavailable.contains(&"device-detector-js"));
    }

    #[test]
    fn subset_keeps_fixed_order() {
        let aggregator = Aggregator::with_backends(
            &builtin::registry(),
            &[BackendKind::Woothee, BackendKind::DeviceDetector, BackendKind::Woothee],
        );
        let names: Vec<_> = aggregator.backends().collect();
        assert_eq!(names, vec!["device-detector-js", "woothee"]);
    }

    #[test]
    fn report_layout() {
        let aggregator = Aggregator::with_backends(&builtin::registry(), &[BackendKind::Woothee]);
        let report = aggregator.render("curl/8.5.0");

        let mut lines = report.lines();
        for _ in 0..3 {
            assert_eq!(lines.next(), Some(BANNER));
        }
        assert_eq!(lines.next(), Some("{"));
        assert_eq!(lines.next(), Some("  \"user-agent\": \"curl/8.5.0\""));
        assert_eq!(lines.next(), Some("}"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("woothee Parsed Info:"));
        assert!(report.ends_with("}\n\n"));
    }
}
