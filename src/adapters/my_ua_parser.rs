use super::{ua_parser_js, Adapter, Backend};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::{Error, Result};
use crate::types::ParsedResult;

pub(crate) const NAME: &str = "my-ua-parser";

const PROBES: &[Probe] = &[
    Probe::construct(&[]),
    Probe::call(&[]),
    Probe::construct(&["UAParser"]),
    Probe::call(&["parse"]),
    Probe::call(&["getResult"]),
    Probe::construct(&["default"]),
    Probe::call(&["default"]),
    Probe::call(&["default", "parse"]),
    Probe::call(&["default", "getResult"]),
];

/// A fork of ua-parser-js. When the fork is not installed, or yields
/// nothing for a UA, ua-parser-js itself is used.
pub struct MyUaParserAdapter {
    primary: Backend,
    fallback: Option<Backend>,
}

impl MyUaParserAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        match Backend::resolve(registry, NAME, NAME, PROBES) {
            Ok(primary) => Ok(Self {
                primary,
                fallback: Backend::resolve(
                    registry,
                    NAME,
                    ua_parser_js::MODULE,
                    ua_parser_js::PROBES,
                )
                .ok(),
            }),
            Err(Error::BackendMissing(_) | Error::NoEntryPoint(_)) => {
                tracing::debug!(backend = NAME, "using ua-parser-js in place of the fork");
                Ok(Self {
                    primary: Backend::resolve(
                        registry,
                        NAME,
                        ua_parser_js::MODULE,
                        ua_parser_js::PROBES,
                    )?,
                    fallback: None,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// The module tried first for every UA.
    pub fn provider(&self) -> &'static str {
        self.primary.module()
    }

    /// Parse and report which module produced the result; `None` when
    /// neither answered.
    pub fn parse_with_provider(&self, ua: Option<&str>) -> (ParsedResult, Option<&'static str>) {
        let ua = ua.unwrap_or("");
        let answered = std::iter::once(&self.primary)
            .chain(&self.fallback)
            .find_map(|backend| backend.invoke(ua).map(|raw| (backend.module(), raw)));

        match answered {
            Some((provider, raw)) => {
                tracing::debug!(backend = NAME, provider, "parsed");
                (ua_parser_js::normalize(&raw).into_result(ua, raw), Some(provider))
            }
            None => (self.primary.no_result(ua), None),
        }
    }
}

impl Adapter for MyUaParserAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn parse(&self, ua: Option<&str>) -> ParsedResult {
        self.parse_with_provider(ua).0
    }

    fn entry_shapes(&self) -> Vec<EntryPointShape> {
        self.primary.shapes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendFailure, BackendModule, Export};
    use serde_json::json;

    fn result(name: &str) -> serde_json::Value {
        json!({
            "browser": { "name": name, "version": "1.2.3" },
            "device": { "type": "tablet" }
        })
    }

    #[test]
    fn uses_ua_parser_js_when_fork_missing() {
        let mut registry = ModuleRegistry::new();
        registry.register(
            "ua-parser-js",
            BackendModule::new().callable(Export::function(|_| Ok(result("from-upstream")))),
        );
        let adapter = MyUaParserAdapter::new(&registry).unwrap();
        assert_eq!(adapter.provider(), "ua-parser-js");

        let parsed = adapter.parse(Some("Mozilla/5.0 (iPad)"));
        assert_eq!(parsed.browser.unwrap().name.as_deref(), Some("from-upstream"));
        assert!(parsed.is_tablet);
    }

    #[test]
    fn per_call_fallback() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(
                "my-ua-parser",
                BackendModule::new()
                    .export("parse", Export::function(|_| Err(BackendFailure::threw("nope")))),
            )
            .register(
                "ua-parser-js",
                BackendModule::new().callable(Export::function(|_| Ok(result("upstream")))),
            );
        let adapter = MyUaParserAdapter::new(&registry).unwrap();
        assert_eq!(adapter.provider(), "my-ua-parser");
        let parsed = adapter.parse(Some("x"));
        assert_eq!(parsed.browser.unwrap().name.as_deref(), Some("upstream"));
    }

    #[test]
    fn records_the_answering_module() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(
                "my-ua-parser",
                BackendModule::new().callable(Export::function(|ua| {
                    Ok(if ua.contains("Fork") { result("fork") } else { json!(null) })
                })),
            )
            .register(
                "ua-parser-js",
                BackendModule::new().callable(Export::function(|_| Ok(result("upstream")))),
            );
        let adapter = MyUaParserAdapter::new(&registry).unwrap();

        let (parsed, provider) = adapter.parse_with_provider(Some("Fork/1.0"));
        assert_eq!(provider, Some("my-ua-parser"));
        assert_eq!(parsed.browser.unwrap().name.as_deref(), Some("fork"));

        let (parsed, provider) = adapter.parse_with_provider(Some("Other/1.0"));
        assert_eq!(provider, Some("ua-parser-js"));
        assert_eq!(parsed.browser.unwrap().name.as_deref(), Some("upstream"));
        assert_eq!(parsed.raw, Some(result("upstream")));
    }

    #[test]
    fn all_failing_is_an_error_result() {
        let mut registry = ModuleRegistry::new();
        registry.register(
            "my-ua-parser",
            BackendModule::new().callable(Export::function(|_| Ok(json!(null)))),
        );
        let (parsed, provider) = MyUaParserAdapter::new(&registry).unwrap().parse_with_provider(None);
        assert_eq!(provider, None);
        assert_eq!(
            parsed.error.as_deref(),
            Some("my-ua-parser did not return a parse result")
        );
        assert_eq!(parsed.ua, "");
    }

    #[test]
    fn neither_installed() {
        let err = MyUaParserAdapter::new(&ModuleRegistry::new()).err().unwrap();
        assert!(matches!(err, Error::BackendMissing(name) if name == "ua-parser-js"));
    }
}
