use super::{Adapter, Backend, Extracted};
use crate::aliases::{first_string, known};
use crate::backend::{EntryPointShape, ModuleRegistry, Probe};
use crate::error::Result;
use crate::helpers::is_truthy;
use crate::types::{NamedVersion, ParsedResult};
use serde_json::Value;

pub(crate) const NAME: &str = "express-useragent";

/// Request fields the middleware may attach its result to.
const READS: &[&str] = &["useragent", "ua"];

const PROBES: &[Probe] = &[
    Probe::call(&["parse"]),
    Probe::call(&["default", "parse"]),
    Probe::call(&[]),
    Probe::middleware(&["express"], READS),
    Probe::middleware(&["default", "express"], READS),
    Probe::middleware(&[], READS),
];

/// `platform` is the OS family ("Android", "Microsoft Windows"); `os` is
/// often only the kernel ("Linux") so it comes second.
const OS_KEYS: &[&str] = &["platform", "os"];

pub struct ExpressUseragentAdapter {
    backend: Backend,
}

impl ExpressUseragentAdapter {
    pub fn new(registry: &ModuleRegistry) -> Result<Self> {
        Ok(Self {
            backend: Backend::resolve(registry, NAME, "express-useragent", PROBES)?,
        })
    }
}

impl Adapter for ExpressUseragentAdapter {
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

/// Flat `{ browser, version, os, platform, isMobile, isTablet, isBot, ... }`.
fn normalize(raw: &Value) -> Extracted {
    let flag = |key: &str| raw.get(key).is_some_and(is_truthy);
    let has_flags = ["isMobile", "isTablet", "isDesktop"]
        .iter()
        .any(|key| raw.get(*key).is_some());

    let device_type = if !has_flags {
        None
    } else if flag("isTablet") {
        Some("tablet")
    } else if flag("isMobile") {
        Some("mobile")
    } else if flag("isDesktop") {
        Some("desktop")
    } else {
        None
    };

    Extracted {
        browser: known(first_string(raw, &["browser"]), &["unknown"])
            .map(|name| NamedVersion::new(Some(name), raw.get("version").unwrap_or(&Value::Null))),
        os: OS_KEYS
            .iter()
            .find_map(|key| known(first_string(raw, &[*key]), &["unknown"]))
            .map(|name| NamedVersion::new(Some(name), &Value::Null)),
        device_type: device_type.map(str::to_string),
        // `isBot` is false or the matched crawler name.
        bot_signal: raw.get("isBot").cloned(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendModule, BackendResult, Export, Middleware, SyntheticRequest};
    use crate::types::DeviceCategory;
    use serde_json::json;
    use std::sync::Arc;

    const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    fn express_result(ua: &str) -> Value {
        if ua.contains("Googlebot") {
            return json!({
                "isMobile": false, "isTablet": false, "isDesktop": false,
                "isBot": "googlebot",
                "browser": "unknown", "version": "unknown",
                "os": "Linux", "platform": "unknown",
                "source": ua
            });
        }
        let mobile = ua.contains("Mobile");
        json!({
            "isMobile": mobile, "isTablet": false, "isDesktop": !mobile,
            "isBot": false,
            "browser": "Chrome", "version": "120.0.6090.0",
            "os": "Linux", "platform": "Android",
            "source": ua
        })
    }

    #[test]
    fn middleware_only_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(
            "express-useragent",
            BackendModule::new().export(
                "express",
                Export::middleware(|| {
                    Ok(Arc::new(|req: &mut SyntheticRequest| -> BackendResult<()> {
                        let ua = req.header("user-agent").unwrap_or_default().to_string();
                        req.set("useragent", express_result(&ua));
                        Ok(())
                    }) as Middleware)
                }),
            ),
        );
        let adapter = ExpressUseragentAdapter::new(&registry).unwrap();
        assert_eq!(adapter.entry_shapes(), vec![EntryPointShape::MiddlewareStyle]);

        let bot = adapter.parse(Some(GOOGLEBOT));
        assert!(bot.is_bot);
        assert_eq!(bot.device_category, DeviceCategory::Bot);
        assert!(bot.browser.is_none());
        assert_eq!(bot.os.as_ref().unwrap().name.as_deref(), Some("Linux"));
        assert_eq!(bot.raw.unwrap()["isBot"], "googlebot");
    }

    #[test]
    fn explicit_flags() {
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/120.0.6090.0 Mobile Safari/537.36";
        let raw = express_result(ua);
        let result = normalize(&raw).into_result(ua, raw.clone());
        assert_eq!(result.device_category, DeviceCategory::Phone);
        assert!(result.is_mobile);
        let browser = result.browser.unwrap();
        assert_eq!(browser.name.as_deref(), Some("Chrome"));
        assert_eq!(browser.version_parts.major.as_deref(), Some("120"));
        assert_eq!(result.os.unwrap().name.as_deref(), Some("Android"));
    }

    #[test]
    fn false_is_bot_overrides_ua_keywords() {
        let raw = json!({ "isMobile": false, "isTablet": false, "isDesktop": true, "isBot": false });
        let result = normalize(&raw).into_result("curl/8.5.0", raw.clone());
        assert!(!result.is_bot);
        assert!(result.is_desktop);
    }
}
