//! One adapter per parsing backend.
//!
//! Every adapter follows the same pipeline: resolve entry points once at
//! construction, invoke them in priority order per call until one yields an
//! object, then map that object through the adapter's alias table into a
//! [`ParsedResult`]. Only construction can fail; `parse` is total.

mod bowser;
mod detect_browser;
mod device;
mod device_detector;
mod express_useragent;
mod my_ua_parser;
mod ua_parser_js;
mod useragent;
mod woothee;

pub use bowser::BowserAdapter;
pub use detect_browser::DetectBrowserAdapter;
pub use device::DeviceAdapter;
pub use device_detector::DeviceDetectorAdapter;
pub use express_useragent::ExpressUseragentAdapter;
pub use my_ua_parser::MyUaParserAdapter;
pub use ua_parser_js::UaParserJsAdapter;
pub use useragent::UseragentAdapter;
pub use woothee::WootheeAdapter;

use crate::aliases::{first_present, first_string, named_version, AliasTable};
use crate::backend::{resolve, EntryPoint, EntryPointShape, ModuleRegistry, Probe};
use crate::error::{Error, Result};
use crate::helpers::{classify_device, detect_bot, form_factor};
use crate::types::{
    CpuInfo, DeviceCategory, DeviceFlags, DeviceInfo, NamedVersion, ParsedResult,
};
use serde_json::Value;

/// Normalizes one backend's output into a [`ParsedResult`].
pub trait Adapter: Send + Sync {
    /// Backend name used in logs, error messages and aggregated output.
    fn name(&self) -> &'static str;

    /// Parse a UA string. `None` is treated as the empty string. Never fails.
    fn parse(&self, ua: Option<&str>) -> ParsedResult;

    /// Shapes of the resolved entry points, in the order they are tried.
    fn entry_shapes(&self) -> Vec<EntryPointShape>;
}

/// Every known backend, in the fixed order aggregated output uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Bowser,
    UaParserJs,
    ExpressUseragent,
    MyUaParser,
    DetectBrowser,
    Useragent,
    DeviceDetector,
    Device,
    Woothee,
}

impl BackendKind {
    pub const ALL: [BackendKind; 9] = [
        Self::Bowser,
        Self::UaParserJs,
        Self::ExpressUseragent,
        Self::MyUaParser,
        Self::DetectBrowser,
        Self::Useragent,
        Self::DeviceDetector,
        Self::Device,
        Self::Woothee,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bowser => bowser::NAME,
            Self::UaParserJs => ua_parser_js::NAME,
            Self::ExpressUseragent => express_useragent::NAME,
            Self::MyUaParser => my_ua_parser::NAME,
            Self::DetectBrowser => detect_browser::NAME,
            Self::Useragent => useragent::NAME,
            Self::DeviceDetector => device_detector::NAME,
            Self::Device => device::NAME,
            Self::Woothee => woothee::NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Construct the adapter. Fails only when the backend is not available.
    pub fn build(&self, registry: &ModuleRegistry) -> Result<Box<dyn Adapter>> {
        Ok(match self {
            Self::Bowser => Box::new(BowserAdapter::new(registry)?),
            Self::UaParserJs => Box::new(UaParserJsAdapter::new(registry)?),
            Self::ExpressUseragent => Box::new(ExpressUseragentAdapter::new(registry)?),
            Self::MyUaParser => Box::new(MyUaParserAdapter::new(registry)?),
            Self::DetectBrowser => Box::new(DetectBrowserAdapter::new(registry)?),
            Self::Useragent => Box::new(UseragentAdapter::new(registry)?),
            Self::DeviceDetector => Box::new(DeviceDetectorAdapter::new(registry)?),
            Self::Device => Box::new(DeviceAdapter::new(registry)?),
            Self::Woothee => Box::new(WootheeAdapter::new(registry)?),
        })
    }
}

/// Resolved entry points of one backend module.
pub(crate) struct Backend {
    name: &'static str,
    module: &'static str,
    entries: Vec<EntryPoint>,
}

impl Backend {
    pub(crate) fn resolve(
        registry: &ModuleRegistry,
        name: &'static str,
        module: &'static str,
        probes: &[Probe],
    ) -> Result<Self> {
        let entries = resolve(name, registry.require(module)?, probes);
        if entries.is_empty() {
            return Err(Error::NoEntryPoint(module.to_string()));
        }
        tracing::debug!(
            backend = name,
            module,
            shapes = ?entries.iter().map(EntryPoint::shape).collect::<Vec<_>>(),
            "resolved backend entry points"
        );
        Ok(Self {
            name,
            module,
            entries,
        })
    }

    pub(crate) fn module(&self) -> &'static str {
        self.module
    }

    pub(crate) fn shapes(&self) -> Vec<EntryPointShape> {
        self.entries.iter().map(EntryPoint::shape).collect()
    }

    /// Walk the fallback chain; the first object result wins.
    pub(crate) fn invoke(&self, ua: &str) -> Option<Value> {
        self.entries
            .iter()
            .enumerate()
            .find_map(|(idx, entry)| match entry.invoke(ua) {
                Ok(raw) => Some(raw),
                Err(failure) => {
                    tracing::debug!(
                        backend = self.name,
                        module = self.module,
                        entry = idx,
                        shape = ?entry.shape(),
                        %failure,
                        "entry point produced no result"
                    );
                    None
                }
            })
    }

    pub(crate) fn no_result(&self, ua: &str) -> ParsedResult {
        ParsedResult::failure(ua, format!("{} did not return a parse result", self.name))
    }

    /// Invoke and normalize in one step.
    pub(crate) fn run(
        &self,
        ua: Option<&str>,
        normalize: impl FnOnce(&str, &Value) -> Extracted,
    ) -> ParsedResult {
        let ua = ua.unwrap_or("");
        match self.invoke(ua) {
            Some(raw) => normalize(ua, &raw).into_result(ua, raw),
            None => self.no_result(ua),
        }
    }
}

/// Fields an adapter pulled out of a raw backend result, before device
/// classification.
#[derive(Debug, Default)]
pub(crate) struct Extracted {
    pub browser: Option<NamedVersion>,
    pub engine: Option<NamedVersion>,
    pub os: Option<NamedVersion>,
    pub cpu: Option<CpuInfo>,
    /// Backend-supplied device-type token, if any.
    pub device_type: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    /// `Some` when the backend has an explicit bot accessor; its value is
    /// then authoritative over UA keyword matching.
    pub bot_signal: Option<Value>,
}

impl Extracted {
    /// Browser/engine/os/cpu/device pulled through a standard alias table.
    pub(crate) fn standard(raw: &Value, table: &AliasTable) -> Self {
        let device = first_present(raw, table.device);
        Self {
            browser: named_version(first_present(raw, table.browser), table),
            engine: named_version(first_present(raw, table.engine), table),
            os: named_version(first_present(raw, table.os), table),
            cpu: first_present(raw, table.cpu)
                .filter(|cpu| cpu.is_object())
                .map(|cpu| CpuInfo {
                    architecture: first_string(cpu, &["architecture"]),
                }),
            device_type: device.and_then(|d| first_string(d, table.device_type)),
            vendor: device.and_then(|d| first_string(d, table.vendor)),
            model: device.and_then(|d| first_string(d, table.model)),
            bot_signal: None,
        }
    }

    /// Explicit bot accessor > explicit device type > UA heuristics.
    fn category(&self, ua: &str) -> DeviceCategory {
        let name = self.browser.as_ref().and_then(|b| b.name.as_deref());
        let explicit = self
            .device_type
            .as_deref()
            .and_then(DeviceCategory::from_token);

        if let Some(signal) = &self.bot_signal {
            if detect_bot(Some(signal), name, "") {
                return DeviceCategory::Bot;
            }
            return explicit.unwrap_or_else(|| form_factor(ua));
        }
        if explicit.is_none() && detect_bot(None, name, "") {
            return DeviceCategory::Bot;
        }
        classify_device(self.device_type.as_deref(), ua)
    }

    pub(crate) fn into_result(self, ua: &str, raw: Value) -> ParsedResult {
        let category = self.category(ua);
        let flags = DeviceFlags::for_category(&category);
        ParsedResult {
            ua: ua.to_string(),
            browser: self.browser,
            engine: self.engine,
            os: self.os,
            device: Some(DeviceInfo {
                kind: self.device_type,
                vendor: self.vendor,
                model: self.model,
                is_mobile: flags.is_mobile,
                is_tablet: flags.is_tablet,
                is_desktop: flags.is_desktop,
                is_bot: flags.is_bot,
            }),
            cpu: self.cpu,
            device_category: category,
            is_mobile: flags.is_mobile,
            is_tablet: flags.is_tablet,
            is_desktop: flags.is_desktop,
            is_bot: flags.is_bot,
            raw: Some(raw),
            error: None,
        }
    }
}
