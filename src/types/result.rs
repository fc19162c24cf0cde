use super::DeviceCategory;
use serde::Serialize;
use serde_json::Value;

/// Common result shape every adapter produces.
///
/// All keys are always serialized; absent data is `null`. `raw` is exactly
/// what the backend returned and is never touched after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResult {
    pub ua: String,
    pub browser: Option<NamedVersion>,
    pub engine: Option<NamedVersion>,
    pub os: Option<NamedVersion>,
    pub device: Option<DeviceInfo>,
    pub cpu: Option<CpuInfo>,
    pub device_category: DeviceCategory,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
    pub is_bot: bool,
    pub raw: Option<Value>,
    pub error: Option<String>,
}

impl ParsedResult {
    /// A result for a backend that produced nothing usable.
    pub fn failure(ua: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ua: ua.into(),
            browser: None,
            engine: None,
            os: None,
            device: None,
            cpu: None,
            device_category: DeviceCategory::Unknown,
            is_mobile: false,
            is_tablet: false,
            is_desktop: false,
            is_bot: false,
            raw: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A named component (browser, engine, OS) with its decomposed version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedVersion {
    pub name: Option<String>,
    pub version: Option<String>,
    pub version_parts: VersionParts,
}

impl NamedVersion {
    /// Build from a name and the backend's version value, whatever its type.
    pub fn new(name: Option<String>, version: &Value) -> Self {
        Self {
            name,
            version: version.as_str().filter(|v| !v.is_empty()).map(str::to_string),
            version_parts: crate::helpers::split_version(version),
        }
    }
}

/// Dotted version split into at most three components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionParts {
    pub raw: Value,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub patch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuInfo {
    pub architecture: Option<String>,
}

/// The four convenience flags, derived one-hot from a [`DeviceCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DeviceFlags {
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
    pub is_bot: bool,
}

impl DeviceFlags {
    pub(crate) fn for_category(category: &DeviceCategory) -> Self {
        Self {
            is_mobile: *category == DeviceCategory::Phone,
            is_tablet: *category == DeviceCategory::Tablet,
            is_desktop: *category == DeviceCategory::Desktop,
            is_bot: *category == DeviceCategory::Bot,
        }
    }
}
