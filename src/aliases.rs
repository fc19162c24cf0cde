//! Static field-name alias tables.
//!
//! Backends disagree on what to call things (`browser` vs `client` vs
//! `agent`, `name` vs `family`). Each adapter declares one [`AliasTable`];
//! lookups walk the candidates in order and take the first present, non-null
//! value.

use crate::types::NamedVersion;
use serde_json::Value;

/// Candidate keys per logical field, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub browser: &'static [&'static str],
    pub engine: &'static [&'static str],
    pub os: &'static [&'static str],
    pub device: &'static [&'static str],
    pub cpu: &'static [&'static str],
    pub bot: &'static [&'static str],
    /// Keys for the name inside a browser/engine/os component.
    pub name: &'static [&'static str],
    /// Keys for the version inside a browser/engine/os component.
    pub version: &'static [&'static str],
    /// Keys for the device-type token inside the device component.
    pub device_type: &'static [&'static str],
    pub vendor: &'static [&'static str],
    pub model: &'static [&'static str],
}

impl AliasTable {
    /// The layout shared by most object-shaped backends.
    pub const STANDARD: AliasTable = AliasTable {
        browser: &["browser", "client"],
        engine: &["engine"],
        os: &["os"],
        device: &["device"],
        cpu: &["cpu"],
        bot: &["bot"],
        name: &["name"],
        version: &["version"],
        device_type: &["type"],
        vendor: &["vendor", "brand"],
        model: &["model"],
    };
}

/// First alias present on `value` with a non-null value.
pub fn first_present<'v>(value: &'v Value, aliases: &[&str]) -> Option<&'v Value> {
    aliases
        .iter()
        .filter_map(|key| value.get(*key))
        .find(|v| !v.is_null())
}

/// First alias holding a non-empty string.
pub fn first_str<'v>(value: &'v Value, aliases: &[&str]) -> Option<&'v str> {
    aliases
        .iter()
        .filter_map(|key| value.get(*key))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
}

pub fn first_string(value: &Value, aliases: &[&str]) -> Option<String> {
    first_str(value, aliases).map(str::to_string)
}

/// Resolve a browser/engine/os component.
///
/// A component may be an object (`{ name, version }`) or a bare string
/// naming it. Anything else yields `None`.
pub fn named_version(component: Option<&Value>, table: &AliasTable) -> Option<NamedVersion> {
    let component = component?;
    match component {
        Value::Object(_) => {
            let version = first_present(component, table.version).unwrap_or(&Value::Null);
            Some(NamedVersion::new(first_string(component, table.name), version))
        }
        Value::String(name) if !name.is_empty() => {
            Some(NamedVersion::new(Some(name.clone()), &Value::Null))
        }
        _ => None,
    }
}

/// Join split version fields (`major`, `minor`, `patch`) back into a dotted
/// string, stopping at the first missing one. Numbers are accepted.
pub fn join_version(component: &Value, keys: &[&str]) -> Value {
    let segments: Vec<String> = keys
        .iter()
        .map_while(|key| match component.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        Value::Null
    } else {
        Value::String(segments.join("."))
    }
}

/// `None` for placeholder names backends use instead of null.
pub fn known(name: Option<String>, placeholders: &[&str]) -> Option<String> {
    name.filter(|n| !placeholders.iter().any(|p| n.eq_ignore_ascii_case(p)))
}
