use serde::{Serialize, Serializer};

/// Device types known to the bundled regex database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Desktop,
    Smartphone,
    Tablet,
    Phablet,
    FeaturePhone,
    Console,
    Tv,
    CarBrowser,
    Wearable,
}

impl DeviceType {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desktop" => Some(Self::Desktop),
            "smartphone" => Some(Self::Smartphone),
            "tablet" => Some(Self::Tablet),
            "phablet" => Some(Self::Phablet),
            "feature phone" => Some(Self::FeaturePhone),
            "console" => Some(Self::Console),
            "tv" | "television" => Some(Self::Tv),
            "car browser" => Some(Self::CarBrowser),
            "wearable" => Some(Self::Wearable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Smartphone => "smartphone",
            Self::Tablet => "tablet",
            Self::Phablet => "phablet",
            Self::FeaturePhone => "feature phone",
            Self::Console => "console",
            Self::Tv => "tv",
            Self::CarBrowser => "car browser",
            Self::Wearable => "wearable",
        }
    }
}

impl Serialize for DeviceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Canonical device category reported in every [`ParsedResult`](super::ParsedResult).
///
/// Explicit backend tokens that have no canonical counterpart are kept as
/// [`DeviceCategory::Verbatim`] and serialized unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    Phone,
    Tablet,
    Desktop,
    Tv,
    Car,
    Console,
    Wearable,
    Bot,
    Server,
    Other,
    Unknown,
    Verbatim(String),
}

impl DeviceCategory {
    /// Map an explicit backend device-type token onto a category.
    ///
    /// Returns `None` for an empty token so callers fall through to UA
    /// heuristics.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let category = match token.to_ascii_lowercase().as_str() {
            "smartphone" | "mobile" | "phablet" | "phone" | "feature phone" => Self::Phone,
            "tablet" => Self::Tablet,
            "desktop" => Self::Desktop,
            "tv" | "smarttv" | "television" => Self::Tv,
            "car" | "car browser" => Self::Car,
            "console" => Self::Console,
            "wearable" => Self::Wearable,
            "bot" | "crawler" | "spider" => Self::Bot,
            "server" => Self::Server,
            "other" => Self::Other,
            "unknown" => Self::Unknown,
            _ => Self::Verbatim(token.to_string()),
        };
        Some(category)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Phone => "phone",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
            Self::Tv => "tv",
            Self::Car => "car",
            Self::Console => "console",
            Self::Wearable => "wearable",
            Self::Bot => "bot",
            Self::Server => "server",
            Self::Other => "other",
            Self::Unknown => "unknown",
            Self::Verbatim(token) => token,
        }
    }
}

impl Serialize for DeviceCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
