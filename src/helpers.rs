//! Pure classification helpers shared by every adapter.
//!
//! None of these touch a backend; they only look at strings the caller
//! already has, so they are deterministic and safe to call from any thread.

use crate::types::{DeviceCategory, VersionParts};
use aho_corasick::AhoCorasick;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Bot, crawler, spider and monitoring-tool markers in a full UA.
///
/// A `*bot`/`*crawler`/`*spider` token only counts when it is a product
/// token (followed by `/` or `+`), so brand names that happen to end in
/// "bot" (CUBOT) are not crawlers. Standalone words and `+http://` contact
/// links cover the rest.
static BOT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b[a-z0-9_.-]*(?:bot|crawler|spider|scraper)(?:-[a-z]+)?[/+]|\b(?:bot|robot|crawler|spider|crawl|slurp|archiver|facebookexternalhit|mediapartners-google|feedfetcher|bingpreview|headlesschrome|lighthouse|pingdom|uptimerobot|statuscake|site24x7|newrelicpinger|nagios|zabbix|datadog|curl|wget|python-requests|go-http-client)\b|\+https?://",
    )
    .expect("static bot pattern")
});

/// Bot names as a backend reports them ("Googlebot", "Baiduspider"):
/// the suffix alone is enough here.
static BOT_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9_.-]*(?:bot|crawler|spider|scraper)\b|\b(?:crawl|slurp|headlesschrome)\b")
        .expect("static bot name pattern")
});

static TABLET_KEYWORDS: LazyLock<AhoCorasick> = LazyLock::new(|| {
    keyword_set(&[
        "ipad", "tablet", "kindle", "silk/", "playbook", "xoom", "nexus 7", "nexus 9",
        "nexus 10", "sm-t",
    ])
});

static MOBILE_KEYWORDS: LazyLock<AhoCorasick> = LazyLock::new(|| {
    keyword_set(&[
        "mobile",
        "iphone",
        "ipod",
        "blackberry",
        "bb10",
        "windows phone",
        "iemobile",
        "opera mini",
        "opera mobi",
        "webos",
        "symbian",
        "kaios",
        "nokia",
    ])
});

fn keyword_set(keywords: &[&str]) -> AhoCorasick {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(keywords)
        .expect("static keyword table")
}

/// Split a dot-delimited version into major/minor/patch.
///
/// Anything that is not a non-empty string yields all-`None` components with
/// `raw` still holding the original value. Segments past the third are
/// dropped.
pub fn split_version(version: &Value) -> VersionParts {
    let Some(s) = version.as_str().filter(|s| !s.is_empty()) else {
        return VersionParts {
            raw: version.clone(),
            major: None,
            minor: None,
            patch: None,
        };
    };

    let mut segments = s
        .split('.')
        .map(|seg| Some(seg.to_string()).filter(|seg| !seg.is_empty()));
    VersionParts {
        raw: version.clone(),
        major: segments.next().flatten(),
        minor: segments.next().flatten(),
        patch: segments.next().flatten(),
    }
}

/// Infer a device category.
///
/// An explicit backend token wins (bot tokens included); otherwise the UA is
/// checked for bot, tablet and mobile markers in that order, defaulting to
/// desktop.
pub fn classify_device(explicit_type: Option<&str>, ua: &str) -> DeviceCategory {
    if let Some(category) = explicit_type.and_then(DeviceCategory::from_token) {
        return category;
    }

    if BOT_PATTERN.is_match(ua) {
        return DeviceCategory::Bot;
    }
    form_factor(ua)
}

/// Tablet/phone/desktop from UA markers alone, never bot.
pub(crate) fn form_factor(ua: &str) -> DeviceCategory {
    let android = ua.to_ascii_lowercase().contains("android");
    let mobile_marker = MOBILE_KEYWORDS.is_match(ua);

    // Android without any mobile marker is almost always a tablet build.
    if TABLET_KEYWORDS.is_match(ua) || (android && !mobile_marker) {
        return DeviceCategory::Tablet;
    }
    if mobile_marker || android {
        return DeviceCategory::Phone;
    }
    DeviceCategory::Desktop
}

/// Heuristic bot detection. Not suitable on its own for blocking decisions.
pub fn detect_bot(explicit: Option<&Value>, name: Option<&str>, ua: &str) -> bool {
    explicit.is_some_and(is_truthy)
        || name.is_some_and(|n| BOT_NAME_PATTERN.is_match(n))
        || BOT_PATTERN.is_match(ua)
}

/// JavaScript-style truthiness, with empty arrays and objects counted as
/// false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Simple semver-ish comparison: is `a < b`?  Compares dot-separated numeric
/// components left to right (missing components treated as 0).
pub(crate) fn version_lt(a: &str, b: &str) -> bool {
    let mut ai = a.split('.');
    let mut bi = b.split('.');
    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return false,
            (None, Some(bv)) => return bv.parse::<u32>().unwrap_or(0) > 0,
            (Some(_), None) => return false,
            (Some(av), Some(bv)) => {
                let an = av.parse::<u32>().unwrap_or(0);
                let bn = bv.parse::<u32>().unwrap_or(0);
                if an < bn {
                    return true;
                }
                if an > bn {
                    return false;
                }
            }
        }
    }
}

/// Simple semver-ish comparison: is `a >= b`?
pub(crate) fn version_ge(a: &str, b: &str) -> bool {
    !version_lt(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_full_version() {
        let parts = split_version(&json!("120.0.1"));
        assert_eq!(parts.raw, json!("120.0.1"));
        assert_eq!(parts.major.as_deref(), Some("120"));
        assert_eq!(parts.minor.as_deref(), Some("0"));
        assert_eq!(parts.patch.as_deref(), Some("1"));
    }

    #[test]
    fn split_major_only() {
        let parts = split_version(&json!("7"));
        assert_eq!(parts.major.as_deref(), Some("7"));
        assert_eq!(parts.minor, None);
        assert_eq!(parts.patch, None);
    }

    #[test]
    fn split_null_and_non_string() {
        let parts = split_version(&Value::Null);
        assert_eq!(parts.raw, Value::Null);
        assert_eq!((parts.major, parts.minor, parts.patch), (None, None, None));

        let parts = split_version(&json!(""));
        assert_eq!(parts.raw, json!(""));
        assert_eq!(parts.major, None);

        let parts = split_version(&json!(12));
        assert_eq!(parts.raw, json!(12));
        assert_eq!(parts.major, None);
    }

    #[test]
    fn split_drops_extra_segments() {
        let parts = split_version(&json!("108.0.5359.128"));
        assert_eq!(parts.patch.as_deref(), Some("5359"));
    }

    #[test]
    fn classify_from_ua() {
        let ipad = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/605.1.15";
        assert_eq!(classify_device(None, ipad), DeviceCategory::Tablet);

        let googlebot = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
        assert_eq!(classify_device(None, googlebot), DeviceCategory::Bot);

        let windows = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(classify_device(None, windows), DeviceCategory::Desktop);

        let pixel = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6090.0 Mobile Safari/537.36";
        assert_eq!(classify_device(None, pixel), DeviceCategory::Phone);

        let opera_mini = "Opera/9.80 (Android; Opera Mini/58.0.2254/191.249; U; en) Presto/2.12.423 Version/12.16";
        assert_eq!(classify_device(None, opera_mini), DeviceCategory::Phone);

        let android_tablet = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(classify_device(None, android_tablet), DeviceCategory::Tablet);

        assert_eq!(classify_device(None, ""), DeviceCategory::Desktop);
    }

    #[test]
    fn explicit_type_wins_over_ua() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert_eq!(classify_device(Some("tv"), iphone), DeviceCategory::Tv);
        assert_eq!(classify_device(Some("crawler"), iphone), DeviceCategory::Bot);
        assert_eq!(classify_device(Some(""), iphone), DeviceCategory::Phone);
    }

    #[test]
    fn form_factor_ignores_bot_keywords() {
        let smartphone_bot = "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X) Mobile Safari/537.36 (compatible; Googlebot/2.1)";
        assert_eq!(form_factor(smartphone_bot), DeviceCategory::Phone);
        assert_eq!(classify_device(None, smartphone_bot), DeviceCategory::Bot);
    }

    #[test]
    fn bot_detection() {
        assert!(detect_bot(None, None, "Mozilla/5.0 (compatible; ChatGPTBot/1.0; +https://chat.openai.com/bot)"));
        assert!(detect_bot(None, None, "curl/8.5.0"));
        assert!(detect_bot(Some(&json!({"name": "Googlebot"})), None, ""));
        assert!(detect_bot(None, Some("Baiduspider"), ""));
        assert!(!detect_bot(Some(&json!({})), None, "Mozilla/5.0 (X11; Linux x86_64)"));
        assert!(!detect_bot(Some(&json!(false)), None, "Mozilla/5.0 (Macintosh)"));
        assert!(!detect_bot(None, None, "Mozilla/5.0 (Linux; Android 14; Pixel 8) Mobile Safari/537.36"));
        assert!(detect_bot(None, None, "Mozilla/5.0 (compatible; YandexBot/3.0; +http://yandex.com/bots)"));
        assert!(detect_bot(None, None, "DuckDuckBot-Https/1.1; (+https://duckduckgo.com/duckduckbot)"));
        assert!(detect_bot(None, None, "Mozilla/5.0 (compatible; Baiduspider/2.0; +http://www.baidu.com/search/spider.html)"));
    }

    #[test]
    fn brand_ending_in_bot_is_a_phone() {
        let cubot = "Mozilla/5.0 (Linux; Android 9; CUBOT X19) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
        assert!(!detect_bot(None, None, cubot));
        assert_eq!(classify_device(None, cubot), DeviceCategory::Phone);

        let cubot_tablet = "Mozilla/5.0 (Linux; Android 10; CUBOT_TAB_10) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(classify_device(None, cubot_tablet), DeviceCategory::Tablet);

        assert!(detect_bot(None, Some("Googlebot"), ""));
        assert!(!detect_bot(None, Some("Chrome Mobile"), cubot));
    }

    #[test]
    fn version_comparison() {
        assert!(version_lt("1.9", "2.0"));
        assert!(version_ge("4.0.1", "4"));
        assert!(!version_lt("10", "9.9"));
    }
}
