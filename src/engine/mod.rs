//! Bundled Matomo-format regex detector.
//!
//! Ships a curated rule set compiled into the binary; a full
//! `device-detector/regexes` checkout can be loaded instead with
//! [`RegexDetector::from_dir`]. Results are shaped like device-detector-js
//! output so the same adapter handles either.

mod parser;
mod rules;
mod substitution;

use crate::error::{Error, Result};
use crate::helpers::{version_ge, version_lt};
use crate::types::*;
use parser::{BrandEntry, CompiledEntry, CompiledParser, DeviceBrandParser, Gate, Matcher};
use rayon::prelude::*;
use rules::{BotRule, BrandMap, ClientRule, EngineRule, ModelRule, OsRule, Rule};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use substitution::{capture_or_empty, substitute, version};

/// Rule files compiled into the binary, by path relative to `regexes/`.
const BUNDLED: &[(&str, &str)] = &[
    ("bots.yml", include_str!("../../regexes/bots.yml")),
    ("oss.yml", include_str!("../../regexes/oss.yml")),
    ("client/browsers.yml", include_str!("../../regexes/client/browsers.yml")),
    ("client/feed_readers.yml", include_str!("../../regexes/client/feed_readers.yml")),
    ("client/mobile_apps.yml", include_str!("../../regexes/client/mobile_apps.yml")),
    ("client/libraries.yml", include_str!("../../regexes/client/libraries.yml")),
    ("client/browser_engine.yml", include_str!("../../regexes/client/browser_engine.yml")),
    ("device/televisions.yml", include_str!("../../regexes/device/televisions.yml")),
    ("device/consoles.yml", include_str!("../../regexes/device/consoles.yml")),
    ("device/mobiles.yml", include_str!("../../regexes/device/mobiles.yml")),
];

/// Client rule files in match order; in-app and feed-reader UAs embed a
/// browser token, so they go first.
const CLIENT_FILES: &[(&str, ClientType)] = &[
    ("client/feed_readers.yml", ClientType::FeedReader),
    ("client/mobile_apps.yml", ClientType::MobileApp),
    ("client/browsers.yml", ClientType::Browser),
    ("client/libraries.yml", ClientType::Library),
];

/// CPU platform markers, checked in order.
const PLATFORMS: &[(&str, &str)] = &[
    (r"arm[ _;)ev]|.*arm$|.*arm64|aarch64|Apple ?TV|Watch ?OS|Watch1,[12]", "ARM"),
    (r"loongarch64", "LoongArch64"),
    (r"mips", "MIPS"),
    (r"sh4", "SuperH"),
    (r"sparc64", "SPARC64"),
    (r"64-?bit|WOW64|(?:Intel)?x64|WINDOWS_64|win64|.*amd64|.*x86_?64", "x64"),
    (r".*32bit|.*win32|(?:i[0-9]|x)86|i86pc", "x86"),
];

const ANDROID_FAMILY: &[&str] = &[
    "Android",
    "Android TV",
    "Fire OS",
    "HarmonyOS",
    "Lineage OS",
    "Remix OS",
    "Wear OS",
    "Yun OS",
];

const DESKTOP_FAMILY: &[&str] = &[
    "Windows",
    "Mac",
    "GNU/Linux",
    "Ubuntu",
    "Debian",
    "Fedora",
    "Arch Linux",
    "Linux Mint",
    "Chrome OS",
    "FreeBSD",
    "OpenBSD",
    "NetBSD",
    "Solaris",
    "Haiku OS",
    "BeOS",
];

const TV_CLIENTS: &[&str] = &[
    "Kylo",
    "Espial TV Browser",
    "LUJO TV Browser",
    "Open TV Browser",
    "Opera Devices",
    "Vewd Browser",
    "TV Bro",
];

pub(crate) fn is_android_os(name: &str) -> bool {
    ANDROID_FAMILY.contains(&name)
}

pub(crate) fn is_desktop_os(name: &str) -> bool {
    DESKTOP_FAMILY.contains(&name)
}

/// Where rule files come from.
enum Source<'p> {
    Bundled,
    Dir(&'p Path),
}

impl Source<'_> {
    fn load<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let content = match self {
            Source::Bundled => Cow::Borrowed(
                BUNDLED
                    .iter()
                    .find(|(name, _)| *name == file)
                    .map(|(_, content)| *content)
                    .ok_or_else(|| Error::Config(format!("{file} is not bundled")))?,
            ),
            Source::Dir(dir) => Cow::Owned(std::fs::read_to_string(dir.join(file))?),
        };
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Compiled device-type heuristics, applied after brand matching.
struct Heuristics {
    vr: Matcher,
    chrome: Matcher,
    mobile_elibom: Matcher,
    pad_apad: Matcher,
    android_tablet: Matcher,
    opera_tablet: Matcher,
    android_mobile: Matcher,
    touch: Matcher,
    puffin_desktop: Matcher,
    puffin_smartphone: Matcher,
    puffin_tablet: Matcher,
    opera_tv: Matcher,
    android_tv: Matcher,
    smart_tv_tizen: Matcher,
    tv_fragment: Matcher,
    desktop_fragment: Matcher,
}

impl Heuristics {
    fn compile() -> Result<Self> {
        Ok(Self {
            vr: Matcher::matomo(r"Android( [.0-9]+)?; Mobile VR;| VR ")?,
            chrome: Matcher::matomo(r"Chrome/[.0-9]*")?,
            mobile_elibom: Matcher::matomo(r"(?:Mobile|eliboM)")?,
            pad_apad: Matcher::matomo(r"Pad/APad")?,
            android_tablet: Matcher::matomo(r"Android( [.0-9]+)?; Tablet;|Tablet(?! PC)|.*\-tablet$")?,
            opera_tablet: Matcher::matomo(r"Opera Tablet")?,
            android_mobile: Matcher::matomo(r"Android( [.0-9]+)?; Mobile;|.*\-mobile$")?,
            touch: Matcher::matomo("Touch")?,
            puffin_desktop: Matcher::matomo(r"Puffin/(?:\d+[.\d]+)[LMW]D")?,
            puffin_smartphone: Matcher::matomo(r"Puffin/(?:\d+[.\d]+)[AIFLW]P")?,
            puffin_tablet: Matcher::matomo(r"Puffin/(?:\d+[.\d]+)[AILW]T")?,
            opera_tv: Matcher::matomo(r"Opera TV Store| OMI/")?,
            android_tv: Matcher::matomo(
                r"Andr0id|(?:Android(?: UHD)?|Google) TV|\(lite\) TV|BRAVIA|Firebolt| TV$",
            )?,
            smart_tv_tizen: Matcher::matomo(r"SmartTV|Tizen.+ TV .+$")?,
            tv_fragment: Matcher::matomo(r"\(TV;")?,
            desktop_fragment: Matcher::matomo(r"Desktop(?: (?:x(?:32|64)|WOW64))?;")?,
        })
    }
}

/// One device file with its default type and gate.
struct DeviceFile {
    default_type: DeviceType,
    gate: Gate,
    /// A gate match alone settles the type, even without a brand match.
    claims_type: bool,
    parser: DeviceBrandParser<Brand, ModelRule>,
}

enum GateKind {
    Marker(&'static str),
    AnyBrand,
    Always,
}

const DEVICE_FILES: &[(&str, DeviceType, GateKind, bool)] = &[
    (
        "device/televisions.yml",
        DeviceType::Tv,
        GateKind::Marker(r"(?i)(?:HbbTV|SmartTvA)/"),
        true,
    ),
    ("device/consoles.yml", DeviceType::Console, GateKind::AnyBrand, false),
    ("device/mobiles.yml", DeviceType::Smartphone, GateKind::Always, false),
];

pub struct RegexDetector {
    bot_parser: CompiledParser<BotRule>,
    os_parser: CompiledParser<OsRule>,
    client_parsers: Vec<(ClientType, CompiledParser<ClientRule>)>,
    engine_parser: CompiledParser<EngineRule>,
    device_files: Vec<DeviceFile>,
    platforms: Vec<(Matcher, &'static str)>,
    heuristics: Heuristics,
}

impl RegexDetector {
    /// Build from the rule set compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::build(&Source::Bundled)
    }

    /// Build from a `regexes/` directory of a device-detector checkout
    /// (`bots.yml`, `oss.yml`, `client/`, `device/`).
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::build(&Source::Dir(dir.as_ref()))
    }

    fn build(source: &Source) -> Result<Self> {
        let (flat, device_files) = rayon::join(
            || -> Result<_> {
                let bots: Vec<Rule<BotRule>> = source.load("bots.yml")?;
                let bot_parser = CompiledParser::build(bots.into_iter().map(Rule::into_pair))?;

                let oss: Vec<Rule<OsRule>> = source.load("oss.yml")?;
                let os_parser = CompiledParser::build(oss.into_iter().map(Rule::into_pair))?;

                let client_parsers = CLIENT_FILES
                    .par_iter()
                    .map(|(file, kind)| {
                        let rules: Vec<Rule<ClientRule>> = source.load(file)?;
                        Ok((*kind, CompiledParser::build(rules.into_iter().map(Rule::into_pair))?))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let engines: Vec<Rule<EngineRule>> = source.load("client/browser_engine.yml")?;
                let engine_parser = CompiledParser::build(engines.into_iter().map(Rule::into_pair))?;

                Ok((bot_parser, os_parser, client_parsers, engine_parser))
            },
            || -> Result<Vec<DeviceFile>> {
                DEVICE_FILES
                    .par_iter()
                    .map(|(file, default_type, gate_kind, claims_type)| {
                        let (parser, brand_regexes) =
                            build_device_parser(source, file, *default_type)?;
                        let gate = match gate_kind {
                            GateKind::Marker(pattern) => Gate::Marker(Matcher::compile(pattern)?),
                            GateKind::AnyBrand => Gate::any_brand(&brand_regexes)?,
                            GateKind::Always => Gate::Always,
                        };
                        Ok(DeviceFile {
                            default_type: *default_type,
                            gate,
                            claims_type: *claims_type,
                            parser,
                        })
                    })
                    .collect()
            },
        );

        let (bot_parser, os_parser, client_parsers, engine_parser) = flat?;
        let platforms = PLATFORMS
            .iter()
            .map(|(pattern, name)| Ok((Matcher::matomo(pattern)?, *name)))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            bots = bot_parser.len(),
            oss = os_parser.len(),
            clients = client_parsers.iter().map(|(_, p)| p.len()).sum::<usize>(),
            "regex detector ready"
        );

        Ok(Self {
            bot_parser,
            os_parser,
            client_parsers,
            engine_parser,
            device_files: device_files?,
            platforms,
            heuristics: Heuristics::compile()?,
        })
    }

    /// Parse a User-Agent string. Bots short-circuit everything else.
    pub fn parse<'a>(&'a self, ua: &'a str) -> Detection<'a> {
        if let Some(m) = self.bot_parser.match_first(ua) {
            return Detection {
                bot: Some(Bot {
                    name: substitute(&m.data.name, &m.captures),
                    category: m.data.category.as_deref(),
                    url: m.data.url.as_deref(),
                    producer: m.data.producer.as_ref().map(|p| BotProducer {
                        name: p.name.as_deref(),
                        url: p.url.as_deref(),
                    }),
                }),
                ..Default::default()
            };
        }

        let os = self.os_parser.match_first(ua).map(|m| Os {
            name: substitute(&m.data.name, &m.captures),
            version: version(m.data.version.as_deref(), &m.captures),
            platform: Cow::Borrowed(self.platform(ua)),
        });
        let client = self.detect_client(ua);
        let device = self.detect_device(ua, os.as_ref(), client.as_ref());

        Detection {
            bot: None,
            os,
            client,
            device,
        }
    }

    fn platform(&self, ua: &str) -> &'static str {
        self.platforms
            .iter()
            .find(|(re, _)| re.is_match(ua))
            .map_or("", |(_, name)| name)
    }

    fn detect_client<'a>(&'a self, ua: &'a str) -> Option<Client<'a>> {
        self.client_parsers.iter().find_map(|(kind, parser)| {
            let m = parser.match_first(ua)?;
            let version = version(m.data.version.as_deref(), &m.captures);
            let (engine, engine_version) = self.resolve_engine(ua, m.data, &version);
            Some(Client {
                kind: *kind,
                name: substitute(&m.data.name, &m.captures),
                version,
                engine,
                engine_version,
            })
        })
    }

    /// The browser's default engine, overridden by version thresholds; the
    /// engine rules supply a version when they agree on the name.
    fn resolve_engine<'a>(
        &'a self,
        ua: &'a str,
        client: &'a ClientRule,
        browser_version: &str,
    ) -> (Cow<'a, str>, Cow<'a, str>) {
        let detected = self.engine_parser.match_first(ua);

        let Some(default_engine) = client.default_engine() else {
            return match detected {
                Some(m) => (Cow::Borrowed(m.data.name.as_str()), capture_or_empty(&m.captures, 1)),
                None => (Cow::Borrowed(""), Cow::Borrowed("")),
            };
        };

        let mut engine: &str = default_engine;
        if !browser_version.is_empty() {
            for (threshold, name) in client.engine_versions() {
                if version_ge(browser_version, threshold) {
                    engine = name;
                }
            }
        }

        match detected {
            Some(m) if !engine.is_empty() && m.data.name.eq_ignore_ascii_case(engine) => {
                (Cow::Borrowed(m.data.name.as_str()), capture_or_empty(&m.captures, 1))
            }
            _ => (Cow::Borrowed(engine), Cow::Borrowed("")),
        }
    }

    fn match_device_files<'a>(&'a self, ua: &'a str) -> Option<Device<'a>> {
        for file in &self.device_files {
            if !file.gate.admits(ua) {
                continue;
            }

            if let Some(m) = file.parser.match_first(ua) {
                let brand = m.brand_data;
                return Some(match &m.model_match {
                    Some(model_match) => {
                        let rule = model_match.data;
                        Device {
                            kind: Some(
                                rule.device
                                    .as_deref()
                                    .and_then(DeviceType::from_name)
                                    .unwrap_or(brand.device_type),
                            ),
                            brand: Cow::Borrowed(rule.brand.as_deref().unwrap_or(&brand.name)),
                            model: rule
                                .model
                                .as_deref()
                                .map_or(Cow::Borrowed(""), |tpl| substitute(tpl, &model_match.captures)),
                        }
                    }
                    None => Device {
                        kind: Some(brand.device_type),
                        brand: Cow::Borrowed(&brand.name),
                        model: brand
                            .model
                            .as_deref()
                            .map_or(Cow::Borrowed(""), |tpl| substitute(tpl, &m.brand_captures)),
                    },
                });
            }

            if file.claims_type {
                return Some(Device {
                    kind: Some(file.default_type),
                    brand: Cow::Borrowed(""),
                    model: Cow::Borrowed(""),
                });
            }
        }
        None
    }

    /// Brand/model from the device files, then the device-type heuristics.
    fn detect_device<'a>(
        &'a self,
        ua: &'a str,
        os: Option<&Os<'a>>,
        client: Option<&Client<'a>>,
    ) -> Option<Device<'a>> {
        let (mut device_type, mut brand, mut model) = match self.match_device_files(ua) {
            Some(d) => (d.kind, d.brand, d.model),
            None => (None, Cow::Borrowed(""), Cow::Borrowed("")),
        };
        if brand == "Unknown" {
            brand = Cow::Borrowed("");
        }

        let os_name = os.map_or("", |o| o.name.as_ref());
        let os_version = os.map_or("", |o| o.version.as_ref());
        let client_name = client.map_or("", |c| c.name.as_ref());
        let is_apple_os = matches!(os_name, "iPadOS" | "tvOS" | "watchOS" | "iOS" | "Mac");
        let is_android = is_android_os(os_name);

        if brand == "Apple" && !is_apple_os {
            device_type = None;
            brand = Cow::Borrowed("");
            model = Cow::Borrowed("");
        }
        if brand.is_empty() && is_apple_os {
            brand = Cow::Borrowed("Apple");
        }

        let h = &self.heuristics;

        if device_type.is_none() && h.vr.is_match(ua) {
            device_type = Some(DeviceType::Wearable);
        }

        // Chrome on Android: "Mobile" means phone, its absence a tablet.
        if device_type.is_none() && is_android && h.chrome.is_match(ua) {
            device_type = Some(if h.mobile_elibom.is_match(ua) {
                DeviceType::Smartphone
            } else {
                DeviceType::Tablet
            });
        }

        if device_type == Some(DeviceType::Smartphone) && h.pad_apad.is_match(ua) {
            device_type = Some(DeviceType::Tablet);
        }

        if device_type.is_none() && (h.android_tablet.is_match(ua) || h.opera_tablet.is_match(ua)) {
            device_type = Some(DeviceType::Tablet);
        }

        if device_type.is_none() && h.android_mobile.is_match(ua) {
            device_type = Some(DeviceType::Smartphone);
        }

        if device_type.is_none() && os_name == "Android" && !os_version.is_empty() {
            if version_lt(os_version, "2.0") {
                device_type = Some(DeviceType::Smartphone);
            } else if version_ge(os_version, "3.0") && version_lt(os_version, "4.0") {
                device_type = Some(DeviceType::Tablet);
            }
        }

        if device_type == Some(DeviceType::FeaturePhone) && is_android {
            device_type = Some(DeviceType::Smartphone);
        }

        if device_type.is_none() && os_name == "Java ME" {
            device_type = Some(DeviceType::FeaturePhone);
        }
        if os_name == "KaiOS" {
            device_type = Some(DeviceType::FeaturePhone);
        }

        // Windows 8+ with touch support.
        if device_type.is_none()
            && (os_name == "Windows RT"
                || (os_name == "Windows" && !os_version.is_empty() && version_ge(os_version, "8")))
            && h.touch.is_match(ua)
        {
            device_type = Some(DeviceType::Tablet);
        }

        if device_type.is_none() {
            device_type = [
                (&h.puffin_desktop, DeviceType::Desktop),
                (&h.puffin_smartphone, DeviceType::Smartphone),
                (&h.puffin_tablet, DeviceType::Tablet),
            ]
            .into_iter()
            .find(|(re, _)| re.is_match(ua))
            .map(|(_, kind)| kind);
        }

        if h.opera_tv.is_match(ua)
            || (device_type != Some(DeviceType::Tv) && h.android_tv.is_match(ua))
            || TV_CLIENTS.contains(&client_name)
        {
            device_type = Some(DeviceType::Tv);
        }

        if device_type.is_none() && (h.smart_tv_tizen.is_match(ua) || h.tv_fragment.is_match(ua)) {
            device_type = Some(DeviceType::Tv);
        }

        if device_type != Some(DeviceType::Desktop)
            && ua.contains("Desktop")
            && h.desktop_fragment.is_match(ua)
        {
            device_type = Some(DeviceType::Desktop);
        }

        if device_type.is_none() && is_desktop_os(os_name) {
            device_type = Some(DeviceType::Desktop);
        }

        (device_type.is_some() || !brand.is_empty()).then_some(Device {
            kind: device_type,
            brand,
            model,
        })
    }
}

/// A device brand: its name and type, with the file default applied.
struct Brand {
    name: String,
    model: Option<String>,
    device_type: DeviceType,
}

/// Returns the parser and the raw brand patterns (for [`Gate::any_brand`]).
fn build_device_parser(
    source: &Source,
    file: &str,
    default_type: DeviceType,
) -> Result<(DeviceBrandParser<Brand, ModelRule>, Vec<String>)> {
    let brands: BrandMap = source.load(file)?;
    let brands: Vec<(String, String, rules::BrandRule)> = brands
        .into_iter()
        .filter_map(|(name, mut rule)| Some((name, rule.regex.take()?, rule)))
        .collect();
    let brand_regexes = brands.iter().map(|(_, regex, _)| regex.clone()).collect();

    let entries = brands
        .into_par_iter()
        .map(|(name, regex, rule)| {
            let models = rule
                .models
                .into_iter()
                .map(|model| {
                    Ok(CompiledEntry {
                        matcher: Matcher::matomo(&model.regex)?,
                        data: model.data,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(BrandEntry {
                gate: Matcher::matomo(&regex)?,
                data: Brand {
                    name,
                    model: rule.model,
                    device_type: rule
                        .device
                        .as_deref()
                        .and_then(DeviceType::from_name)
                        .unwrap_or(default_type),
                },
                models,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((DeviceBrandParser::new(entries), brand_regexes))
}
