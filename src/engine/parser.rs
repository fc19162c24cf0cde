use rayon::prelude::*;

use crate::error::Result;

/// Matomo's word-boundary-like prefix applied to all regexes.
const MATOMO_BOUNDARY_PREFIX: &str = r"(?:^|[^A-Z0-9_\-]|[^A-Z0-9\-]_|sprd\-|MZ\-)";

/// Full Matomo-prefixed, case-insensitive pattern.
pub(crate) fn full_pattern(pattern: &str) -> String {
    format!("(?i){}(?:{})", MATOMO_BOUNDARY_PREFIX, pattern)
}

/// Captures from whichever engine matched.
pub(crate) enum Captures<'a> {
    Standard(regex::Captures<'a>),
    Fancy(fancy_regex::Captures<'a>),
}

impl<'a> Captures<'a> {
    /// Text of group `i`, or `None` if it didn't participate.
    pub fn get_str(&self, i: usize) -> Option<&'a str> {
        match self {
            Captures::Standard(c) => c.get(i).map(|m| m.as_str()),
            Captures::Fancy(c) => c.get(i).map(|m| m.as_str()),
        }
    }
}

/// A compiled pattern. The `regex` crate is used whenever it accepts the
/// pattern; lookarounds and backreferences fall back to `fancy_regex`.
pub(crate) enum Matcher {
    Standard(regex::Regex),
    Fancy(fancy_regex::Regex),
}

impl Matcher {
    pub fn compile(full: &str) -> Result<Self> {
        match regex::Regex::new(full) {
            Ok(re) => Ok(Self::Standard(re)),
            Err(_) => Ok(Self::Fancy(fancy_regex::Regex::new(full)?)),
        }
    }

    /// Compile with the Matomo prefix applied.
    pub fn matomo(pattern: &str) -> Result<Self> {
        Self::compile(&full_pattern(pattern))
    }

    pub fn is_match(&self, ua: &str) -> bool {
        match self {
            Self::Standard(re) => re.is_match(ua),
            // Backtrack-limit errors count as no match.
            Self::Fancy(re) => re.is_match(ua).unwrap_or(false),
        }
    }

    pub fn captures<'a>(&self, ua: &'a str) -> Option<Captures<'a>> {
        match self {
            Self::Standard(re) => re.captures(ua).map(Captures::Standard),
            Self::Fancy(re) => re.captures(ua).ok().flatten().map(Captures::Fancy),
        }
    }

    fn is_fancy(&self) -> bool {
        matches!(self, Self::Fancy(_))
    }
}

pub(crate) struct CompiledEntry<T> {
    pub matcher: Matcher,
    pub data: T,
}

pub(crate) struct MatchResult<'a, T> {
    pub data: &'a T,
    pub captures: Captures<'a>,
}

/// Ordered rule list: the first entry whose pattern matches wins.
pub(crate) struct CompiledParser<T> {
    entries: Vec<CompiledEntry<T>>,
}

impl<T: Send> CompiledParser<T> {
    /// Compile `(pattern, data)` pairs in parallel, keeping their order.
    pub fn build(items: impl IntoIterator<Item = (String, T)>) -> Result<Self> {
        let items: Vec<(String, T)> = items.into_iter().collect();
        let entries = items
            .into_par_iter()
            .map(|(pattern, data)| {
                Ok(CompiledEntry {
                    matcher: Matcher::matomo(&pattern)?,
                    data,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::trace!(
            entries = entries.len(),
            fancy = entries.iter().filter(|e| e.matcher.is_fancy()).count(),
            "compiled rule list"
        );
        Ok(Self { entries })
    }
}

impl<T> CompiledParser<T> {
    pub fn match_first<'a>(&'a self, ua: &'a str) -> Option<MatchResult<'a, T>> {
        match_entries(ua, &self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn match_entries<'a, T>(ua: &'a str, entries: &'a [CompiledEntry<T>]) -> Option<MatchResult<'a, T>> {
    entries.iter().find_map(|entry| {
        Some(MatchResult {
            data: &entry.data,
            captures: entry.matcher.captures(ua)?,
        })
    })
}

/// Skips a whole device file unless the UA carries its marker.
pub(crate) enum Gate {
    Always,
    /// UA must match this regex.
    Marker(Matcher),
    /// UA must match at least one brand regex of the file (all brand
    /// patterns OR'd into one).
    AnyBrand(Matcher),
}

impl Gate {
    pub fn any_brand(brand_regexes: &[String]) -> Result<Self> {
        if brand_regexes.is_empty() {
            return Ok(Self::Always);
        }
        Ok(Self::AnyBrand(Matcher::matomo(&brand_regexes.join("|"))?))
    }

    pub fn admits(&self, ua: &str) -> bool {
        match self {
            Self::Always => true,
            Self::Marker(re) | Self::AnyBrand(re) => re.is_match(ua),
        }
    }
}

pub(crate) struct BrandEntry<B, M> {
    pub gate: Matcher,
    pub data: B,
    pub models: Vec<CompiledEntry<M>>,
}

pub(crate) struct BrandMatchResult<'a, B, M> {
    pub brand_data: &'a B,
    /// Brand regex captures, used when no model matches.
    pub brand_captures: Captures<'a>,
    pub model_match: Option<MatchResult<'a, M>>,
}

/// Two-level matching for device files: brand regex first, then that
/// brand's model regexes.
pub(crate) struct DeviceBrandParser<B, M> {
    brands: Vec<BrandEntry<B, M>>,
}

impl<B, M> DeviceBrandParser<B, M> {
    pub fn new(brands: Vec<BrandEntry<B, M>>) -> Self {
        Self { brands }
    }

    pub fn match_first<'a>(&'a self, ua: &'a str) -> Option<BrandMatchResult<'a, B, M>> {
        self.brands.iter().find_map(|brand| {
            let brand_captures = brand.gate.captures(ua)?;
            Some(BrandMatchResult {
                brand_data: &brand.data,
                brand_captures,
                model_match: match_entries(ua, &brand.models),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins_across_engines() {
        let parser = CompiledParser::build(vec![
            (r"Chrome(?!.*Edg)/(\d+)".to_string(), "chrome-fancy"),
            (r"Chrome/(\d+)".to_string(), "chrome"),
        ])
        .unwrap();
        assert!(parser.entries[0].matcher.is_fancy());
        assert!(!parser.entries[1].matcher.is_fancy());

        let m = parser.match_first("Mozilla/5.0 Chrome/120.0").unwrap();
        assert_eq!(*m.data, "chrome-fancy");
        assert_eq!(m.captures.get_str(1), Some("120"));

        let m = parser.match_first("Mozilla/5.0 Chrome/120.0 Edg/120.0").unwrap();
        assert_eq!(*m.data, "chrome");
    }

    #[test]
    fn boundary_prefix_applies() {
        let parser = CompiledParser::build(vec![("bot".to_string(), ())]).unwrap();
        assert!(parser.match_first("some bot/1.0").is_some());
        assert!(parser.match_first("Abbot").is_none());
    }

    #[test]
    fn gate_over_all_brands() {
        let gate = Gate::any_brand(&["PlayStation".into(), "Xbox".into()]).unwrap();
        assert!(gate.admits("Mozilla/5.0 (PlayStation 5 3.00)"));
        assert!(!gate.admits("Mozilla/5.0 (Windows NT 10.0)"));
        assert!(Gate::any_brand(&[]).unwrap().admits(""));
    }
}
