use super::parser::Captures;
use std::borrow::Cow;

fn trim(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_whitespace() || c == '.')
}

/// Replace `$1`, `$2`, ... in `template` with capture groups, then trim
/// trailing whitespace and dots. Borrows when there is nothing to replace.
pub(crate) fn substitute<'a>(template: &'a str, captures: &Captures) -> Cow<'a, str> {
    if !template.contains('$') {
        return Cow::Borrowed(trim(template));
    }

    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(idx) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                if let Some(group) = captures.get_str(idx as usize) {
                    result.push_str(group);
                }
                continue;
            }
        }
        result.push(c);
    }

    let trimmed_len = trim(&result).len();
    result.truncate(trimmed_len);
    Cow::Owned(result)
}

/// Group `i` as a borrowed string, empty when absent. Underscores become
/// dots so `17_0` reads as `17.0`.
pub(crate) fn capture_or_empty<'a>(captures: &Captures<'a>, i: usize) -> Cow<'a, str> {
    match captures.get_str(i) {
        Some(s) if s.contains('_') => Cow::Owned(s.replace('_', ".")),
        Some(s) => Cow::Borrowed(s),
        None => Cow::Borrowed(""),
    }
}

/// Apply a version template, or take group 1 when there is none.
pub(crate) fn version<'a>(template: Option<&'a str>, captures: &Captures<'a>) -> Cow<'a, str> {
    match template {
        Some(tpl) => match substitute(tpl, captures) {
            Cow::Owned(s) => Cow::Owned(s.replace('_', ".")),
            borrowed => borrowed,
        },
        None => capture_or_empty(captures, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::Matcher;

    fn caps<'a>(pattern: &str, text: &'a str) -> Captures<'a> {
        Matcher::compile(pattern).unwrap().captures(text).unwrap()
    }

    #[test]
    fn basic_substitution() {
        let c = caps(r"(Chrome)/(\d+)\.(\d+)", "Chrome/120.0");
        assert_eq!(substitute("$1 v$2.$3", &c), "Chrome v120.0");
    }

    #[test]
    fn no_placeholders() {
        let c = caps(r"(Chrome)", "Chrome");
        assert_eq!(substitute("Safari", &c), "Safari");
        assert!(matches!(substitute("Safari", &c), Cow::Borrowed(_)));
    }

    #[test]
    fn missing_group_is_ignored() {
        let c = caps(r"(Chrome)", "Chrome");
        assert_eq!(substitute("$1 $2", &c), "Chrome");
    }

    #[test]
    fn underscored_versions() {
        let c = caps(r"OS (\d+[_\d]*)", "CPU iPhone OS 17_0_1 like Mac OS X");
        assert_eq!(capture_or_empty(&c, 1), "17.0.1");
        assert_eq!(version(Some("$1"), &c), "17.0.1");
        assert_eq!(capture_or_empty(&c, 2), "");
    }
}
