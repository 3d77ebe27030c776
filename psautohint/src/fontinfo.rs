//! Font-level key/value data.

use std::collections::BTreeMap;

/// Source of font-level values, looked up by key.
///
/// Values are returned as raw text; [`FontContext::from_font_info`]
/// interprets them.
///
/// [`FontContext::from_font_info`]: crate::FontContext::from_font_info
pub trait FontInfo {
    fn get(&self, key: &str) -> Option<&str>;
}

impl FontInfo for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }
}

impl<T: FontInfo + ?Sized> FontInfo for &T {
    fn get(&self, key: &str) -> Option<&str> {
        (**self).get(key)
    }
}

/// Font info parsed from the line based `Key value` text format.
///
/// Values may be numbers, bracketed lists that span several lines,
/// parenthesised strings or `true`/`false`. Lines starting with `#` or `%`
/// are comments.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct FontInfoMap {
    entries: BTreeMap<String, String>,
}

impl FontInfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let mut map = Self::new();
        let mut pending: Option<(String, String)> = None;
        for line in text.lines() {
            let line = line.trim();
            if let Some((key, mut value)) = pending.take() {
                value.push(' ');
                value.push_str(line);
                if line.contains(']') {
                    map.insert(key, value);
                } else {
                    pending = Some((key, value));
                }
                continue;
            }
            if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
                continue;
            }
            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line, ""),
            };
            if value.starts_with('[') && !value.contains(']') {
                pending = Some((key.into(), value.into()));
                continue;
            }
            let value = value
                .strip_prefix('(')
                .and_then(|v| v.strip_suffix(')'))
                .unwrap_or(value);
            map.insert(key, value);
        }
        if let Some((key, _)) = pending {
            log::warn!("font info list for {key} is not terminated");
        }
        map
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FontInfo for FontInfoMap {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

pub(crate) fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a whitespace separated list, with or without brackets.
pub(crate) fn parse_list(value: &str) -> Option<Vec<f64>> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(|c: char| c.is_whitespace() || c == '[' || c == ']')
        .filter(|item| !item.is_empty())
        .map(parse_number)
        .collect()
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_test_font() {
        let info = FontInfoMap::parse(bez_test_data::fontinfo::TEST_SANS);
        assert_eq!(info.get("OrigEmSqUnits"), Some("1000"));
        assert_eq!(info.get("FontName"), Some("TestSans-Regular"));
        assert_eq!(info.get("StemSnapV"), Some("[80 100]"));
        assert_eq!(info.get("FlexOK").and_then(parse_bool), Some(true));
        assert_eq!(info.get("Missing"), None);
    }

    #[test]
    fn multi_line_lists_and_comments() {
        let info = FontInfoMap::parse(
            "# comment\n% also a comment\nBlueValues [\n  -12 0\n  700 712\n]\nFlexStrict false\n",
        );
        assert_eq!(info.len(), 2);
        let blues = info.get("BlueValues").and_then(parse_list).unwrap();
        assert_eq!(blues, [-12.0, 0.0, 700.0, 712.0]);
        assert_eq!(info.get("FlexStrict").and_then(parse_bool), Some(false));
    }

    #[test]
    fn value_parsers() {
        assert_eq!(parse_number(" 2048 "), Some(2048.0));
        assert_eq!(parse_number("1e999"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_list("[1 2.5 3]"), Some(vec![1.0, 2.5, 3.0]));
        assert_eq!(parse_list("1 2"), Some(vec![1.0, 2.0]));
        assert_eq!(parse_list("[]"), Some(vec![]));
        assert_eq!(parse_list("[1 x]"), None);
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn maps_are_font_info() {
        let mut map = BTreeMap::new();
        map.insert("BlueFuzz".to_string(), "0".to_string());
        fn fuzz(info: impl FontInfo) -> Option<f64> {
            info.get("BlueFuzz").and_then(parse_number)
        }
        assert_eq!(fuzz(&map), Some(0.0));
        let mut info = FontInfoMap::new();
        info.insert("BlueFuzz", "2");
        assert_eq!(fuzz(&info), Some(2.0));
    }
}
