//! `U+XXXX` escapes decoded to the character they name.

use std::borrow::Cow;

use super::{compile_insensitive, Matcher, Pattern, PatternError};

/// `U+` followed by 2-6 alphanumerics, at start of text or after whitespace.
///
/// Alphanumerics rather than hex digits: `U+ZZZZ` still matches and falls
/// back to itself in [`UnicodePattern::transform`].
pub const UNICODE_ESCAPE_REGEX: &str = r"(?<![^\s])U\+[A-Za-z0-9]{2,6}\b";

/// Decode `U+1F602` into `'😂'`.
///
/// Returns `None` for invalid hex, surrogates and values past `U+10FFFF`.
pub fn decode_escape(escape: &str) -> Option<char> {
    let hex = escape.get(2..)?;
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Pattern converting hex escapes to their unicode scalar.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodePattern;

impl Pattern for UnicodePattern {
    fn name(&self) -> &str {
        "unicode"
    }

    fn compile(&self) -> Result<Box<dyn Matcher>, PatternError> {
        compile_insensitive(self.name(), UNICODE_ESCAPE_REGEX)
    }

    fn transform<'a>(&self, matched: &'a str) -> Cow<'a, str> {
        match decode_escape(matched) {
            Some(c) => Cow::Owned(c.to_string()),
            None => Cow::Borrowed(matched),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_emoji_escape() {
        assert_eq!(decode_escape("U+1F602"), Some('😂'));
        assert_eq!(decode_escape("u+00e9"), Some('é'));
    }

    #[test]
    fn rejects_invalid_hex_and_surrogates() {
        assert_eq!(decode_escape("U+ZZZZ"), None);
        assert_eq!(decode_escape("U+D800"), None);
        assert_eq!(decode_escape("U+FFFFFF"), None);
        assert_eq!(decode_escape("U+"), None);
    }

    #[test]
    fn transform_falls_back_to_input() {
        assert_eq!(UnicodePattern.transform("U+ZZZZ"), "U+ZZZZ");
        assert_eq!(UnicodePattern.transform("U+1F602"), "😂");
    }

    #[test]
    fn matches_case_insensitively_after_whitespace() {
        let text = "U+41 and u+1f602 butnotU+41";
        let matcher = UnicodePattern.compile().unwrap();
        let found: Vec<_> = matcher
            .match_units(text)
            .unwrap()
            .into_iter()
            .map(|unit| &text[unit.range])
            .collect();
        assert_eq!(found, vec!["U+41", "u+1f602"]);
    }
}
