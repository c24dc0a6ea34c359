//! Per-context escaping rule tables
//!
//! Every context maps a codepoint to a [`Rule`]. Codepoints up to 0xFF are
//! looked up in a 256-entry table built at compile time; everything above
//! shares one fallback rule per context.
//!
//! | Context         | Passes unchanged                     | Above 0xFF |
//! |-----------------|--------------------------------------|------------|
//! | `Html`          | all but `' " < > &`                  | pass       |
//! | `HtmlAttribute` | ASCII alphanumerics and `, . - _`    | escape     |
//! | `Js`            | ASCII alphanumerics and `, . _`      | escape     |
//! | `Css`           | ASCII alphanumerics                  | escape     |
//! | `Url`           | ASCII alphanumerics and `- . _ ~`    | escape     |

use std::fmt;

/// Entity used in attribute values for characters undefined in HTML
pub const REPLACEMENT_ENTITY: &str = "&#xFFFD;";

const ATTRIBUTE_IMMUNE: &[u8] = b",.-_";
const JS_IMMUNE: &[u8] = b",._";
const URL_UNRESERVED: &[u8] = b"-._~";

/// Output context an escaper targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// HTML body text
    Html = 0,
    /// Quoted or unquoted HTML attribute value
    HtmlAttribute = 1,
    /// JavaScript string literal
    Js = 2,
    /// CSS token or string value
    Css = 3,
    /// URL component (path segment, query parameter)
    Url = 4,
}

/// What to do with a single codepoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Emit the codepoint unchanged
    Pass,
    /// Emit a fixed token instead
    Replace(&'static str),
    /// Format the codepoint with the context's escape syntax
    Escape,
}

struct RuleTable {
    narrow: [Rule; 256],
    wide: Rule,
}

static TABLES: [RuleTable; 5] = [
    RuleTable::build(Context::Html),
    RuleTable::build(Context::HtmlAttribute),
    RuleTable::build(Context::Js),
    RuleTable::build(Context::Css),
    RuleTable::build(Context::Url),
];

impl Context {
    pub const ALL: [Context; 5] = [
        Context::Html,
        Context::HtmlAttribute,
        Context::Js,
        Context::Css,
        Context::Url,
    ];

    /// Look up the rule for a codepoint
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contextual_escaper::rules::{Context, Rule};
    ///
    /// assert_eq!(Context::Html.rule('<'), Rule::Replace("&lt;"));
    /// assert_eq!(Context::Js.rule('-'), Rule::Escape);
    /// assert_eq!(Context::HtmlAttribute.rule('-'), Rule::Pass);
    /// ```
    pub fn rule(self, codepoint: char) -> Rule {
        let table = &TABLES[self as usize];
        match u8::try_from(u32::from(codepoint)) {
            Ok(byte) => table.narrow[usize::from(byte)],
            Err(_) => table.wide,
        }
    }

    /// Punctuation that passes unescaped in addition to ASCII alphanumerics
    pub const fn immune(self) -> &'static [u8] {
        match self {
            Context::Html | Context::Css => &[],
            Context::HtmlAttribute => ATTRIBUTE_IMMUNE,
            Context::Js => JS_IMMUNE,
            Context::Url => URL_UNRESERVED,
        }
    }

    /// Whether everything not explicitly allowed gets escaped
    pub const fn is_default_deny(self) -> bool {
        !matches!(self, Context::Html)
    }

    /// Stable lowercase name, used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Context::Html => "html",
            Context::HtmlAttribute => "html_attribute",
            Context::Js => "js",
            Context::Css => "css",
            Context::Url => "url",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl RuleTable {
    const fn build(context: Context) -> Self {
        let mut narrow = [Rule::Escape; 256];
        let mut byte = 0;
        while byte < 256 {
            narrow[byte] = classify(context, byte as u8);
            byte += 1;
        }

        let wide = if context.is_default_deny() {
            Rule::Escape
        } else {
            Rule::Pass
        };

        Self { narrow, wide }
    }
}

const fn classify(context: Context, byte: u8) -> Rule {
    if byte.is_ascii_alphanumeric() || contains(context.immune(), byte) {
        return Rule::Pass;
    }
    if let Some(entity) = named_entity(context, byte) {
        return Rule::Replace(entity);
    }
    if matches!(context, Context::HtmlAttribute) && is_undefined_in_html(byte) {
        return Rule::Replace(REPLACEMENT_ENTITY);
    }
    if context.is_default_deny() {
        Rule::Escape
    } else {
        Rule::Pass
    }
}

const fn named_entity(context: Context, byte: u8) -> Option<&'static str> {
    match (context, byte) {
        (Context::Html, b'\'') => Some("&#039;"),
        (Context::Html | Context::HtmlAttribute, b'"') => Some("&quot;"),
        (Context::Html | Context::HtmlAttribute, b'&') => Some("&amp;"),
        (Context::Html | Context::HtmlAttribute, b'<') => Some("&lt;"),
        (Context::Html | Context::HtmlAttribute, b'>') => Some("&gt;"),
        _ => None,
    }
}

/// C0 controls other than tab, LF and CR, plus DEL and the C1 range
///
/// Checked against decoded codepoints, so U+0080..=U+009F qualify even when
/// the source is UTF-8 and the character spans two bytes.
const fn is_undefined_in_html(byte: u8) -> bool {
    (byte <= 0x1F && !matches!(byte, b'\t' | b'\n' | b'\r')) || (byte >= 0x7F && byte <= 0x9F)
}

const fn contains(set: &[u8], byte: u8) -> bool {
    let mut i = 0;
    while i < set.len() {
        if set[i] == byte {
            return true;
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_alnum(cp: u32) -> bool {
        char::from_u32(cp).is_some_and(|c| c.is_ascii_alphanumeric())
    }

    #[test]
    fn test_alphanumerics_pass_everywhere() {
        for context in Context::ALL {
            for ch in ('0'..='9').chain('a'..='z').chain('A'..='Z') {
                assert_eq!(context.rule(ch), Rule::Pass, "{} in {}", ch, context);
            }
        }
    }

    #[test]
    fn test_html_only_five_specials() {
        let specials = ['\'', '"', '<', '>', '&'];
        for cp in 0..=0xFFu32 {
            let ch = char::from_u32(cp).unwrap();
            let rule = Context::Html.rule(ch);
            if specials.contains(&ch) {
                assert!(matches!(rule, Rule::Replace(_)));
            } else {
                assert_eq!(rule, Rule::Pass, "U+{:04X}", cp);
            }
        }
        assert_eq!(Context::Html.rule('\u{10000}'), Rule::Pass);
    }

    #[test]
    fn test_attribute_undefined_characters_use_replacement() {
        for cp in (0x00..=0x08).chain([0x0B, 0x0C]).chain(0x0E..=0x1F).chain(0x7F..=0x9F) {
            let ch = char::from_u32(cp).unwrap();
            assert_eq!(
                Context::HtmlAttribute.rule(ch),
                Rule::Replace(REPLACEMENT_ENTITY),
                "U+{:04X}",
                cp
            );
        }
        for ch in ['\t', '\n', '\r', ' ', '\u{A0}'] {
            assert_eq!(Context::HtmlAttribute.rule(ch), Rule::Escape);
        }
    }

    #[test]
    fn test_immune_sets() {
        assert_eq!(Context::HtmlAttribute.immune(), b",.-_");
        assert_eq!(Context::Js.immune(), b",._");
        assert_eq!(Context::Url.immune(), b"-._~");
        assert!(Context::Css.immune().is_empty());
        assert_eq!(Context::Js.rule('-'), Rule::Escape);
        assert_eq!(Context::Css.rule('_'), Rule::Escape);
        assert_eq!(Context::Url.rule('+'), Rule::Escape);
        assert_eq!(Context::Url.rule('~'), Rule::Pass);
    }

    #[test]
    fn test_default_deny_contexts_escape_above_latin1() {
        for context in [Context::HtmlAttribute, Context::Js, Context::Css, Context::Url] {
            assert!(context.is_default_deny());
            assert_eq!(context.rule('\u{100}'), Rule::Escape);
            assert_eq!(context.rule('\u{10FFFF}'), Rule::Escape);
        }
    }

    #[test]
    fn test_default_deny_pass_set_is_alnum_plus_immune() {
        for context in [Context::HtmlAttribute, Context::Js, Context::Css, Context::Url] {
            for cp in 0..=0xFFu32 {
                let ch = char::from_u32(cp).unwrap();
                let expected_pass = is_alnum(cp) || context.immune().contains(&(cp as u8));
                assert_eq!(
                    context.rule(ch) == Rule::Pass,
                    expected_pass,
                    "U+{:04X} in {}",
                    cp,
                    context
                );
            }
        }
    }

    #[test]
    fn test_context_names() {
        assert_eq!(Context::HtmlAttribute.to_string(), "html_attribute");
        assert_eq!(Context::Url.name(), "url");
    }
}
