//! Context-aware escaping
//!
//! [`Escaper`] holds the source encoding and exposes one operation per output
//! context. Each operation decodes the input into codepoints, looks every
//! codepoint up in the context's rule table and formats the ones that need
//! escaping:
//!
//! | Context         | Escape syntax                                   |
//! |-----------------|-------------------------------------------------|
//! | `Html`          | named entities and `&#039;`                     |
//! | `HtmlAttribute` | `&#xHH;` up to 0xFF, `&#xHHHH;` above           |
//! | `Js`            | `\xHH`, `\uHHHH`, surrogate pairs above the BMP |
//! | `Css`           | `\H ` with minimal hex and a trailing space     |
//! | `Url`           | `%HH` per UTF-8 byte                            |
//!
//! Input that needs no escaping is returned borrowed.
//!
//! # Examples
//!
//! ```rust
//! use contextual_escaper::Escaper;
//!
//! let escaper = Escaper::new("utf-8").unwrap();
//! assert_eq!(escaper.escape_html("<b>"), "&lt;b&gt;");
//! assert_eq!(escaper.escape_html_attribute("a b"), "a&#x20;b");
//! assert_eq!(escaper.escape_js("</script>"), "\\x3C\\x2Fscript\\x3E");
//! assert_eq!(escaper.escape_css("red;"), "red\\3B ");
//! assert_eq!(escaper.escape_url("a&b=c"), "a%26b%3Dc");
//! ```

use std::borrow::Cow;
use std::fmt::Write;

use crate::codepoint;
use crate::encoding::SourceEncoding;
use crate::error::Result;
use crate::rules::{Context, REPLACEMENT_ENTITY, Rule};

/// Escapes untrusted text for one of several output contexts
///
/// An escaper is immutable once constructed and can be shared freely between
/// threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Escaper {
    encoding: SourceEncoding,
}

impl Escaper {
    /// Create an escaper for input in the given encoding
    ///
    /// # Arguments
    ///
    /// * `encoding` - One of the identifiers in
    ///   [`SUPPORTED_ENCODINGS`](crate::encoding::SUPPORTED_ENCODINGS),
    ///   matched case-insensitively
    ///
    /// # Returns
    ///
    /// Returns `Err(EscaperError::InvalidConfiguration)` if the identifier is
    /// empty or unsupported.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contextual_escaper::{Escaper, EscaperError};
    ///
    /// let escaper = Escaper::new("ISO-8859-1").unwrap();
    /// assert_eq!(escaper.encoding(), "iso-8859-1");
    ///
    /// assert!(matches!(Escaper::new(""), Err(EscaperError::InvalidConfiguration(_))));
    /// ```
    pub fn new(encoding: &str) -> Result<Self> {
        match SourceEncoding::parse(encoding) {
            Ok(encoding) => {
                tracing::debug!(encoding = encoding.label(), "escaper configured");
                Ok(Self { encoding })
            }
            Err(err) => {
                tracing::debug!(requested = encoding, error = %err, "rejected escaper encoding");
                Err(err)
            }
        }
    }

    /// Create an escaper from an already validated encoding
    pub fn with_encoding(encoding: SourceEncoding) -> Self {
        Self { encoding }
    }

    /// Lowercased encoding identifier this escaper was built with
    pub fn encoding(&self) -> &str {
        self.encoding.label()
    }

    /// Validated source encoding backing this escaper
    pub fn source_encoding(&self) -> &SourceEncoding {
        &self.encoding
    }

    /// Escape text for an HTML body
    ///
    /// Only `' " < > &` are replaced; malformed input becomes U+FFFD.
    pub fn escape_html<'a, S>(&self, input: &'a S) -> Cow<'a, str>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        self.escape(Context::Html, input)
    }

    /// Escape text for an HTML attribute value
    ///
    /// Safe for unquoted attributes as well: everything but ASCII
    /// alphanumerics and `, . - _` is escaped.
    pub fn escape_html_attribute<'a, S>(&self, input: &'a S) -> Cow<'a, str>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        self.escape(Context::HtmlAttribute, input)
    }

    /// Escape text for a JavaScript string literal
    pub fn escape_js<'a, S>(&self, input: &'a S) -> Cow<'a, str>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        self.escape(Context::Js, input)
    }

    /// Escape text for a CSS value
    pub fn escape_css<'a, S>(&self, input: &'a S) -> Cow<'a, str>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        self.escape(Context::Css, input)
    }

    /// Percent-encode text for a URL component
    ///
    /// Only the RFC 3986 unreserved set is left as-is; `+` is encoded.
    /// Malformed source bytes are percent-encoded as they appear in the input.
    pub fn escape_url<'a, S>(&self, input: &'a S) -> Cow<'a, str>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        self.escape(Context::Url, input)
    }

    /// Escape text for an explicitly chosen context
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::borrow::Cow;
    /// use contextual_escaper::{Context, Escaper};
    ///
    /// let escaper = Escaper::default();
    /// assert!(matches!(escaper.escape(Context::Css, "abc123"), Cow::Borrowed(_)));
    /// assert_eq!(escaper.escape(Context::Url, "a b"), "a%20b");
    /// ```
    pub fn escape<'a, S>(&self, context: Context, input: &'a S) -> Cow<'a, str>
    where
        S: AsRef<[u8]> + ?Sized,
    {
        let bytes = input.as_ref();
        if let Some(text) = self.unchanged(context, bytes) {
            return Cow::Borrowed(text);
        }

        let decoded = codepoint::decode(bytes, &self.encoding);
        let mut out = String::with_capacity(bytes.len() * 2);
        for (unit, source) in decoded.spans() {
            match unit.codepoint {
                Some(ch) => push_codepoint(context, ch, &mut out),
                None => push_malformed(context, source, &mut out),
            }
        }
        Cow::Owned(out)
    }

    /// Re-encode escaped output into this escaper's source encoding
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contextual_escaper::Escaper;
    ///
    /// let escaper = Escaper::new("cp1251").unwrap();
    /// let escaped = escaper.escape_html(b"\xC6 & \xE6");
    /// assert_eq!(escaped, "Ж &amp; ж");
    /// assert_eq!(escaper.to_source_encoding(&escaped).as_ref(), b"\xC6 &amp; \xE6");
    /// ```
    pub fn to_source_encoding<'a>(&self, escaped: &'a str) -> Cow<'a, [u8]> {
        self.encoding.encode(escaped)
    }

    /// Input that is already UTF-8 (or plain ASCII) and passes every rule
    fn unchanged<'a>(&self, context: Context, bytes: &'a [u8]) -> Option<&'a str> {
        if !self.encoding.is_utf8() && !bytes.is_ascii() {
            return None;
        }
        let text = std::str::from_utf8(bytes).ok()?;
        text.chars()
            .all(|ch| context.rule(ch) == Rule::Pass)
            .then_some(text)
    }
}

fn push_codepoint(context: Context, ch: char, out: &mut String) {
    match context.rule(ch) {
        Rule::Pass => out.push(ch),
        Rule::Replace(token) => out.push_str(token),
        Rule::Escape => match context {
            Context::Html => out.push(ch),
            Context::HtmlAttribute => push_attribute_escape(ch, out),
            Context::Js => push_js_escape(ch, out),
            Context::Css => push_css_escape(ch, out),
            Context::Url => push_url_escape(ch, out),
        },
    }
}

/// Malformed source bytes are percent-encoded verbatim in URLs and dropped in
/// JS and CSS
fn push_malformed(context: Context, source: &[u8], out: &mut String) {
    match context {
        Context::Html => out.push(char::REPLACEMENT_CHARACTER),
        Context::HtmlAttribute => out.push_str(REPLACEMENT_ENTITY),
        Context::Url => push_percent_encoded(source, out),
        Context::Js | Context::Css => {}
    }
    tracing::trace!(context = context.name(), len = source.len(), "recovered malformed input");
}

/// `&#xHH;` up to 0xFF, at least four digits above
fn push_attribute_escape(ch: char, out: &mut String) {
    let cp = u32::from(ch);
    let _ = if cp > 0xFF {
        write!(out, "&#x{:04X};", cp)
    } else {
        write!(out, "&#x{:02X};", cp)
    };
}

fn push_js_escape(ch: char, out: &mut String) {
    let cp = u32::from(ch);
    if cp < 0x100 {
        let _ = write!(out, "\\x{:02X}", cp);
        return;
    }

    let _ = match surrogate_pair(ch) {
        Some((high, low)) => write!(out, "\\u{:04X}\\u{:04X}", high, low),
        None => write!(out, "\\u{:04X}", cp),
    };
}

fn push_css_escape(ch: char, out: &mut String) {
    let _ = write!(out, "\\{:X} ", u32::from(ch));
}

fn push_url_escape(ch: char, out: &mut String) {
    let mut buf = [0u8; 4];
    push_percent_encoded(ch.encode_utf8(&mut buf).as_bytes(), out);
}

fn push_percent_encoded(bytes: &[u8], out: &mut String) {
    for byte in bytes {
        let _ = write!(out, "%{:02X}", byte);
    }
}

/// Compute the UTF-16 surrogate pair for a supplementary-plane codepoint
///
/// Returns `None` for codepoints inside the Basic Multilingual Plane.
///
/// # Examples
///
/// ```rust
/// use contextual_escaper::escaper::surrogate_pair;
///
/// assert_eq!(surrogate_pair('\u{10000}'), Some((0xD800, 0xDC00)));
/// assert_eq!(surrogate_pair('\u{1F600}'), Some((0xD83D, 0xDE00)));
/// assert_eq!(surrogate_pair('A'), None);
/// ```
pub fn surrogate_pair(ch: char) -> Option<(u16, u16)> {
    let value = u32::from(ch).checked_sub(0x10000)?;
    let high = 0xD800 + (value >> 10);
    let low = 0xDC00 + (value & 0x3FF);
    Some((u16::try_from(high).ok()?, u16::try_from(low).ok()?))
}
