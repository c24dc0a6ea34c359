//! Source encoding identifiers and transcoder selection
//!
//! An escaper is configured once with the character encoding its input is
//! written in. The identifier must be one of the fixed labels in
//! [`SUPPORTED_ENCODINGS`]; matching is ASCII case-insensitive and the label
//! is stored lowercased.
//!
//! # Transcoders
//!
//! Each label resolves to one of three transcoders:
//!
//! 1. **UTF-8**: input bytes are decoded in place, no conversion
//! 2. **Latin-1**: every byte is its own codepoint (exact ISO-8859-1 mapping)
//! 3. **Legacy**: the input is transcoded to UTF-8 by `encoding_rs`
//!
//! # Examples
//!
//! ```rust
//! use contextual_escaper::encoding::{SourceEncoding, Transcoder};
//!
//! let encoding = SourceEncoding::parse("Windows-1251").unwrap();
//! assert_eq!(encoding.label(), "windows-1251");
//! assert_eq!(encoding.transcoder(), Transcoder::Legacy(encoding_rs::WINDOWS_1251));
//!
//! assert!(SourceEncoding::parse("").is_err());
//! assert!(SourceEncoding::parse("invalid-encoding").is_err());
//! ```

use std::borrow::Cow;

use encoding_rs::Encoding;

use crate::error::{EscaperError, Result};

/// Default encoding when none is given
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Every encoding identifier accepted at construction time
pub const SUPPORTED_ENCODINGS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso-8859-5",
    "iso8859-5",
    "iso-8859-15",
    "iso8859-15",
    "utf-8",
    "cp866",
    "ibm866",
    "866",
    "cp1251",
    "windows-1251",
    "win-1251",
    "1251",
    "cp1252",
    "windows-1252",
    "1252",
    "koi8-r",
    "koi8-ru",
    "koi8r",
    "big5",
    "950",
    "gb2312",
    "936",
    "big5-hkscs",
    "shift_jis",
    "sjis",
    "sjis-win",
    "cp932",
    "932",
    "euc-jp",
    "eucjp",
    "eucjp-win",
    "macroman",
];

/// How input bytes in a given source encoding become Unicode codepoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transcoder {
    /// Input is already UTF-8
    Utf8,
    /// ISO-8859-1: byte value equals codepoint
    Latin1,
    /// Any other supported encoding, delegated to `encoding_rs`
    Legacy(&'static Encoding),
}

/// A validated, lowercased encoding identifier and its transcoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEncoding {
    label: String,
    transcoder: Transcoder,
}

impl SourceEncoding {
    /// Validate an encoding identifier against the supported table
    ///
    /// # Arguments
    ///
    /// * `label` - Encoding identifier, matched case-insensitively
    ///
    /// # Returns
    ///
    /// Returns `Err(EscaperError::InvalidConfiguration)` if the label is empty
    /// or not one of [`SUPPORTED_ENCODINGS`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contextual_escaper::encoding::SourceEncoding;
    ///
    /// let encoding = SourceEncoding::parse("ISO-8859-1").unwrap();
    /// assert_eq!(encoding.label(), "iso-8859-1");
    /// ```
    pub fn parse(label: &str) -> Result<Self> {
        if label.is_empty() {
            return Err(EscaperError::InvalidConfiguration(
                "encoding identifier must not be empty".to_string(),
            ));
        }

        let label = label.to_ascii_lowercase();
        let transcoder = transcoder_for(&label).ok_or_else(|| {
            EscaperError::InvalidConfiguration(format!("unsupported encoding '{}'", label))
        })?;

        Ok(Self { label, transcoder })
    }

    /// The default UTF-8 source encoding
    pub fn utf8() -> Self {
        Self {
            label: DEFAULT_ENCODING.to_string(),
            transcoder: Transcoder::Utf8,
        }
    }

    /// Lowercased identifier as supplied at construction
    pub fn label(&self) -> &str {
        &self.label
    }

    /// How input in this encoding is turned into codepoints
    pub fn transcoder(&self) -> Transcoder {
        self.transcoder
    }

    /// Whether input is already UTF-8 and needs no transcoding
    pub fn is_utf8(&self) -> bool {
        self.transcoder == Transcoder::Utf8
    }

    /// Re-encode UTF-8 text into this source encoding
    ///
    /// ASCII text is returned borrowed. Characters the target encoding cannot
    /// represent are written as decimal numeric character references
    /// (`&#NNNN;`), which keeps escaped output intact in every context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contextual_escaper::encoding::SourceEncoding;
    ///
    /// let latin1 = SourceEncoding::parse("iso-8859-1").unwrap();
    /// assert_eq!(latin1.encode("Café").as_ref(), b"Caf\xE9");
    /// assert_eq!(latin1.encode("Ā").as_ref(), b"&#256;");
    /// ```
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        if text.is_ascii() {
            return Cow::Borrowed(text.as_bytes());
        }

        match self.transcoder {
            Transcoder::Utf8 => Cow::Borrowed(text.as_bytes()),
            Transcoder::Latin1 => Cow::Owned(encode_latin1(text)),
            Transcoder::Legacy(encoding) => {
                let (bytes, _, _) = encoding.encode(text);
                bytes
            }
        }
    }
}

impl Default for SourceEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

/// Check whether an identifier is in the supported table
///
/// # Examples
///
/// ```rust
/// use contextual_escaper::encoding::is_supported;
///
/// assert!(is_supported("SJIS-win"));
/// assert!(!is_supported("utf-16"));
/// ```
pub fn is_supported(label: &str) -> bool {
    transcoder_for(&label.to_ascii_lowercase()).is_some()
}

/// Resolve a lowercased identifier to its transcoder
fn transcoder_for(label: &str) -> Option<Transcoder> {
    let transcoder = match label {
        "utf-8" => Transcoder::Utf8,
        "iso-8859-1" | "iso8859-1" => Transcoder::Latin1,
        "iso-8859-5" | "iso8859-5" => Transcoder::Legacy(encoding_rs::ISO_8859_5),
        "iso-8859-15" | "iso8859-15" => Transcoder::Legacy(encoding_rs::ISO_8859_15),
        "cp866" | "ibm866" | "866" => Transcoder::Legacy(encoding_rs::IBM866),
        "cp1251" | "windows-1251" | "win-1251" | "1251" => {
            Transcoder::Legacy(encoding_rs::WINDOWS_1251)
        }
        "cp1252" | "windows-1252" | "1252" => Transcoder::Legacy(encoding_rs::WINDOWS_1252),
        "koi8-r" | "koi8r" => Transcoder::Legacy(encoding_rs::KOI8_R),
        "koi8-ru" => Transcoder::Legacy(encoding_rs::KOI8_U),
        // encoding_rs Big5 carries the HKSCS extensions
        "big5" | "950" | "big5-hkscs" => Transcoder::Legacy(encoding_rs::BIG5),
        "gb2312" | "936" => Transcoder::Legacy(encoding_rs::GBK),
        // encoding_rs Shift_JIS is the Windows-31J variant
        "shift_jis" | "sjis" | "sjis-win" | "cp932" | "932" => {
            Transcoder::Legacy(encoding_rs::SHIFT_JIS)
        }
        "euc-jp" | "eucjp" | "eucjp-win" => Transcoder::Legacy(encoding_rs::EUC_JP),
        "macroman" => Transcoder::Legacy(encoding_rs::MACINTOSH),
        _ => return None,
    };
    Some(transcoder)
}

fn encode_latin1(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match u8::try_from(u32::from(ch)) {
            Ok(byte) => out.push(byte),
            Err(_) => out.extend_from_slice(format!("&#{};", u32::from(ch)).as_bytes()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ============================================================================
    // Unit Tests for Identifier Validation
    // ============================================================================

    #[test]
    fn test_every_supported_encoding_parses() {
        for label in SUPPORTED_ENCODINGS {
            let encoding = SourceEncoding::parse(label)
                .unwrap_or_else(|e| panic!("{} should be supported: {}", label, e));
            assert_eq!(encoding.label(), *label);
        }
    }

    #[test]
    fn test_parse_empty_is_rejected() {
        let err = SourceEncoding::parse("").unwrap_err();
        assert!(matches!(err, EscaperError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_parse_unknown_is_rejected() {
        let err = SourceEncoding::parse("invalid-encoding").unwrap_err();
        assert!(matches!(err, EscaperError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("invalid-encoding"));
    }

    #[test]
    fn test_parse_does_not_trim() {
        assert!(SourceEncoding::parse(" utf-8").is_err());
        assert!(SourceEncoding::parse("utf-8 ").is_err());
    }

    #[test]
    fn test_parse_lowercases_label() {
        let encoding = SourceEncoding::parse("UTF-8").unwrap();
        assert_eq!(encoding.label(), "utf-8");
        assert!(encoding.is_utf8());

        let encoding = SourceEncoding::parse("Shift_JIS").unwrap();
        assert_eq!(encoding.label(), "shift_jis");
    }

    #[test]
    fn test_default_is_utf8() {
        let encoding = SourceEncoding::default();
        assert_eq!(encoding.label(), DEFAULT_ENCODING);
        assert_eq!(encoding.transcoder(), Transcoder::Utf8);
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported("utf-8"));
        assert!(is_supported("EUCJP-WIN"));
        assert!(is_supported("1252"));
        assert!(!is_supported(""));
        assert!(!is_supported("utf-16le"));
        assert!(!is_supported("latin1"));
    }

    // ============================================================================
    // Unit Tests for Transcoder Selection
    // ============================================================================

    #[test]
    fn test_latin1_labels_use_byte_mapping() {
        for label in ["iso-8859-1", "iso8859-1", "ISO-8859-1"] {
            let encoding = SourceEncoding::parse(label).unwrap();
            assert_eq!(encoding.transcoder(), Transcoder::Latin1);
        }
    }

    #[test]
    fn test_alias_groups_share_transcoder() {
        let groups: &[(&[&str], &'static Encoding)] = &[
            (&["cp866", "ibm866", "866"], encoding_rs::IBM866),
            (
                &["cp1251", "windows-1251", "win-1251", "1251"],
                encoding_rs::WINDOWS_1251,
            ),
            (&["cp1252", "windows-1252", "1252"], encoding_rs::WINDOWS_1252),
            (&["koi8-r", "koi8r"], encoding_rs::KOI8_R),
            (&["big5", "950", "big5-hkscs"], encoding_rs::BIG5),
            (&["gb2312", "936"], encoding_rs::GBK),
            (
                &["shift_jis", "sjis", "sjis-win", "cp932", "932"],
                encoding_rs::SHIFT_JIS,
            ),
            (&["euc-jp", "eucjp", "eucjp-win"], encoding_rs::EUC_JP),
            (&["macroman"], encoding_rs::MACINTOSH),
        ];

        for (labels, expected) in groups {
            for label in *labels {
                let encoding = SourceEncoding::parse(label).unwrap();
                assert_eq!(
                    encoding.transcoder(),
                    Transcoder::Legacy(*expected),
                    "label {}",
                    label
                );
            }
        }
    }

    // ============================================================================
    // Unit Tests for Re-encoding
    // ============================================================================

    #[test]
    fn test_encode_ascii_is_borrowed() {
        let encoding = SourceEncoding::parse("windows-1251").unwrap();
        assert!(matches!(encoding.encode("&#x20;"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_encode_utf8_is_borrowed() {
        let encoding = SourceEncoding::utf8();
        let text = "Привет";
        assert!(matches!(encoding.encode(text), Cow::Borrowed(b) if b == text.as_bytes()));
    }

    #[test]
    fn test_encode_latin1() {
        let encoding = SourceEncoding::parse("iso-8859-1").unwrap();
        assert_eq!(encoding.encode("é€").as_ref(), b"\xE9&#8364;");
    }

    #[test]
    fn test_encode_legacy() {
        let encoding = SourceEncoding::parse("cp1251").unwrap();
        assert_eq!(encoding.encode("Жж").as_ref(), b"\xC6\xE6");

        let encoding = SourceEncoding::parse("koi8-r").unwrap();
        assert_eq!(encoding.encode("Ж").as_ref(), b"\xF6");
    }

    #[test]
    fn test_encode_legacy_unmappable_uses_reference() {
        let encoding = SourceEncoding::parse("cp1251").unwrap();
        assert_eq!(encoding.encode("✓").as_ref(), b"&#10003;");
    }

    // ============================================================================
    // Property-Based Tests
    // ============================================================================

    proptest! {
        #[test]
        fn prop_label_matching_is_case_insensitive(
            index in 0..SUPPORTED_ENCODINGS.len(),
            mask in any::<u64>(),
        ) {
            let label = SUPPORTED_ENCODINGS[index];
            let mixed: String = label
                .chars()
                .enumerate()
                .map(|(i, c)| if (mask >> (i % 64)) & 1 == 1 { c.to_ascii_uppercase() } else { c })
                .collect();

            let encoding = SourceEncoding::parse(&mixed).unwrap();
            prop_assert_eq!(encoding.label(), label);
        }

        #[test]
        fn prop_latin1_encode_matches_char_values(text in "[\\x00-\\xFF]{0,64}") {
            let encoding = SourceEncoding::parse("iso-8859-1").unwrap();
            let expected: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
            let encoded = encoding.encode(&text);
            prop_assert_eq!(encoded.as_ref(), expected.as_slice());
        }
    }
}
