//! Conversion between source bytes and Unicode codepoints
//!
//! The converter knows nothing about escaping rules. It turns the caller's
//! bytes into a sequence of [`Decoded`] units, one per codepoint, and turns
//! codepoints back into UTF-8.
//!
//! # Malformed input
//!
//! Decoding never fails. A byte sequence that is not valid in the source
//! encoding becomes a single unit with no codepoint, and decoding resumes
//! right after it. For UTF-8 the malformed unit is the maximal prefix of a
//! valid sequence, so `E4 B8 41` yields one malformed unit followed by `A`.
//!
//! # Examples
//!
//! ```rust
//! use contextual_escaper::codepoint::{decode, Decoded};
//! use contextual_escaper::encoding::SourceEncoding;
//!
//! let utf8 = SourceEncoding::utf8();
//! let units: Vec<Decoded> = decode(b"a\xC4\x80\xFF", &utf8).units().collect();
//! assert_eq!(units, vec![
//!     Decoded::scalar('a', 1),
//!     Decoded::scalar('Ā', 2),
//!     Decoded::malformed(1),
//! ]);
//! ```

use std::borrow::Cow;
use std::ops::{Range, RangeInclusive};
use std::slice;

use encoding_rs::{DecoderResult, Encoding};

use crate::encoding::{SourceEncoding, Transcoder};
use crate::error::{EscaperError, Result};

/// Marks a malformed source sequence inside transcoded UTF-8.
/// 0xFF never occurs in well-formed UTF-8.
const MALFORMED_MARKER: u8 = 0xFF;

/// Smallest staging buffer allocated for transcoding
const MIN_STAGING: usize = 16;

/// One decoded unit: a codepoint (or `None` when malformed) and its byte length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub codepoint: Option<char>,
    pub len: usize,
}

impl Decoded {
    pub fn scalar(codepoint: char, len: usize) -> Self {
        Self {
            codepoint: Some(codepoint),
            len,
        }
    }

    pub fn malformed(len: usize) -> Self {
        Self {
            codepoint: None,
            len,
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.codepoint.is_none()
    }
}

/// Input bytes prepared for codepoint iteration
///
/// UTF-8 input is borrowed as-is; legacy encodings are transcoded to UTF-8
/// up front.
#[derive(Debug)]
pub struct DecodedInput<'a> {
    bytes: Cow<'a, [u8]>,
    latin1: bool,
    source: &'a [u8],
    /// Source ranges of malformed runs, in order, for transcoded input only
    malformed: Vec<Range<usize>>,
}

impl<'a> DecodedInput<'a> {
    fn borrowed(source: &'a [u8], latin1: bool) -> Self {
        Self {
            bytes: Cow::Borrowed(source),
            latin1,
            source,
            malformed: Vec::new(),
        }
    }

    /// Iterate over the decoded units
    pub fn units(&self) -> Units<'_> {
        Units {
            bytes: &self.bytes,
            latin1: self.latin1,
        }
    }

    /// Iterate over the decoded units together with the bytes behind them
    ///
    /// Malformed units always carry the original source bytes. Well-formed
    /// units of transcoded input carry their UTF-8 encoding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contextual_escaper::codepoint::{decode, Decoded};
    /// use contextual_escaper::encoding::SourceEncoding;
    ///
    /// let sjis = SourceEncoding::parse("shift_jis").unwrap();
    /// let input = decode(b"a\x93", &sjis);
    /// let spans: Vec<_> = input.spans().collect();
    /// assert_eq!(spans[0], (Decoded::scalar('a', 1), &b"a"[..]));
    /// assert_eq!(spans[1], (Decoded::malformed(1), &b"\x93"[..]));
    /// ```
    pub fn spans(&self) -> Spans<'_> {
        Spans {
            units: self.units(),
            source: self.source,
            malformed: self.malformed.iter(),
        }
    }

    #[cfg(test)]
    fn is_transcoded(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }
}

/// Iterator over [`Decoded`] units
#[derive(Debug, Clone)]
pub struct Units<'a> {
    bytes: &'a [u8],
    latin1: bool,
}

impl Iterator for Units<'_> {
    type Item = Decoded;

    fn next(&mut self) -> Option<Decoded> {
        let first = *self.bytes.first()?;
        let decoded = if self.latin1 {
            Decoded::scalar(char::from(first), 1)
        } else {
            next_utf8(self.bytes)
        };
        self.bytes = &self.bytes[decoded.len..];
        Some(decoded)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.bytes.len().div_ceil(4), Some(self.bytes.len()))
    }
}

/// Iterator over [`Decoded`] units and their bytes
#[derive(Debug, Clone)]
pub struct Spans<'a> {
    units: Units<'a>,
    source: &'a [u8],
    malformed: slice::Iter<'a, Range<usize>>,
}

impl<'a> Iterator for Spans<'a> {
    type Item = (Decoded, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.units.bytes;
        let decoded = self.units.next()?;
        if decoded.is_malformed()
            && let Some(range) = self.malformed.next()
        {
            let source = self.source.get(range.clone()).unwrap_or_default();
            return Some((decoded, source));
        }
        Some((decoded, &rest[..decoded.len]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.units.size_hint()
    }
}

/// Prepare input bytes in the given source encoding for codepoint iteration
///
/// # Arguments
///
/// * `input` - Raw bytes in the source encoding
/// * `encoding` - Validated source encoding
pub fn decode<'a>(input: &'a [u8], encoding: &SourceEncoding) -> DecodedInput<'a> {
    match encoding.transcoder() {
        Transcoder::Utf8 => DecodedInput::borrowed(input, false),
        Transcoder::Latin1 => DecodedInput::borrowed(input, true),
        Transcoder::Legacy(legacy) => {
            // ASCII is identical in every supported legacy encoding
            if input.is_ascii() {
                return DecodedInput::borrowed(input, false);
            }
            let (staged, malformed) = stage_legacy(input, legacy);
            tracing::trace!(
                encoding = encoding.label(),
                input_len = input.len(),
                staged_len = staged.len(),
                malformed = malformed.len(),
                "transcoded input to UTF-8"
            );
            DecodedInput {
                bytes: Cow::Owned(staged),
                latin1: false,
                source: input,
                malformed,
            }
        }
    }
}

/// Encode a single codepoint as UTF-8
///
/// Uses the canonical length rule: 1 byte below 0x80, 2 below 0x800, 3 below
/// 0x10000 and 4 below 0x110000.
///
/// # Returns
///
/// Returns `Err(EscaperError::InvalidCodepoint)` for values at or above
/// 0x110000 and for lone surrogates.
///
/// # Examples
///
/// ```rust
/// use contextual_escaper::codepoint::encode_codepoint;
///
/// assert_eq!(encode_codepoint(0x20).unwrap(), " ");
/// assert_eq!(encode_codepoint(0x799).unwrap().as_bytes(), b"\xDE\x99");
/// assert!(encode_codepoint(0x110000).is_err());
/// ```
pub fn encode_codepoint(codepoint: u32) -> Result<String> {
    char::from_u32(codepoint)
        .map(String::from)
        .ok_or(EscaperError::InvalidCodepoint(codepoint))
}

/// Decode the unit at the start of `bytes`, which must not be empty
fn next_utf8(bytes: &[u8]) -> Decoded {
    let lead = bytes[0];
    let width = match lead {
        0x00..=0x7F => return Decoded::scalar(char::from(lead), 1),
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return Decoded::malformed(1),
    };

    let mut value = u32::from(lead & (0x7F >> width));
    for i in 1..width {
        let Some(&byte) = bytes.get(i) else {
            return Decoded::malformed(i);
        };
        let valid = if i == 1 {
            second_byte_range(lead).contains(&byte)
        } else {
            byte & 0xC0 == 0x80
        };
        if !valid {
            return Decoded::malformed(i);
        }
        value = (value << 6) | u32::from(byte & 0x3F);
    }

    match char::from_u32(value) {
        Some(ch) => Decoded::scalar(ch, width),
        None => Decoded::malformed(width),
    }
}

/// Second-byte bounds excluding overlong forms, surrogates and values above U+10FFFF
fn second_byte_range(lead: u8) -> RangeInclusive<u8> {
    match lead {
        0xE0 => 0xA0..=0xBF,
        0xED => 0x80..=0x9F,
        0xF0 => 0x90..=0xBF,
        0xF4 => 0x80..=0x8F,
        _ => 0x80..=0xBF,
    }
}

/// Transcode legacy-encoded input to UTF-8, leaving a marker byte where the
/// source was malformed and recording the source range of each marker
fn stage_legacy(input: &[u8], encoding: &'static Encoding) -> (Vec<u8>, Vec<Range<usize>>) {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(input.len())
        .unwrap_or(input.len());
    let mut staged = vec![0u8; capacity.max(MIN_STAGING)];
    let mut malformed = Vec::new();
    let mut read = 0;
    let mut written = 0;

    loop {
        let (result, consumed, produced) = decoder.decode_to_utf8_without_replacement(
            &input[read..],
            &mut staged[written..],
            true,
        );
        read += consumed;
        written += produced;

        match result {
            DecoderResult::InputEmpty => break,
            DecoderResult::OutputFull => {
                let grow = staged.len();
                staged.resize(staged.len() + grow, 0);
            }
            DecoderResult::Malformed(bad, after) => {
                let end = read.saturating_sub(usize::from(after));
                malformed.push(end.saturating_sub(usize::from(bad))..end);
                if written == staged.len() {
                    staged.push(MALFORMED_MARKER);
                } else {
                    staged[written] = MALFORMED_MARKER;
                }
                written += 1;
            }
        }
    }

    staged.truncate(written);
    (staged, malformed)
}
