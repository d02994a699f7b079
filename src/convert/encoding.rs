/*!
# Encoding detection and BOM conversion

Classifies CSV content into one of three encoding classes and produces the
UTF-8-sig form (UTF-8 prefixed with U+FEFF) that spreadsheet software needs
to pick the right charset.
*/

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// The byte-order mark as a character
pub const BOM_CHAR: char = '\u{FEFF}';

/// The byte-order mark as encoded in UTF-8
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// MIME type attached to every converted file
pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// Encoding class of a CSV payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingClass {
    /// Starts with the BOM, nothing to do
    AlreadyMarked,
    /// Decodes as UTF-8 without a BOM
    ValidUtf8,
    /// Strict UTF-8 decode faults
    Undecodable,
}

impl EncodingClass {
    pub fn needs_conversion(self) -> bool {
        !matches!(self, EncodingClass::AlreadyMarked)
    }

    /// Short label matching common codec names
    pub fn label(self) -> &'static str {
        match self {
            EncodingClass::AlreadyMarked => "utf-8-sig",
            EncodingClass::ValidUtf8 => "utf-8",
            EncodingClass::Undecodable => "unknown",
        }
    }
}

impl fmt::Display for EncodingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of [`convert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// Input already carries the BOM; no new content is produced
    AlreadyMarked,
    /// BOM-prefixed content built from input of class `from`
    Converted { from: EncodingClass, bytes: Vec<u8> },
}

impl Conversion {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Conversion::AlreadyMarked => None,
            Conversion::Converted { bytes, .. } => Some(bytes),
        }
    }
}

/// Classify raw file content.
pub fn classify(content: &[u8]) -> EncodingClass {
    if content.starts_with(UTF8_BOM) {
        return EncodingClass::AlreadyMarked;
    }

    match std::str::from_utf8(content) {
        Ok(_) => EncodingClass::ValidUtf8,
        Err(e) => {
            tracing::debug!("Strict UTF-8 decode failed at byte {}", e.valid_up_to());
            EncodingClass::Undecodable
        }
    }
}

/// Classify content that has already been decoded to text.
///
/// A `&str` is valid UTF-8 by construction, so this never reports
/// [`EncodingClass::Undecodable`].
pub fn classify_text(content: &str) -> EncodingClass {
    if content.starts_with(BOM_CHAR) {
        EncodingClass::AlreadyMarked
    } else {
        EncodingClass::ValidUtf8
    }
}

/// Decode bytes as UTF-8 the lenient way a browser text read does:
/// invalid sequences become U+FFFD, a leading BOM is kept as a character.
pub fn decode_lossy(content: &[u8]) -> Cow<'_, str> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_without_bom_handling(content);
    if had_errors {
        tracing::warn!("Replaced invalid UTF-8 sequences while decoding content");
    }
    text
}

/// Unconditionally prefix `content` with the UTF-8 BOM.
///
/// Not idempotent: applying it twice yields two BOMs. Use [`convert`] to
/// skip already marked content.
pub fn prepend_bom(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(UTF8_BOM.len() + content.len());
    out.extend_from_slice(UTF8_BOM);
    out.extend_from_slice(content);
    out
}

/// Produce the UTF-8-sig form of `content`.
///
/// Undecodable input is not rejected: it is normalised with
/// [`decode_lossy`] and then marked. No charset repair is attempted.
pub fn convert(content: &[u8]) -> Conversion {
    let class = classify(content);
    match class {
        EncodingClass::AlreadyMarked => Conversion::AlreadyMarked,
        EncodingClass::ValidUtf8 => Conversion::Converted {
            from: class,
            bytes: prepend_bom(content),
        },
        EncodingClass::Undecodable => {
            let text = decode_lossy(content);
            Conversion::Converted {
                from: class,
                bytes: prepend_bom(text.as_bytes()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bom_constants_agree() {
        let mut buf = [0u8; 4];
        assert_eq!(BOM_CHAR.encode_utf8(&mut buf).as_bytes(), UTF8_BOM);
    }

    #[test]
    fn test_classify_marked() {
        assert_eq!(classify("\u{FEFF}a,b\n".as_bytes()), EncodingClass::AlreadyMarked);
        assert_eq!(classify(UTF8_BOM), EncodingClass::AlreadyMarked);
    }

    #[test]
    fn test_classify_valid_utf8() {
        assert_eq!(classify(b"a,b\n1,2\n"), EncodingClass::ValidUtf8);
        assert_eq!(classify("이름,나이\n홍길동,30\n".as_bytes()), EncodingClass::ValidUtf8);
        assert_eq!(classify(b""), EncodingClass::ValidUtf8);
    }

    #[test]
    fn test_classify_undecodable() {
        // "이름" in EUC-KR
        assert_eq!(classify(&[0xC0, 0xCC, 0xB8, 0xA7]), EncodingClass::Undecodable);
        // truncated BOM is not a BOM
        assert_eq!(classify(&[0xEF, 0xBB]), EncodingClass::Undecodable);
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(classify_text("\u{FEFF}x"), EncodingClass::AlreadyMarked);
        assert_eq!(classify_text("x\u{FEFF}"), EncodingClass::ValidUtf8);
    }

    #[test]
    fn test_convert_valid_prepends_exactly_bom() {
        let content = "a,b\n1,2\n".as_bytes();
        let result = convert(content);
        let expected = "\u{FEFF}a,b\n1,2\n".as_bytes().to_vec();
        assert_eq!(
            result,
            Conversion::Converted {
                from: EncodingClass::ValidUtf8,
                bytes: expected
            }
        );
    }

    #[test]
    fn test_convert_marked_is_noop() {
        assert_eq!(convert("\u{FEFF}a,b\n".as_bytes()), Conversion::AlreadyMarked);
        assert!(convert("\u{FEFF}".as_bytes()).bytes().is_none());
    }

    #[test]
    fn test_convert_undecodable_passes_through() {
        let result = convert(&[b'a', b',', 0xFF, b'\n']);
        match result {
            Conversion::Converted { from, bytes } => {
                assert_eq!(from, EncodingClass::Undecodable);
                assert_eq!(String::from_utf8(bytes).unwrap(), "\u{FEFF}a,\u{FFFD}\n");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_prepend_bom_is_not_idempotent() {
        let once = prepend_bom(b"x");
        let twice = prepend_bom(&once);
        assert_eq!(twice, "\u{FEFF}\u{FEFF}x".as_bytes());
        // the guarded path stops at one marker
        assert_eq!(convert(&once), Conversion::AlreadyMarked);
    }

    #[test]
    fn test_labels() {
        assert_eq!(EncodingClass::AlreadyMarked.to_string(), "utf-8-sig");
        assert_eq!(EncodingClass::ValidUtf8.label(), "utf-8");
        assert!(!EncodingClass::AlreadyMarked.needs_conversion());
        assert!(EncodingClass::Undecodable.needs_conversion());
    }
}
