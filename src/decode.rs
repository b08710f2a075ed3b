//! Byte-to-text decoding for XML input.
//!
//! Configuration files exported by AUTOSAR tooling are usually UTF-8, but
//! some generators emit UTF-16 with a byte order mark, and older ones
//! declare ISO-8859-1. Bytes that are not valid in the detected encoding are
//! reported as parse errors rather than replaced.

use crate::error::{Error, Result};
use std::borrow::Cow;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Rewrite the encoding declaration of decoded text to UTF-8.
///
/// Once the bytes are decoded into a Rust `String`, a declaration that still
/// says `encoding="UTF-16"` or `encoding="ISO-8859-1"` no longer describes
/// the text.
fn fix_xml_encoding_declaration(content: String) -> String {
    let Some((start, end)) = declared_encoding_span(content.as_bytes()) else {
        return content;
    };
    if content[start..end].eq_ignore_ascii_case("UTF-8") {
        return content;
    }
    format!("{}UTF-8{}", &content[..start], &content[end..])
}

/// Byte range of the `encoding` value inside a leading `<?xml ...?>`
/// declaration.
fn declared_encoding_span(bytes: &[u8]) -> Option<(usize, usize)> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = bytes.windows(2).position(|w| w == b"?>")?;
    let decl = &bytes[..decl_end];

    let attr = decl.windows(8).position(|w| w == b"encoding")?;
    let mut i = attr + 8;
    while i < decl.len() && (decl[i].is_ascii_whitespace() || decl[i] == b'=') {
        i += 1;
    }
    let quote = *decl.get(i).filter(|&&b| b == b'"' || b == b'\'')?;
    let start = i + 1;
    let len = decl[start..].iter().position(|&b| b == quote)?;
    Some((start, start + len))
}

fn declares_latin1(bytes: &[u8]) -> bool {
    declared_encoding_span(bytes).is_some_and(|(start, end)| {
        let name = &bytes[start..end];
        ["ISO-8859-1", "ISO8859-1", "LATIN1", "LATIN-1"]
            .iter()
            .any(|known| name.eq_ignore_ascii_case(known.as_bytes()))
    })
}

/// Decode XML bytes handling UTF-8 (with or without BOM), UTF-16 LE/BE and
/// declared ISO-8859-1.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if let Some(body) = bytes.strip_prefix(&UTF8_BOM) {
        return decode_utf8(body, UTF8_BOM.len());
    }

    // UTF-16 LE BOM: FF FE
    if let Some(body) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let content = decode_utf16(body, 2, u16::from_le_bytes)?;
        return Ok(Cow::Owned(fix_xml_encoding_declaration(content)));
    }

    // UTF-16 BE BOM: FE FF
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let content = decode_utf16(body, 2, u16::from_be_bytes)?;
        return Ok(Cow::Owned(fix_xml_encoding_declaration(content)));
    }

    if declares_latin1(bytes) {
        // Every byte maps to the code point of the same value
        let content: String = bytes.iter().map(|&b| char::from(b)).collect();
        return Ok(Cow::Owned(fix_xml_encoding_declaration(content)));
    }

    // UTF-16 without BOM shows NUL bytes next to every ASCII character
    if std::str::from_utf8(bytes).is_err() && bytes.len() >= 4 {
        if bytes[1] == 0 && bytes[3] == 0 {
            let content = decode_utf16(bytes, 0, u16::from_le_bytes)?;
            return Ok(Cow::Owned(fix_xml_encoding_declaration(content)));
        }
        if bytes[0] == 0 && bytes[2] == 0 {
            let content = decode_utf16(bytes, 0, u16::from_be_bytes)?;
            return Ok(Cow::Owned(fix_xml_encoding_declaration(content)));
        }
    }

    decode_utf8(bytes, 0)
}

/// Strict UTF-8 decoding; `offset` is the number of bytes preceding `bytes`
/// in the input.
fn decode_utf8(bytes: &[u8], offset: usize) -> Result<Cow<'_, str>> {
    std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
        let valid = e.valid_up_to();
        Error::Parse {
            line: 1 + bytes[..valid].iter().filter(|&&b| b == b'\n').count(),
            position: (offset + valid) as u64,
            message: "invalid UTF-8 byte sequence".to_string(),
        }
    })
}

/// Decode UTF-16 code units using the given byte order; `offset` is the
/// number of bytes preceding `bytes` in the input.
fn decode_utf16(bytes: &[u8], offset: usize, to_unit: fn([u8; 2]) -> u16) -> Result<String> {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]));

    let mut content = String::with_capacity(bytes.len() / 2);
    let mut consumed = 0;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(c) => {
                consumed += c.len_utf16() * 2;
                content.push(c);
            }
            Err(e) => {
                return Err(utf16_error(
                    &content,
                    offset + consumed,
                    format!("unpaired UTF-16 surrogate {:#06x}", e.unpaired_surrogate()),
                ))
            }
        }
    }

    if bytes.len() % 2 != 0 {
        return Err(utf16_error(
            &content,
            offset + consumed,
            "truncated UTF-16 code unit".to_string(),
        ));
    }
    Ok(content)
}

fn utf16_error(decoded: &str, position: usize, message: String) -> Error {
    Error::Parse {
        line: 1 + decoded.matches('\n').count(),
        position: position as u64,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16_le(source: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in source.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_plain_utf8() {
        let text = decode_xml_bytes(b"<A/>").unwrap();
        assert_eq!(text, "<A/>");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let text = decode_xml_bytes(b"\xEF\xBB\xBF<A/>").unwrap();
        assert_eq!(text, "<A/>");
    }

    #[test]
    fn test_utf16_le_with_declaration() {
        let bytes = utf16_le("<?xml version=\"1.0\" encoding=\"UTF-16\"?><A/>");
        let text = decode_xml_bytes(&bytes).unwrap();
        assert_eq!(text, "<?xml version=\"1.0\" encoding=\"UTF-8\"?><A/>");
    }

    #[test]
    fn test_utf16_be_with_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "<AB/>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }

        let text = decode_xml_bytes(&bytes).unwrap();
        assert_eq!(text, "<AB/>");
    }

    #[test]
    fn test_declared_latin1() {
        let text =
            decode_xml_bytes(b"<?xml version='1.0' encoding='ISO-8859-1'?><A>Gr\xfc\xdfe</A>")
                .unwrap();
        assert_eq!(text, "<?xml version='1.0' encoding='UTF-8'?><A>Grüße</A>");
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = decode_xml_bytes(b"<R>\n<A>Can\xff</A></R>").unwrap_err();
        match err {
            Error::Parse { line, position, .. } => {
                assert_eq!(line, 2);
                assert_eq!(position, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_after_bom_counts_bom() {
        let err = decode_xml_bytes(b"\xEF\xBB\xBF<R>\xff</R>").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, position: 6, .. }));
        assert!(err.to_string().starts_with("extraction failed"));
    }

    #[test]
    fn test_unpaired_surrogate_is_parse_error() {
        let mut bytes = utf16_le("<R>\n");
        bytes.extend_from_slice(&0xD800u16.to_le_bytes());
        bytes.extend_from_slice(&utf16_le("</R>")[2..]);

        let err = decode_xml_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, position: 10, .. }));
    }

    #[test]
    fn test_truncated_utf16_is_parse_error() {
        let mut bytes = utf16_le("<R/>");
        bytes.push(b'\n');
        let err = decode_xml_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Parse { position: 10, .. }));
    }
}
