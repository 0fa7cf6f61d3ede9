//! Text decoding for corpus files

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Reads a file as text. UTF-8 (with or without BOM) is decoded directly;
/// anything else goes through a `chardetng` guess. Returns the content and
/// the name of the encoding used.
pub fn read_text_file(path: &Path) -> Result<(String, &'static str)> {
    let bytes = fs::read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
    Ok(decode_bytes(&bytes))
}

pub fn decode_bytes(bytes: &[u8]) -> (String, &'static str) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), encoding.name());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), UTF_8.name());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(bytes);
    (text.into_owned(), encoding.name())
}

#[cfg(test)]
mod tests {
    use super::decode_bytes;

    #[test]
    fn utf8_is_decoded_directly() {
        let (text, encoding) = decode_bytes("informação".as_bytes());
        assert_eq!(text, "informação");
        assert_eq!(encoding, "UTF-8");
    }

    #[test]
    fn bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"hello");
        let (text, _) = decode_bytes(&bytes);
        assert_eq!(text, "hello");
    }

    #[test]
    fn legacy_encoding_falls_back_to_detection() {
        let original = "A informação está disponível para você e não há problema nenhum.";
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(original);
        assert!(std::str::from_utf8(&bytes).is_err());

        let (text, encoding) = decode_bytes(&bytes);
        assert_ne!(encoding, "UTF-8");
        assert_eq!(text, original);
    }
}
