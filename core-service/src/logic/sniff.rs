//! Content type sniffing
//!
//! Magic-number detection for common formats. When the bytes say nothing,
//! the filename extension is consulted, then a text/binary guess.

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain";

/// (offset, signature, mime)
const SIGNATURES: &[(usize, &[u8], &str)] = &[
    (0, b"\x89PNG\r\n\x1a\n", "image/png"),
    (0, b"\xff\xd8\xff", "image/jpeg"),
    (0, b"GIF87a", "image/gif"),
    (0, b"GIF89a", "image/gif"),
    (0, b"BM", "image/bmp"),
    (0, b"%PDF-", "application/pdf"),
    (0, b"PK\x03\x04", "application/zip"),
    (0, b"\x1f\x8b", "application/gzip"),
    (0, b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
    (0, b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1", "application/x-ole-storage"),
    (0, b"ID3", "audio/mpeg"),
    (0, b"OggS", "audio/ogg"),
    (0, b"fLaC", "audio/flac"),
    (4, b"ftyp", "video/mp4"),
    (0, b"\x7fELF", "application/x-executable"),
    (0, b"MZ", "application/x-dosexec"),
];

pub trait MimeSniffer: Send + Sync {
    fn sniff(&self, bytes: &[u8], filename_hint: Option<&str>) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MagicSniffer;

impl MagicSniffer {
    fn by_signature(bytes: &[u8]) -> Option<&'static str> {
        // RIFF containers carry the real type at offset 8
        if bytes.len() >= 12 && &bytes[..4] == b"RIFF" {
            return match &bytes[8..12] {
                b"WEBP" => Some("image/webp"),
                b"WAVE" => Some("audio/x-wav"),
                b"AVI " => Some("video/x-msvideo"),
                _ => None,
            };
        }

        SIGNATURES
            .iter()
            .find(|(offset, sig, _)| bytes.get(*offset..offset + sig.len()) == Some(*sig))
            .map(|(_, _, mime)| *mime)
    }

    fn looks_textual(bytes: &[u8]) -> bool {
        match std::str::from_utf8(bytes) {
            Ok(text) => !text
                .chars()
                .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c')),
            Err(_) => false,
        }
    }
}

impl MimeSniffer for MagicSniffer {
    fn sniff(&self, bytes: &[u8], filename_hint: Option<&str>) -> String {
        if let Some(mime) = Self::by_signature(bytes) {
            return mime.to_string();
        }

        if let Some(guess) = filename_hint.and_then(|name| mime_guess::from_path(name).first()) {
            return guess.essence_str().to_string();
        }

        if bytes.is_empty() {
            return "application/x-empty".to_string();
        }

        if Self::looks_textual(bytes) {
            TEXT_PLAIN.to_string()
        } else {
            OCTET_STREAM.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_numbers_win_over_extension() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(MagicSniffer.sniff(png, Some("photo.txt")), "image/png");
        assert_eq!(MagicSniffer.sniff(b"%PDF-1.4\n", None), "application/pdf");
        assert_eq!(MagicSniffer.sniff(b"RIFF\0\0\0\0WEBPVP8 ", None), "image/webp");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(MagicSniffer.sniff(b"{\"a\": 1}", Some("data.json")), "application/json");
    }

    #[test]
    fn test_text_and_binary_fallback() {
        assert_eq!(MagicSniffer.sniff(b"hello\nworld", None), "text/plain");
        assert_eq!(MagicSniffer.sniff(&[0u8, 1, 2, 3], None), "application/octet-stream");
        assert_eq!(MagicSniffer.sniff(b"", None), "application/x-empty");
    }
}
