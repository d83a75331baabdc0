//! LSP/URI helpers.
//!
//! Servers do not always echo a document URI byte for byte: some percent-encode characters the
//! client sent raw, and on Windows the drive letter may come back in a different case.

/// Percent-decode a `file://` URI path component.
pub fn percent_decode_path(path: &str) -> String {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = path.as_bytes();
    let mut out = Vec::<u8>::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).to_string()
}

/// Normalize a URI for comparison: decode escapes and lowercase a Windows drive letter.
pub fn normalize_uri(uri: &str) -> String {
    let mut decoded = percent_decode_path(uri);
    // `file:///C:/...`
    let drive = "file:///".len();
    if decoded.starts_with("file:///")
        && decoded.as_bytes().get(drive).is_some_and(u8::is_ascii_alphabetic)
        && decoded.as_bytes().get(drive + 1) == Some(&b':')
    {
        decoded[drive..drive + 1].make_ascii_lowercase();
    }
    decoded
}

/// Returns `true` if both URIs name the same document.
pub fn uris_equal(a: &str, b: &str) -> bool {
    a == b || normalize_uri(a) == normalize_uri(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode_path("/tmp/hello%20world.txt"), "/tmp/hello world.txt");
        assert_eq!(percent_decode_path("/100%"), "/100%");
    }

    #[test]
    fn test_uris_equal() {
        assert!(uris_equal("file:///a/b.py", "file:///a/b.py"));
        assert!(uris_equal("file:///a/my%20nb.ipynb", "file:///a/my nb.ipynb"));
        assert!(uris_equal("file:///C:/nb.ipynb", "file:///c%3A/nb.ipynb"));
        assert!(!uris_equal("file:///a/b.py", "file:///a/B.py"));
        assert!(!uris_equal("file:///a/b.py", "file:///a/c.py"));
    }
}
