//! String stream pair resolution.
//!
//! One logical text field is stored as up to two sibling streams that share
//! a base name and differ in a four-character type suffix: `001E` carries
//! 8-bit text, `001F` carries UTF-16LE. The Unicode variant is
//! authoritative whenever it exists.

use encoding_rs::{UTF_16LE, WINDOWS_1252};

use crate::container::ContainerRead;

/// Type suffix of the 8-bit string variant.
pub const TAIL_8BIT: &str = "001E";
/// Type suffix of the UTF-16LE string variant.
pub const TAIL_UTF16: &str = "001F";

/// Resolve the string stream pair rooted at `base`, whose last segment is
/// the stream name without its type suffix.
///
/// Neither variant existing is an absence, not an error; I/O failures on a
/// present stream do propagate.
pub fn resolve_string(
    container: &mut dyn ContainerRead,
    base: &[String],
) -> std::io::Result<Option<String>> {
    if let Some(bytes) = read_variant(container, base, TAIL_UTF16)? {
        return Ok(Some(decode_utf16le(&bytes)));
    }
    Ok(read_variant(container, base, TAIL_8BIT)?.map(|bytes| decode_8bit(&bytes)))
}

fn read_variant(
    container: &mut dyn ContainerRead,
    base: &[String],
    tail: &str,
) -> std::io::Result<Option<Vec<u8>>> {
    let mut path = base.to_vec();
    if let Some(last) = path.last_mut() {
        last.push_str(tail);
    }
    container.read_stream(&path)
}

/// Decode 8-bit stream text. Windows-1252 maps every byte value, so this
/// cannot fail.
pub fn decode_8bit(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    strip_trailing_nul(&text).to_string()
}

/// Decode UTF-16LE stream text. Unpaired surrogates become replacement
/// characters.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let (text, _, _) = UTF_16LE.decode(bytes);
    strip_trailing_nul(&text).to_string()
}

// Some producers write a terminating NUL into string streams.
fn strip_trailing_nul(text: &str) -> &str {
    text.strip_suffix('\0').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;

    fn base(name: &str) -> Vec<String> {
        vec![name.to_string()]
    }

    #[test]
    fn test_8bit_only() {
        let mut container = MemoryContainer::new();
        container.insert("__substg1.0_0037001E", b"Caf\xE9".to_vec());
        let text = resolve_string(&mut container, &base("__substg1.0_0037"))
            .expect("resolve")
            .expect("present");
        assert_eq!(text, "Café");
    }

    #[test]
    fn test_utf16_only() {
        let mut container = MemoryContainer::new();
        container.insert_utf16("__substg1.0_0037001F", "Sujet");
        let text = resolve_string(&mut container, &base("__substg1.0_0037"))
            .expect("resolve")
            .expect("present");
        assert_eq!(text, "Sujet");
    }

    #[test]
    fn test_unicode_wins_when_both_exist() {
        let mut container = MemoryContainer::new();
        container.insert("__substg1.0_0037001E", b"ansi".to_vec());
        container.insert_utf16("__substg1.0_0037001F", "unicode");
        let text = resolve_string(&mut container, &base("__substg1.0_0037"))
            .expect("resolve")
            .expect("present");
        assert_eq!(text, "unicode");
    }

    #[test]
    fn test_neither_variant_is_absent() {
        let mut container = MemoryContainer::new();
        let resolved =
            resolve_string(&mut container, &base("__substg1.0_0037")).expect("resolve");
        assert!(resolved.is_none());
    }

    #[test]
    fn test_trailing_nul_is_stripped() {
        let mut container = MemoryContainer::new();
        container.insert("__substg1.0_3707001E", b"name.txt\x00".to_vec());
        let text = resolve_string(&mut container, &base("__substg1.0_3707"))
            .expect("resolve")
            .expect("present");
        assert_eq!(text, "name.txt");
    }
}
