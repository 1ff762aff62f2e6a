//! MAPI property codes and the display-name catalog.
//!
//! Extraction addresses streams by literal path; the catalog exists only to
//! annotate stream listings for humans and is never consulted for
//! correctness.

/// Subject.
pub const SUBJECT: &str = "0037";
/// Raw transport header block.
pub const HEADER: &str = "007D";
/// Sender display name.
pub const SENDER_NAME: &str = "0C1A";
/// Sender email address.
pub const SENDER_EMAIL: &str = "0C1F";
/// Display CC line.
pub const DISPLAY_CC: &str = "0E03";
/// Display To line.
pub const DISPLAY_TO: &str = "0E04";
/// Message body.
pub const BODY: &str = "1000";
/// Attachment short (8.3) filename.
pub const ATTACH_SHORT_NAME: &str = "3704";
/// Attachment long filename.
pub const ATTACH_LONG_NAME: &str = "3707";

/// Attachment payload stream, type suffix included (raw binary).
pub const ATTACH_DATA_STREAM: &str = "__substg1.0_37010102";
/// Embedded-message storage under an attachment subtree.
pub const ATTACH_MESSAGE_STORAGE: &str = "__substg1.0_3701000D";
/// First segment of every attachment subtree.
pub const ATTACH_DIR_PREFIX: &str = "__attach";

/// Stream name of a string property, without its type suffix.
pub fn string_stream(code: &str) -> String {
    format!("__substg1.0_{code}")
}

/// Four-hex-digit property code of a `__substg1.0_` stream name.
pub fn stream_code(stream_name: &str) -> Option<&str> {
    stream_name.strip_prefix("__substg1.0_")?.get(..4)
}

/// Human-readable name for a property code, if the catalog knows it.
pub fn property_name(code: &str) -> Option<&'static str> {
    let code = code.to_ascii_uppercase();
    CATALOG
        .binary_search_by(|(c, _)| (*c).cmp(code.as_str()))
        .ok()
        .map(|index| CATALOG[index].1)
}

// Sorted by code.
static CATALOG: &[(&str, &str)] = &[
    ("001A", "Message class"),
    ("0037", "Subject"),
    ("003D", "Subject prefix"),
    ("0040", "Received by name"),
    ("0042", "Sent representing name"),
    ("0044", "Received representing name"),
    ("004D", "Original author name"),
    ("0050", "Reply recipient names"),
    ("005A", "Original sender name"),
    ("0064", "Sent representing address type"),
    ("0065", "Sent representing email"),
    ("0070", "Conversation topic"),
    ("0075", "Received by address type"),
    ("0076", "Received by email"),
    ("0077", "Representing address type"),
    ("0078", "Representing email"),
    ("007D", "Message header"),
    ("0C1A", "Sender name"),
    ("0C1E", "Sender address type"),
    ("0C1F", "Sender email"),
    ("0E02", "Display BCC"),
    ("0E03", "Display CC"),
    ("0E04", "Display To"),
    ("0E1D", "Normalized subject"),
    ("0E28", "Received account 1"),
    ("0E29", "Received account 2"),
    ("1000", "Message body"),
    ("1008", "RTF sync body tag"),
    ("1035", "Internet message id"),
    ("1046", "Sender email (alternate)"),
    ("3001", "Display name"),
    ("3002", "Address type"),
    ("3003", "Email address"),
    ("3701", "Attachment data"),
    ("3703", "Attachment extension"),
    ("3704", "Attachment short filename"),
    ("3707", "Attachment long filename"),
    ("370E", "Attachment MIME tag"),
    ("3712", "Attachment id"),
    ("39FE", "7-bit email"),
    ("39FF", "7-bit display name"),
    ("3A00", "Account"),
    ("3A02", "Callback phone"),
    ("3A05", "Generation suffix"),
    ("3A06", "Given name"),
    ("3A08", "Business phone"),
    ("3A09", "Home phone"),
    ("3A0A", "Initials"),
    ("3A0B", "Keyword"),
    ("3A0C", "Language"),
    ("3A0D", "Location"),
    ("3A11", "Surname"),
    ("3A15", "Postal address"),
    ("3A16", "Company name"),
    ("3A17", "Title"),
    ("3A18", "Department"),
    ("3A19", "Office location"),
    ("3A1A", "Primary phone"),
    ("3A1B", "Business phone 2"),
    ("3A1C", "Mobile phone"),
    ("3A1D", "Radio phone"),
    ("3A1E", "Car phone"),
    ("3A1F", "Other phone"),
    ("3A20", "Transmittable display name"),
    ("3A21", "Pager"),
    ("3A22", "User certificate"),
    ("3A23", "Primary fax"),
    ("3A24", "Business fax"),
    ("3A25", "Home fax"),
    ("3A26", "Country"),
    ("3A27", "Locality"),
    ("3A28", "State or province"),
    ("3A29", "Street address"),
    ("3A2A", "Postal code"),
    ("3A2B", "Post office box"),
    ("3A2C", "Telex"),
    ("3A2D", "ISDN"),
    ("3A2E", "Assistant phone"),
    ("3A2F", "Home phone 2"),
    ("3A30", "Assistant"),
    ("3A44", "Middle name"),
    ("3A45", "Display name prefix"),
    ("3A46", "Profession"),
    ("3A48", "Spouse name"),
    ("3A4B", "TTY/TDD phone"),
    ("3A4C", "FTP site"),
    ("3A4E", "Manager name"),
    ("3A4F", "Nickname"),
    ("3A51", "Business homepage"),
    ("3A57", "Company main phone"),
    ("3A58", "Children's names"),
    ("3A59", "Home city"),
    ("3A5A", "Home country"),
    ("3A5B", "Home postal code"),
    ("3A5C", "Home state or province"),
    ("3A5D", "Home street"),
    ("3A5F", "Other address city"),
    ("3A60", "Other address country"),
    ("3A61", "Other address postal code"),
    ("3A62", "Other address province"),
    ("3A63", "Other address street"),
    ("3A64", "Other address post office box"),
    ("3FF7", "Server"),
    ("3FF8", "Creator name"),
    ("3FFA", "Last modifier name"),
    ("3FFC", "To email"),
    ("403D", "To address type"),
    ("403E", "To email (original)"),
    ("5FF6", "To display"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_sorted() {
        for pair in CATALOG.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(property_name("0037"), Some("Subject"));
        assert_eq!(property_name("007d"), Some("Message header"));
        assert_eq!(property_name("FFFF"), None);
    }

    #[test]
    fn test_lookup_covers_attachment_codes() {
        assert_eq!(property_name("3701"), Some("Attachment data"));
        assert_eq!(property_name("3704"), Some("Attachment short filename"));
        assert_eq!(property_name("3707"), Some("Attachment long filename"));
        assert_eq!(property_name("3712"), Some("Attachment id"));
        assert_eq!(property_name("39FE"), Some("7-bit email"));
        assert_eq!(property_name("39FF"), Some("7-bit display name"));
    }

    #[test]
    fn test_stream_code_extraction() {
        assert_eq!(stream_code("__substg1.0_0037001F"), Some("0037"));
        assert_eq!(stream_code("__substg1.0_37010102"), Some("3701"));
        assert_eq!(stream_code("__properties_version1.0"), None);
        assert_eq!(stream_code("__substg1.0_37"), None);
    }

    #[test]
    fn test_string_stream_name() {
        assert_eq!(string_stream(SUBJECT), "__substg1.0_0037");
    }
}
