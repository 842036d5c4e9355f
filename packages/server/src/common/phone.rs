/// Normalize a phone number or chat identifier to an E.164-like string.
///
/// Chat providers deliver sender identifiers without the leading `+`
/// (e.g. `15551234567`); users type numbers with spaces, dashes or
/// parentheses. Everything but digits is dropped and a single `+` prefix
/// is applied, so the same person always maps to the same key.
pub fn normalize_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{}", digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wa_id_gets_plus_prefix() {
        assert_eq!(normalize_phone_number("15551234567"), "+15551234567");
    }

    #[test]
    fn test_already_normalized_is_unchanged() {
        assert_eq!(normalize_phone_number("+15551234567"), "+15551234567");
    }

    #[test]
    fn test_formatting_characters_are_stripped() {
        assert_eq!(normalize_phone_number("+1 (555) 123-4567"), "+15551234567");
        assert_eq!(normalize_phone_number("1 555 123 4567"), "+15551234567");
    }
}
