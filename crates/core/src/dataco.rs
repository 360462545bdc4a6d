//! DATACO number handling.
//!
//! DATACO numbers are displayed as `DATACO-<digits>` but stored and sent
//! as bare digits. Input fields only ever keep the digits.

/// Fixed display prefix.
pub const DATACO_PREFIX: &str = "DATACO-";

/// Keep only ASCII digits, in their original order.
pub fn sanitize_dataco_input(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Render a stored DATACO number for display.
pub fn display_dataco(number: &str) -> String {
    format!("{DATACO_PREFIX}{number}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_digits_in_order() {
        assert_eq!(sanitize_dataco_input("DA12TA-34"), "1234");
        assert_eq!(sanitize_dataco_input("DATACO-0042"), "0042");
        assert_eq!(sanitize_dataco_input("no digits"), "");
        assert_eq!(sanitize_dataco_input(""), "");
    }

    #[test]
    fn sanitize_drops_non_ascii_digits() {
        // Arabic-Indic and full-width digits are not ASCII.
        assert_eq!(sanitize_dataco_input("١٢3４5"), "35");
    }

    #[test]
    fn display_adds_prefix() {
        assert_eq!(display_dataco("981"), "DATACO-981");
    }
}
