//! MIME type resolution from file names.

/// Fallback for unrecognized extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess the MIME type of `name` from its extension.
#[must_use]
pub fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.txt", "text/plain")]
    #[case("report.PDF", "application/pdf")]
    #[case("photo.jpeg", "image/jpeg")]
    #[case("/srv/docs/0001/abc_scan.png", "image/png")]
    #[case("a.unknownext", OCTET_STREAM)]
    #[case("README", OCTET_STREAM)]
    #[case("", OCTET_STREAM)]
    fn test_guess_mime(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(guess_mime(name), expected);
    }
}
