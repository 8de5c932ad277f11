//! Type approval: map a sniffed label onto a supported format code.

use crate::error::DocTitleError;
use crate::job::FormatCode;
use tracing::debug;

/// Label substrings accepted for conversion, checked in order.
pub const WHITELIST: &[(&str, FormatCode)] = &[
    ("PDF", FormatCode::Pdf),
    ("Microsoft Word", FormatCode::Doc),
];

/// Approve `label` if it contains a whitelisted substring (case-insensitive).
///
/// The first matching entry wins.
pub fn approve_type(label: &str) -> Result<FormatCode, DocTitleError> {
    let haystack = label.to_lowercase();
    WHITELIST
        .iter()
        .find(|(needle, _)| haystack.contains(&needle.to_lowercase()))
        .map(|&(needle, format)| {
            debug!("Approved '{}' as {} (matched '{}')", label, format, needle);
            format
        })
        .ok_or_else(|| DocTitleError::UnapprovedType {
            label: label.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approves_pdf() {
        assert_eq!(approve_type("PDF document, version 1.4").unwrap(), FormatCode::Pdf);
    }

    #[test]
    fn approves_word() {
        assert_eq!(approve_type("Microsoft Word 2007+").unwrap(), FormatCode::Doc);
        assert_eq!(
            approve_type("Composite Document File V2 Document, Microsoft Word").unwrap(),
            FormatCode::Doc
        );
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(approve_type("pdf document").unwrap(), FormatCode::Pdf);
        assert_eq!(approve_type("MICROSOFT WORD").unwrap(), FormatCode::Doc);
    }

    #[test]
    fn first_entry_wins() {
        assert_eq!(
            approve_type("Microsoft Word export of a PDF").unwrap(),
            FormatCode::Pdf
        );
    }

    #[test]
    fn rejects_everything_else() {
        let err = approve_type("ASCII text").unwrap_err();
        assert_eq!(err.to_string(), "Invalid File Type!");
        match err {
            DocTitleError::UnapprovedType { label } => assert_eq!(label, "ASCII text"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
