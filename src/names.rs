//! Author list formatting.
//!
//! Turns a raw BibTeX name list such as `Lior Shamir and Jaworski, Tomasz`
//! into `Shamir~L., Jaworski~T.`: family name first, given names reduced to
//! initials, joined with non-breaking spaces.

use crate::markup::bold;
use regex::Regex;
use std::sync::LazyLock;

/// Separator between authors: the word `and` surrounded by whitespace.
static AND_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("author separator regex is valid"));

/// Formats an author list.
///
/// When `highlight` names an author (compared case-insensitively against the
/// formatted name with `~` read as a space, e.g. `Jaworski T.`), that author
/// is set in bold.
///
/// # Examples
///
/// ```
/// use bbl_tools::format_names;
///
/// assert_eq!(format_names("Shamir, Lior", None), "Shamir~L.");
/// assert_eq!(format_names("Lior Shamir", None), "Shamir~L.");
/// assert_eq!(
///     format_names("Lior Shamir and T. Jaworski", Some("Jaworski T.")),
///     "Shamir~L., {\\bf Jaworski~T.}"
/// );
/// ```
pub fn format_names(raw: &str, highlight: Option<&str>) -> String {
    let highlight = highlight.map(|h| h.trim().to_lowercase());

    AND_SEPARATOR
        .split(raw)
        .map(|author| {
            let name = format_author(author);
            match &highlight {
                Some(h) if name.to_lowercase().replace('~', " ") == *h => bold(&name),
                _ => name,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats a single author as `Family~I.~J.`.
fn format_author(author: &str) -> String {
    let (family, given) = split_author(author.trim());

    let mut parts = vec![family];
    parts.extend(given.split_whitespace().map(initial));
    parts.join("~")
}

/// Splits an author into family name and given names.
///
/// A comma marks `Family, Given` order; otherwise the last word is the
/// family name.
fn split_author(author: &str) -> (String, String) {
    if author.contains(',') {
        let mut segments = author.split(',').map(str::trim);
        let family = segments.next().unwrap_or_default().to_string();
        let given = segments.collect::<Vec<_>>().join(" ");
        (family, given)
    } else {
        let mut words: Vec<&str> = author.split_whitespace().collect();
        let family = words.pop().unwrap_or_default().to_string();
        (family, words.join(" "))
    }
}

/// Reduces a given name to an initial, leaving abbreviations untouched.
fn initial(name: &str) -> String {
    if name.ends_with('.') {
        return name.to_string();
    }
    match name.chars().next() {
        Some(first) => format!("{}.", first),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_and_natural_order_agree() {
        assert_eq!(format_names("Shamir, Lior", None), "Shamir~L.");
        assert_eq!(format_names("Lior Shamir", None), "Shamir~L.");
    }

    #[test]
    fn test_multiple_given_names() {
        assert_eq!(
            format_names("Donald Ervin Knuth", None),
            "Knuth~D.~E."
        );
        assert_eq!(
            format_names("Knuth, Donald Ervin", None),
            "Knuth~D.~E."
        );
    }

    #[test]
    fn test_existing_initials_are_kept() {
        assert_eq!(format_names("A. Smith", None), "Smith~A.");
        assert_eq!(format_names("Shannon, C. E.", None), "Shannon~C.~E.");
        assert_eq!(format_names("Jean-Paul Sartre", None), "Sartre~J.");
    }

    #[test]
    fn test_single_name_has_no_initials() {
        assert_eq!(format_names("Plato", None), "Plato");
    }

    #[test]
    fn test_multiple_authors() {
        // Given: an author list in mixed styles and mixed-case separators
        let raw = "Lior Shamir AND Herman Melville and\nShannon, Claude";

        // When: we format it
        let formatted = format_names(raw, None);

        // Then: every author is normalized and joined with ", "
        assert_eq!(formatted, "Shamir~L., Melville~H., Shannon~C.");
    }

    #[test]
    fn test_and_inside_a_word_is_not_a_separator() {
        assert_eq!(format_names("Alexander Anderson", None), "Anderson~A.");
    }

    #[test]
    fn test_highlighted_author_is_bold() {
        // Given: a highlighted name in a different case
        let raw = "Tomasz Jaworski and Lior Shamir";

        // When: we format with highlighting
        let formatted = format_names(raw, Some("jaworski t."));

        // Then: only the matching author is emphasized
        assert_eq!(formatted, "{\\bf Jaworski~T.}, Shamir~L.");
    }

    #[test]
    fn test_no_highlight_without_option() {
        assert_eq!(format_names("Tomasz Jaworski", None), "Jaworski~T.");
    }

    #[test]
    fn test_highlight_requires_full_match() {
        assert_eq!(
            format_names("Tomasz Adam Jaworski", Some("Jaworski T.")),
            "Jaworski~T.~A."
        );
    }

    #[test]
    fn test_unknown_marker_passes_through() {
        let marker = "??????????????????????";
        assert_eq!(format_names(marker, None), marker);
    }
}
