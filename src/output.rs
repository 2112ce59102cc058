//! Output generation for rendered bibliographies.
//!
//! This module serializes a [`RenderedOutput`] into `thebibliography` markup,
//! writes the per-type grouping report, and writes a [`RecordStore`] back to
//! canonical `.bib` text.

use crate::render::{RenderedOutput, TypeGroup};
use crate::store::RecordStore;

/// Widest label argument of the `thebibliography` environment.
const WIDEST_LABEL: &str = "100";

/// Generates the `.bbl` text for a rendered bibliography.
///
/// # Arguments
///
/// * `output` - The rendered entries, placeholders first
///
/// # Returns
///
/// The complete `thebibliography` environment, one `\bibitem` per entry,
/// each followed by a blank line.
pub fn write_bibliography(output: &RenderedOutput) -> String {
    let mut bbl = format!("\\begin{{thebibliography}}{{{}}}\n", WIDEST_LABEL);

    for entry in &output.entries {
        bbl.push_str(&format!("\\bibitem{{{}}}\n", entry.key));
        bbl.push_str(&entry.text);
        bbl.push_str("\n\n");
    }

    bbl.push_str("\\end{thebibliography}\n");
    bbl
}

/// Generates the grouping report: each type followed by its keys.
///
/// ```text
/// TYPE = article
///    k1,k2
/// ```
pub fn write_grouping(grouping: &[TypeGroup]) -> String {
    grouping
        .iter()
        .map(|group| format!("TYPE = {}\n   {}\n", group.entry_type, group.keys.join(",")))
        .collect()
}

/// Writes every record back as canonical `.bib` text.
///
/// Values are brace-delimited, except those a braced value could not carry
/// (surrounding whitespace, unbalanced braces), which are quoted when they
/// contain no `"`. Re-parsing the result yields the same records.
pub fn write_records(store: &RecordStore) -> String {
    let mut bib = String::new();

    for record in store.iter() {
        bib.push_str(&format!("@{}{{{},\n", record.entry_type(), record.key()));
        for (name, value) in record.fields() {
            bib.push_str(&format!("  {} = {},\n", name, delimit(value)));
        }
        bib.push_str("}\n\n");
    }

    bib
}

fn delimit(value: &str) -> String {
    let braced_safe = value.trim() == value && braces_balanced(value);
    if braced_safe || value.contains('"') {
        format!("{{{}}}", value)
    } else {
        format!("\"{}\"", value)
    }
}

/// Whether every `}` closes an earlier `{` and none is left open.
fn braces_balanced(value: &str) -> bool {
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_records;
    use crate::render::EntryBlock;

    fn entry(key: &str, text: &str, missing: bool) -> EntryBlock {
        EntryBlock {
            key: key.to_string(),
            entry_type: if missing { None } else { Some("misc".to_string()) },
            missing,
            text: text.to_string(),
        }
    }

    // ===========================================
    // Tests for write_bibliography
    // ===========================================

    #[test]
    fn test_write_bibliography_empty() {
        // Given: no entries at all
        let output = RenderedOutput::default();

        // When: we write the bibliography
        let bbl = write_bibliography(&output);

        // Then: only the environment is emitted
        assert_eq!(
            bbl,
            "\\begin{thebibliography}{100}\n\\end{thebibliography}\n"
        );
    }

    #[test]
    fn test_write_bibliography_entries() {
        // Given: a placeholder and a regular entry
        let output = RenderedOutput {
            entries: vec![
                entry("ghost", "{\\bf No data for bibkey ghost}", true),
                entry("k1", "{\\sc Smith~A.}: T.", false),
            ],
            ..RenderedOutput::default()
        };

        // When: we write the bibliography
        let bbl = write_bibliography(&output);

        // Then: each entry gets its \bibitem, in order, followed by a blank line
        assert_eq!(
            bbl,
            "\\begin{thebibliography}{100}\n\
             \\bibitem{ghost}\n{\\bf No data for bibkey ghost}\n\n\
             \\bibitem{k1}\n{\\sc Smith~A.}: T.\n\n\
             \\end{thebibliography}\n"
        );
    }

    // ===========================================
    // Tests for write_grouping
    // ===========================================

    #[test]
    fn test_write_grouping() {
        let grouping = vec![
            TypeGroup {
                entry_type: "article".to_string(),
                keys: vec!["k1".to_string(), "k2".to_string()],
            },
            TypeGroup {
                entry_type: "book".to_string(),
                keys: vec!["b1".to_string()],
            },
        ];

        assert_eq!(
            write_grouping(&grouping),
            "TYPE = article\n   k1,k2\nTYPE = book\n   b1\n"
        );
    }

    #[test]
    fn test_write_grouping_empty() {
        assert_eq!(write_grouping(&[]), "");
    }

    // ===========================================
    // Tests for write_records
    // ===========================================

    #[test]
    fn test_write_records_canonical_form() {
        // Given: a record written with quotes, bare values and odd casing
        let store = parse_records("@ARTICLE{Key1, Year = 2020, title = \"T\", }").unwrap();

        // When: we write it back
        let bib = write_records(&store);

        // Then: names are lowercased and every value is braced
        assert_eq!(
            bib,
            "@article{key1,\n  title = {T},\n  year = {2020},\n}\n\n"
        );
    }

    #[test]
    fn test_write_records_reparses_identically() {
        let store = parse_records(
            "@book{b, title = {The {RNA} World}, note = {a, b}}\n@misc{m,}",
        )
        .unwrap();

        let reparsed = parse_records(&write_records(&store)).unwrap();

        assert_eq!(reparsed, store);
    }

    #[test]
    fn test_write_records_quotes_values_braces_cannot_hold() {
        // Given: quoted values with padding and with a lone closing brace
        let store =
            parse_records("@misc{k, title = \" Padded \", note = \"a } b\", year = \"{2020\"}")
                .unwrap();

        // When: we write them back
        let bib = write_records(&store);

        // Then: those values stay quoted and the text reparses to the same records
        assert!(bib.contains("  title = \" Padded \",\n"), "{}", bib);
        assert!(bib.contains("  note = \"a } b\",\n"), "{}", bib);
        assert!(bib.contains("  year = \"{2020\",\n"), "{}", bib);
        let reparsed = parse_records(&bib).unwrap();
        assert_eq!(reparsed, store);
        assert_eq!(write_records(&reparsed), bib);
    }

    #[test]
    fn test_write_records_braces_balanced_quoted_values() {
        let store = parse_records("@misc{k, title = \"The {RNA} World\"}").unwrap();

        assert_eq!(
            write_records(&store),
            "@misc{k,\n  title = {The {RNA} World},\n}\n\n"
        );
    }

    #[test]
    fn test_braces_balanced() {
        assert!(braces_balanced("a {b {c}} d"));
        assert!(!braces_balanced("a } b {"));
        assert!(!braces_balanced("{open"));
    }
}
