//! Property-based tests for parse/serialize idempotence.
//!
//! Databases are generated as text with a mix of braced, quoted and bare
//! values, parsed, written back in canonical form and parsed again.

use bbl_tools::{parse_records, write_records};
use proptest::prelude::*;

/// How a generated field value is delimited in the source text.
#[derive(Debug, Clone, Copy)]
enum ValueForm {
    Braced,
    Quoted,
    Bare,
}

#[derive(Debug, Clone)]
struct GenRecord {
    entry_type: &'static str,
    key: String,
    fields: Vec<(String, String, ValueForm)>,
}

fn gen_entry_type() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "article",
        "Book",
        "INPROCEEDINGS",
        "misc",
        "online",
        "phdthesis",
        "techreport",
    ])
}

/// A value that is valid in the given form.
///
/// Quoted values keep their surrounding spaces and may hold braces in any
/// order, since only `"` ends them.
fn gen_value() -> impl Strategy<Value = (String, ValueForm)> {
    prop_oneof![
        "[A-Za-z0-9 .,:;'-]{0,24}".prop_map(|v| (v, ValueForm::Braced)),
        "[A-Za-z0-9 .,:!?{}-]{0,24}".prop_map(|v| (v, ValueForm::Quoted)),
        "[A-Za-z0-9]{1,8}".prop_map(|v| (v, ValueForm::Bare)),
    ]
}

fn gen_record() -> impl Strategy<Value = GenRecord> {
    (
        gen_entry_type(),
        "[A-Za-z][A-Za-z0-9:.]{0,10}",
        prop::collection::btree_map("[a-z][a-z0-9_]{0,8}", gen_value(), 0..6),
    )
        .prop_map(|(entry_type, key, fields)| GenRecord {
            entry_type,
            key,
            fields: fields
                .into_iter()
                .map(|(name, (value, form))| (name, value, form))
                .collect(),
        })
}

/// Renders generated records as `.bib` text, making keys unique by position.
fn to_bib(records: &[GenRecord]) -> String {
    let mut bib = String::from("% generated\n");
    for (i, record) in records.iter().enumerate() {
        bib.push_str(&format!("@{}{{{}_{},\n", record.entry_type, record.key, i));
        for (name, value, form) in &record.fields {
            let value = match form {
                ValueForm::Braced => format!("{{{}}}", value),
                ValueForm::Quoted => format!("\"{}\"", value),
                ValueForm::Bare => value.clone(),
            };
            bib.push_str(&format!("  {} = {},\n", name, value));
        }
        bib.push_str("}\n\n");
    }
    bib
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Parsing the canonical form of a parsed database gives the same records.
    #[test]
    fn test_parse_write_parse_roundtrip(records in prop::collection::vec(gen_record(), 0..6)) {
        let text = to_bib(&records);
        let store = parse_records(&text).expect("generated database should parse");

        let canonical = write_records(&store);
        let reparsed = parse_records(&canonical).expect("canonical database should parse");

        prop_assert_eq!(&reparsed, &store);
        prop_assert_eq!(write_records(&reparsed), canonical);
        prop_assert_eq!(store.len(), records.len());
    }
}
