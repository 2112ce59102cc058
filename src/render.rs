//! Bibliography rendering.
//!
//! Selects the cited records, orders them by author, and renders each one
//! with the template of its [`EntryKind`]. Citations without a record become
//! placeholder entries at the top of the listing. Problems found on the way
//! (missing records, missing required fields, unknown types) never abort
//! rendering; they show up in the output and in the [`RenderReport`].

use crate::config::RenderOptions;
use crate::manifest::Manifest;
use crate::markup::{block, bold, error_token, italic, prefixed, small_caps};
use crate::names::format_names;
use crate::store::{EntryKind, Record, RecordStore};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stands in for the authors of a record that has none.
const UNKNOWN_AUTHOR: &str = "??????????????????????";

/// Stands in for the authors and editors of a book that has neither.
const UNKNOWN_BOOK_AUTHOR: &str = "???????? (author unknown) ????????";

/// One rendered `\bibitem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryBlock {
    pub key: String,
    /// Type of the rendered record; `None` for missing-citation placeholders.
    pub entry_type: Option<String>,
    /// Set on placeholders for citations without a record.
    pub missing: bool,
    /// Entry body, lines separated by `\n`.
    pub text: String,
}

/// Keys of the rendered entries that share a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeGroup {
    pub entry_type: String,
    pub keys: Vec<String>,
}

/// Number of citations resolving to records of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub entry_type: String,
    pub count: usize,
}

/// A non-fatal problem found while rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A citation names a key the database does not have.
    MissingRecord { key: String },
    /// A required field is absent; the output carries an error token.
    MissingField { key: String, field: String },
    /// The record type has no template.
    UnknownType { key: String, entry_type: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingRecord { key } => write!(f, "Bibkey {} not found", key),
            Warning::MissingField { key, field } => {
                write!(f, "Entry {} has no required field '{}'", key, field)
            }
            Warning::UnknownType { key, entry_type } => {
                write!(f, "Entry {} has unknown type '{}'", key, entry_type)
            }
        }
    }
}

/// Counts and warnings of one rendering run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Citations in the manifest, duplicates included.
    pub citation_count: usize,
    /// Records in the database.
    pub record_count: usize,
    /// Records rendered (placeholders excluded).
    pub rendered_count: usize,
    /// Citations without a record, in citation order.
    pub missing: Vec<String>,
    /// How often each type is cited, in order of first citation.
    pub references_by_type: Vec<TypeCount>,
    pub warnings: Vec<Warning>,
}

/// Result of [`render`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    /// Placeholders first, then the records in sort order.
    pub entries: Vec<EntryBlock>,
    /// Rendered keys bucketed by type, in order of first appearance.
    pub grouping: Vec<TypeGroup>,
    pub report: RenderReport,
}

/// Renders the records cited by `manifest`.
///
/// # Examples
///
/// ```
/// use bbl_tools::{parse_manifest, parse_records, render, RenderOptions};
///
/// let store = parse_records("@misc{k1, author = {A. Smith}, title = {T}}").unwrap();
/// let manifest = parse_manifest("\\citation{k1}\\citation{k2}").unwrap();
/// let output = render(&store, &manifest, &RenderOptions::default());
///
/// assert_eq!(output.entries.len(), 2);
/// assert!(output.entries[0].missing);
/// assert_eq!(output.entries[1].key, "k1");
/// ```
pub fn render(store: &RecordStore, manifest: &Manifest, options: &RenderOptions) -> RenderedOutput {
    let mut report = build_report(store, &manifest.citations);

    let mut selected = select_cited(store, &manifest.citations);
    let keys = sort_keys(&selected);
    selected.sort_by(|a, b| keys[a.key()].cmp(&keys[b.key()]));

    let mut entries: Vec<EntryBlock> = report
        .missing
        .iter()
        .map(|key| EntryBlock {
            key: key.clone(),
            entry_type: None,
            missing: true,
            text: bold(&format!("No data for bibkey {}", key)),
        })
        .collect();

    let mut grouping: Vec<TypeGroup> = Vec::new();
    for record in &selected {
        let (text, warnings) = render_entry(record, options);
        report.warnings.extend(warnings);
        entries.push(EntryBlock {
            key: record.key().to_string(),
            entry_type: Some(record.entry_type().to_string()),
            missing: false,
            text,
        });

        match grouping
            .iter_mut()
            .find(|g| g.entry_type == record.entry_type())
        {
            Some(group) => group.keys.push(record.key().to_string()),
            None => grouping.push(TypeGroup {
                entry_type: record.entry_type().to_string(),
                keys: vec![record.key().to_string()],
            }),
        }
    }
    report.rendered_count = selected.len();

    log::debug!(
        "Rendered {} entries and {} placeholders",
        report.rendered_count,
        report.missing.len()
    );

    RenderedOutput {
        entries,
        grouping,
        report,
    }
}

/// Records whose key is cited at least once, in store order.
pub fn select_cited<'a>(store: &'a RecordStore, citations: &[String]) -> Vec<&'a Record> {
    let cited: HashSet<&str> = citations.iter().map(String::as_str).collect();
    store.iter().filter(|r| cited.contains(r.key())).collect()
}

/// Sort key of every given record, by record key.
pub fn sort_keys(records: &[&Record]) -> HashMap<String, String> {
    records
        .iter()
        .map(|r| (r.key().to_string(), sort_key(r)))
        .collect()
}

/// Lowercased ordering key of a record.
///
/// Web and miscellaneous sources sort by their descriptive fields, every
/// other type by its normalized author (or editor) list.
pub fn sort_key(record: &Record) -> String {
    let field = |name: &str| record.get(name).unwrap_or("");
    let key = match record.kind() {
        EntryKind::Misc | EntryKind::Online => [
            field("author"),
            field("organization"),
            field("title"),
            field("note"),
        ]
        .concat(),
        EntryKind::Manual => [field("note"), field("organization"), field("title")].concat(),
        _ => {
            let names = record
                .get_non_empty("author")
                .or_else(|| record.get_non_empty("editor"))
                .unwrap_or(UNKNOWN_AUTHOR);
            format_names(names, None)
        }
    };
    key.to_lowercase()
}

/// Per-citation statistics and missing-record warnings.
fn build_report(store: &RecordStore, citations: &[String]) -> RenderReport {
    let mut report = RenderReport {
        citation_count: citations.len(),
        record_count: store.len(),
        ..RenderReport::default()
    };

    for citation in citations {
        match store.get(citation) {
            Some(record) => {
                match report
                    .references_by_type
                    .iter_mut()
                    .find(|c| c.entry_type == record.entry_type())
                {
                    Some(count) => count.count += 1,
                    None => report.references_by_type.push(TypeCount {
                        entry_type: record.entry_type().to_string(),
                        count: 1,
                    }),
                }
            }
            None => {
                report.missing.push(citation.clone());
                report.warnings.push(Warning::MissingRecord {
                    key: citation.clone(),
                });
            }
        }
    }

    report
}

/// Renders one record with the template of its kind.
fn render_entry(record: &Record, options: &RenderOptions) -> (String, Vec<Warning>) {
    let mut f = EntryFormatter::new(record, options);
    let lines = match record.kind() {
        EntryKind::Article => f.article(),
        EntryKind::Book => f.book(),
        EntryKind::InProceedings => f.in_proceedings(),
        EntryKind::InCollection => f.in_collection(),
        EntryKind::Patent => f.patent(),
        EntryKind::Thesis => f.thesis(),
        EntryKind::Manual => f.manual(),
        EntryKind::Online => f.online(),
        EntryKind::Misc => f.misc(),
        EntryKind::Unknown => f.unknown(),
    };
    (lines.join("\n"), f.warnings)
}

/// Field access and shared pieces for the per-type templates.
struct EntryFormatter<'a> {
    record: &'a Record,
    options: &'a RenderOptions,
    warnings: Vec<Warning>,
}

impl<'a> EntryFormatter<'a> {
    fn new(record: &'a Record, options: &'a RenderOptions) -> Self {
        Self {
            record,
            options,
            warnings: Vec::new(),
        }
    }

    /// Value of an optional field, empty when absent.
    fn optional(&self, field: &str) -> &'a str {
        self.record.get(field).unwrap_or("")
    }

    /// Value of a required field, or an error token when absent.
    fn required(&mut self, field: &str) -> String {
        match self.record.get(field) {
            Some(value) => value.to_string(),
            None => self.missing(field),
        }
    }

    /// Records a missing field and returns its error token.
    fn missing(&mut self, field: &str) -> String {
        self.warnings.push(Warning::MissingField {
            key: self.record.key().to_string(),
            field: field.to_string(),
        });
        error_token(field)
    }

    fn names(&self, raw: &str) -> String {
        let highlight = self
            .options
            .highlight
            .as_deref()
            .filter(|h| !h.trim().is_empty());
        format_names(raw, highlight)
    }

    /// Formatted authors, or `fallback` verbatim when there are none.
    fn authors_or(&self, fallback: &str) -> String {
        match self.record.get_non_empty("author") {
            Some(author) => self.names(author),
            None => fallback.to_string(),
        }
    }

    /// Formatted authors, else the organization, else an error token.
    fn authors_or_organization(&mut self) -> String {
        if let Some(author) = self.record.get_non_empty("author") {
            return self.names(author);
        }
        match self.record.get_non_empty("organization") {
            Some(organization) => organization.to_string(),
            None => self.missing("organization/author"),
        }
    }

    /// `{\sc AUTHORS}:`
    fn author_line(&self) -> String {
        format!("{}:", small_caps(&self.authors_or(UNKNOWN_AUTHOR)))
    }

    /// `\newblock {VALUE.}` for a non-empty optional field.
    fn optional_line(&self, field: &str) -> Option<String> {
        self.record
            .get_non_empty(field)
            .map(|value| format!("\\newblock {{{}.}}", value))
    }

    /// `BLOCK(publisher, address, year)`
    fn publication_block(&self) -> String {
        block(&[
            self.optional("publisher"),
            self.optional("address"),
            self.optional("year"),
        ])
    }

    fn label(&self, label: &str) -> String {
        format!(", {} ", label)
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    fn book(&mut self) -> Vec<String> {
        let record = self.record;
        let authors = match record
            .get_non_empty("author")
            .or_else(|| record.get_non_empty("editor"))
        {
            Some(names) => self.names(names),
            None => UNKNOWN_BOOK_AUTHOR.to_string(),
        };
        let title = self.required("title");
        let mut lines = vec![
            format!("{}:", small_caps(&authors)),
            format!("\\newblock {{{}}}.", italic(&title)),
        ];
        if let Some(series) = record.get_non_empty("series") {
            let volume = self.required("volume");
            lines.push(format!("\\newblock {{{} {}}}.", series, volume));
        }
        lines.push(self.publication_block());
        lines
    }

    fn in_proceedings(&mut self) -> Vec<String> {
        let options = self.options;
        let labels = &options.labels;
        let title = self.required("title");
        let booktitle = self.required("booktitle");
        vec![
            self.author_line(),
            format!("\\newblock {{{}}}.", title),
            format!(
                "\\newblock {{{}{}{}{}{}{}{}.}}",
                italic(&booktitle),
                prefixed(&self.label(&labels.volume), self.optional("volume")),
                prefixed(&self.label(&labels.number), self.optional("number")),
                prefixed(", ", self.optional("publisher")),
                prefixed(", ", self.optional("address")),
                prefixed(", ", self.optional("year")),
                prefixed(&self.label(&labels.pages), self.optional("pages")),
            ),
        ]
    }

    fn article(&mut self) -> Vec<String> {
        let options = self.options;
        let labels = &options.labels;
        let authors = self.authors_or(UNKNOWN_AUTHOR);
        let title = self.required("title");
        let journal = self.required("journal");
        let year = self.required("year");
        let pages = self.required("pages");
        vec![
            format!("\\newblock {{{}: {}}}.", small_caps(&authors), title),
            format!(
                "\\newblock {{{} {}{}{}{}.}}",
                italic(&journal),
                year,
                prefixed(&self.label(&labels.volume), self.optional("volume")),
                prefixed(&self.label(&labels.number), self.optional("number")),
                prefixed(&self.label(&labels.pages), &pages),
            ),
        ]
    }

    fn in_collection(&mut self) -> Vec<String> {
        let record = self.record;
        let options = self.options;
        let labels = &options.labels;
        let title = self.required("title");
        let editors = match record.get_non_empty("editor") {
            Some(editor) => format!("{}, {} ", small_caps(&self.names(editor)), labels.editor),
            None => format!("{} ", self.missing("editor")),
        };
        let booktitle = self.required("booktitle");
        let pages = self.required("pages");
        vec![
            self.author_line(),
            format!("\\newblock {{{}.}}", title),
            format!(
                "\\newblock {{{} {}{}.}}",
                labels.in_collection,
                editors,
                italic(&booktitle)
            ),
            self.publication_block(),
            format!("\\newblock {{{} {}}}.", labels.pages, pages),
        ]
    }

    fn patent(&mut self) -> Vec<String> {
        let number = self.required("number");
        let title = self.required("title");
        vec![
            self.author_line(),
            format!("\\newblock {{{}: {}.}}", number, title),
            self.publication_block(),
        ]
    }

    fn thesis(&mut self) -> Vec<String> {
        let title = self.required("title");
        let school = self.required("school");
        let year = self.required("year");
        vec![
            self.author_line(),
            format!("\\newblock {{{}}}.", title),
            format!("\\newblock {{{}, {}}}.", school, year),
        ]
    }

    fn manual(&mut self) -> Vec<String> {
        let title = self.required("title");
        let lead = match self.record.get_non_empty("note") {
            Some(note) => format!("{} {}", note, title),
            None => title,
        };
        vec![
            format!("\\newblock {{{}}}.", lead),
            block(&[self.optional("organization"), self.optional("year")]),
        ]
    }

    fn online(&mut self) -> Vec<String> {
        let authors = self.authors_or_organization();
        let mut lines = vec![format!(
            "{}: {}.",
            small_caps(&authors),
            self.optional("title")
        )];
        lines.extend(self.optional_line("url"));
        if self.record.get_non_empty("title").is_some() {
            lines.extend(self.optional_line("organization"));
        }
        lines.extend(self.optional_line("note"));
        lines
    }

    fn misc(&mut self) -> Vec<String> {
        let authors = self.authors_or_organization();
        let mut lines = vec![format!(
            "{}: {}.",
            small_caps(&authors),
            self.optional("title")
        )];
        lines.extend(self.optional_line("note"));
        lines
    }

    fn unknown(&mut self) -> Vec<String> {
        self.warnings.push(Warning::UnknownType {
            key: self.record.key().to_string(),
            entry_type: self.record.entry_type().to_string(),
        });
        vec![format!(
            "{} {} {}",
            self.record.key(),
            bold("Unknown entry type"),
            self.record.entry_type()
        )]
    }
}
