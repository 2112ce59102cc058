//! bbl-tools: CLI for generating `thebibliography` listings from BibTeX data.
//!
//! This library provides functionality to:
//! - Parse BibTeX databases (`.bib`) and LaTeX citation manifests (`.aux`)
//! - Select, sort and render the cited records as LaTeX entry blocks
//! - Report missing citations, missing fields and per-type groupings
//! - Write `.bbl` output and canonical `.bib` text

pub mod config;
pub mod manifest;
pub mod markup;
pub mod names;
pub mod output;
pub mod records;
pub mod render;
pub mod scanner;
pub mod source;
pub mod store;

pub use config::{load_options, ConfigError, Labels, RenderOptions};
pub use manifest::{parse_manifest, Manifest};
pub use names::format_names;
pub use output::{write_bibliography, write_grouping, write_records};
pub use records::parse_records;
pub use render::{
    render, sort_key, sort_keys, EntryBlock, RenderReport, RenderedOutput, TypeCount, TypeGroup,
    Warning,
};
pub use scanner::ParseError;
pub use source::{
    database_path, encode_text, load_database, load_manifest, read_source, SourceError,
    TextEncoding,
};
pub use store::{EntryKind, Record, RecordStore};
