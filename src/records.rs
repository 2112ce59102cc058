//! BibTeX database parser.
//!
//! Parses the `.bib` record grammar:
//!
//! ```text
//! @INPROCEEDINGS{DBLP:conf:ipcv:Shamir06,
//!   author = {Lior Shamir},
//!   title = {Human Perception-based Color Segmentation Using Fuzzy Logic},
//!   year = 2006,
//! }
//! ```
//!
//! Lines starting with `%` are comments, and `@comment{...}` blocks (as
//! written by JabRef) are skipped.

use crate::scanner::{CharStream, ParseError};
use crate::store::{Record, RecordStore};

/// Parses a database into a [`RecordStore`].
///
/// Parsing stops at the end of input or at the first character that cannot
/// start a record or a comment.
///
/// # Errors
///
/// Fails on the first grammar violation, duplicate field or duplicate key.
///
/// # Examples
///
/// ```
/// use bbl_tools::parse_records;
///
/// let store = parse_records("@Book{Melville51, title = {Moby Dick}}").unwrap();
/// assert_eq!(store.get("melville51").unwrap().get("title"), Some("Moby Dick"));
/// ```
pub fn parse_records(text: &str) -> Result<RecordStore, ParseError> {
    let mut stream = CharStream::new(text);
    let mut store = RecordStore::new();

    loop {
        stream.skip_whitespace();
        match stream.peek() {
            Some('%') => stream.skip_line(),
            Some('@') => {
                stream.advance();
                if let Some(record) = parse_record(&mut stream)? {
                    let pos = stream.position();
                    store.insert(record).map_err(|e| ParseError::DuplicateKey {
                        key: e.key,
                        line: pos.line,
                        column: pos.column,
                    })?;
                }
            }
            None => break,
            Some(other) => {
                let pos = stream.position();
                log::debug!(
                    "Stopped reading entries at '{}' (line {} col {})",
                    other,
                    pos.line,
                    pos.column
                );
                break;
            }
        }
    }

    log::debug!("Number of entries: {}", store.len());
    Ok(store)
}

/// Parses one record after its `@`. Returns `None` for `@comment` blocks.
fn parse_record(stream: &mut CharStream) -> Result<Option<Record>, ParseError> {
    let entry_type = stream.read_identifier().to_lowercase();
    stream.skip_whitespace();

    if entry_type == "comment" {
        stream.read_braced()?;
        return Ok(None);
    }

    stream.expect('{')?;
    stream.skip_whitespace();

    let key = stream.read_until(',');
    if key.trim().is_empty() {
        return Err(stream.unexpected("bibkey"));
    }
    stream.expect(',')?;

    let mut record = Record::new(&entry_type, &key);

    loop {
        stream.skip_whitespace();
        match stream.peek() {
            Some('}') => {
                stream.advance();
                break;
            }
            None => return Err(stream.unexpected("'}'")),
            Some(_) => {}
        }

        let name = stream.read_identifier();
        if name.is_empty() {
            return Err(stream.unexpected("field name"));
        }
        stream.skip_whitespace();
        stream.expect('=')?;
        stream.skip_whitespace();

        let value = parse_value(stream)?;
        record.add_field(&name, &value).map_err(|e| {
            let pos = stream.position();
            ParseError::DuplicateField {
                key: e.key,
                field: e.field,
                line: pos.line,
                column: pos.column,
            }
        })?;

        stream.skip_whitespace();
        match stream.peek() {
            Some(',') => {
                stream.advance();
            }
            Some('}') => {
                stream.advance();
                break;
            }
            // A bare value has already consumed its comma.
            _ => {}
        }
    }

    Ok(Some(record))
}

/// Reads a field value, choosing the form from its first character.
///
/// Bare values run to the next comma and consume it, unlike braced and
/// quoted values which leave the separator to the caller.
fn parse_value(stream: &mut CharStream) -> Result<String, ParseError> {
    match stream.peek() {
        Some('{') => Ok(stream.read_braced()?.trim().to_string()),
        Some('"') => stream.read_quoted(),
        _ => {
            let value = stream.read_until(',').trim().to_string();
            stream.expect(',')?;
            Ok(value)
        }
    }
}
