//! LaTeX `.aux` manifest parser.
//!
//! Reads the citation order and the database reference written by LaTeX:
//!
//! ```text
//! \bibstyle{plain}
//! \citation{DBLP:conf:ipcv:Shamir06}
//! \citation{melville51,shannon48}
//! \bibdata{references}
//! ```

use crate::scanner::{CharStream, ParseError};
use serde::Serialize;

/// The citation manifest of one LaTeX run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// Database name from `\bibdata{...}`, without further interpretation.
    pub bibdata: Option<String>,
    /// Style name from `\bibstyle{...}`. Not used for rendering.
    pub bibstyle: Option<String>,
    /// Case-folded citation keys in declaration order, duplicates included.
    pub citations: Vec<String>,
}

/// Parses an `.aux` manifest.
///
/// # Errors
///
/// Fails on any tag other than `bibdata`, `bibstyle` and `citation`, and on
/// malformed tag bodies.
///
/// # Examples
///
/// ```
/// use bbl_tools::parse_manifest;
///
/// let manifest = parse_manifest("\\citation{K1}\n\\bibdata{db}").unwrap();
/// assert_eq!(manifest.citations, vec!["k1"]);
/// assert_eq!(manifest.bibdata.as_deref(), Some("db"));
/// ```
pub fn parse_manifest(text: &str) -> Result<Manifest, ParseError> {
    let mut stream = CharStream::new(text);
    let mut manifest = Manifest::default();

    loop {
        stream.skip_whitespace();
        if stream.peek().is_none() {
            break;
        }

        stream.expect('\\')?;
        let start = stream.position();
        let tag = stream.read_identifier();

        match tag.as_str() {
            "bibdata" => manifest.bibdata = Some(read_tag_body(&mut stream)?),
            "bibstyle" => manifest.bibstyle = Some(read_tag_body(&mut stream)?),
            "citation" => read_citations(&mut stream, &mut manifest.citations)?,
            _ => {
                return Err(ParseError::UnknownTag {
                    tag,
                    line: start.line,
                    column: start.column,
                })
            }
        }
    }

    log::debug!(
        "Number of citations in manifest: {}",
        manifest.citations.len()
    );
    Ok(manifest)
}

/// Reads a single `{...}` body, trimmed.
fn read_tag_body(stream: &mut CharStream) -> Result<String, ParseError> {
    stream.skip_whitespace();
    let body = stream.read_braced()?;
    Ok(body.trim().to_string())
}

/// Reads `{key}` or `{key1,key2,...}` and appends the normalized keys.
fn read_citations(stream: &mut CharStream, citations: &mut Vec<String>) -> Result<(), ParseError> {
    stream.skip_whitespace();
    stream.expect('{')?;
    loop {
        stream.skip_whitespace();
        let key = stream.read_bibkey();
        stream.skip_whitespace();
        citations.push(key.trim().to_lowercase());

        if stream.peek() == Some(',') {
            stream.advance();
            continue;
        }
        stream.expect('}')?;
        return Ok(());
    }
}
