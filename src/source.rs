//! Loading manifests and databases from disk.
//!
//! Files are decoded as UTF-8 when possible, without a leading byte-order
//! mark. Older databases written in the Central European code page
//! (Windows-1250) fall back to that decoding, so they still load instead of
//! failing on the first accented character.

use crate::manifest::{parse_manifest, Manifest};
use crate::records::parse_records;
use crate::scanner::ParseError;
use crate::store::RecordStore;
use encoding_rs::WINDOWS_1250;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of the database file named by `\bibdata`.
const DATABASE_EXTENSION: &str = "bib";

/// Errors that can occur when loading input files.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },
}

impl SourceError {
    /// The file the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            SourceError::Io { path, .. } | SourceError::Parse { path, .. } => path,
        }
    }
}

/// Byte-order mark some editors put at the start of UTF-8 files.
const BOM: char = '\u{feff}';

/// Encoding of the files written for LaTeX.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Central European code page, for documents set up with `cp1250` input.
    Windows1250,
}

/// Reads a text file, decoding it as UTF-8 or, failing that, as Windows-1250.
///
/// A leading byte-order mark is dropped.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read.
pub fn read_source(path: &Path) -> Result<String, SourceError> {
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode(bytes, path))
}

fn decode(bytes: Vec<u8>, path: &Path) -> String {
    match String::from_utf8(bytes) {
        Ok(text) if text.starts_with(BOM) => text[BOM.len_utf8()..].to_string(),
        Ok(text) => text,
        Err(err) => {
            debug!("{} is not UTF-8, decoding as Windows-1250", path.display());
            let (text, _) = WINDOWS_1250.decode_without_bom_handling(err.as_bytes());
            text.into_owned()
        }
    }
}

/// Encodes text for writing.
///
/// Characters Windows-1250 cannot represent are written as `&#N;` references.
pub fn encode_text(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
        TextEncoding::Windows1250 => {
            let (bytes, _, unmappable) = WINDOWS_1250.encode(text);
            if unmappable {
                debug!("Some characters have no Windows-1250 form");
            }
            bytes.into_owned()
        }
    }
}

/// Reads and parses a manifest (`.aux`) file.
pub fn load_manifest(path: &Path) -> Result<Manifest, SourceError> {
    let text = read_source(path)?;
    parse_manifest(&text).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses a database (`.bib`) file.
pub fn load_database(path: &Path) -> Result<RecordStore, SourceError> {
    let text = read_source(path)?;
    parse_records(&text).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the database a manifest refers to.
///
/// The name comes from `\bibdata`, or from the manifest's own file stem when
/// the manifest has none. It is resolved against the manifest's directory and
/// gets a `.bib` extension unless it already has one.
///
/// # Examples
///
/// ```
/// use bbl_tools::{database_path, Manifest};
/// use std::path::{Path, PathBuf};
///
/// let manifest = Manifest {
///     bibdata: Some("refs".to_string()),
///     ..Manifest::default()
/// };
/// assert_eq!(
///     database_path(Path::new("paper/main.aux"), &manifest),
///     PathBuf::from("paper/refs.bib")
/// );
/// ```
pub fn database_path(manifest_path: &Path, manifest: &Manifest) -> PathBuf {
    let name = match manifest.bibdata.as_deref() {
        Some(name) => name.to_string(),
        None => manifest_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let file_name = if has_database_extension(&name) {
        name
    } else {
        format!("{}.{}", name, DATABASE_EXTENSION)
    };

    match manifest_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn has_database_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DATABASE_EXTENSION))
}
