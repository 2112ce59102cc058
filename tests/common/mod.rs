//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bbl_tools::{parse_manifest, parse_records, render, RenderOptions, RenderedOutput};

/// A DBLP-style database with one record per common entry type.
///
/// Sort keys (formatted authors, lowercased) in ascending order:
/// `jaworski~t.`, `melville~h.`, `shamir~l.`, `smith~a.`.
pub const SAMPLE_BIB: &str = r#"% Exported by JabRef
@comment{jabref-meta: databaseType:bibtex;}

@INPROCEEDINGS{DBLP:conf:ipcv:Shamir06,
  author = {Lior Shamir},
  title = {Human Perception-based Color Segmentation Using Fuzzy Logic},
  booktitle = {IPCV},
  year = {2006},
  pages = {496-502},
}

@Book{Melville51,
  author = "Herman Melville",
  title = {Moby Dick},
  publisher = {Harper},
  address = {New York},
  year = 1851,
}

@article{Smith20,
  author = {A. Smith},
  title = {On Things},
  journal = {Journal of Things},
  year = {2020},
  volume = {7},
  pages = {1-2}
}

@phdthesis{Jaworski09,
  author = {Jaworski, Tomasz},
  title = {Visualization},
  school = {Politechnika},
  year = {2009}
}
"#;

/// Builds an `.aux` text citing `keys` in order and naming database `bibdata`.
pub fn build_aux(keys: &[&str], bibdata: &str) -> String {
    let mut aux = String::from("\\bibstyle{plain}\n");
    for key in keys {
        aux.push_str(&format!("\\citation{{{}}}\n", key));
    }
    aux.push_str(&format!("\\bibdata{{{}}}\n", bibdata));
    aux
}

/// Parses both inputs and renders with default options.
pub fn render_text(bib: &str, aux: &str) -> RenderedOutput {
    render_with(bib, aux, &RenderOptions::default())
}

/// Parses both inputs and renders with `options`.
pub fn render_with(bib: &str, aux: &str, options: &RenderOptions) -> RenderedOutput {
    let store = parse_records(bib).expect("database should parse");
    let manifest = parse_manifest(aux).expect("manifest should parse");
    render(&store, &manifest, options)
}

/// Keys of the rendered entries, in output order.
pub fn entry_keys(output: &RenderedOutput) -> Vec<&str> {
    output.entries.iter().map(|e| e.key.as_str()).collect()
}

/// Writes `<dir>/<job>.aux` and `<dir>/<bibdata>.bib`, returning the `.aux` path.
pub fn write_job(dir: &Path, job: &str, aux: &str, bibdata: &str, bib: &str) -> PathBuf {
    let aux_path = dir.join(format!("{}.aux", job));
    fs::write(&aux_path, aux).unwrap();
    fs::write(dir.join(format!("{}.bib", bibdata)), bib).unwrap();
    aux_path
}
