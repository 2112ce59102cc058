//! CLI for bbl-tools - Generate thebibliography listings from BibTeX databases.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};

use bbl_tools::{
    database_path, encode_text, load_database, load_manifest, load_options, render,
    write_bibliography, write_grouping, write_records, Manifest, RecordStore, RenderOptions,
    RenderReport, RenderedOutput, SourceError, TextEncoding,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Generate thebibliography listings from BibTeX databases and LaTeX .aux files
#[derive(Parser)]
#[command(name = "bbl-tools")]
#[command(version)]
#[command(after_help = "\
Examples:
  bbl-tools generate paper
  bbl-tools generate paper.aux --highlight 'Shamir L.' -o refs.bbl
  bbl-tools stats paper --json
  bbl-tools normalize refs.bib -o refs.clean.bib")]
struct Cli {
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the cited records of a LaTeX job into a .bbl file
    #[command(after_help = "\
Examples:
  bbl-tools generate paper
  bbl-tools generate paper --config labels.toml
  bbl-tools generate paper --no-highlight -o build/paper.bbl
  bbl-tools generate paper --encoding windows-1250

Reads <job>.aux and the database named by its \\bibdata, then writes
<job>.bbl and the per-type grouping report <job>.bbl.txt.
Inputs are read as UTF-8, or as Windows-1250 when they are not valid UTF-8.
Output is UTF-8 unless --encoding says otherwise")]
    Generate {
        /// LaTeX job name or path to its .aux file
        job: PathBuf,

        /// Output .bbl file (default: <job>.bbl)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Encoding of the written .bbl file
        #[arg(long, value_enum, default_value_t = OutputEncoding::Utf8)]
        encoding: OutputEncoding,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print the citation report of a LaTeX job
    Stats {
        /// LaTeX job name or path to its .aux file
        job: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Rewrite a .bib database in canonical form
    Normalize {
        /// Input .bib file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// TOML file with rendering options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Author to set in bold, written as 'Family I.'
    #[arg(long, conflicts_with = "no_highlight")]
    highlight: Option<String>,

    /// Don't highlight any author
    #[arg(long)]
    no_highlight: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputEncoding {
    #[value(name = "utf-8")]
    Utf8,
    #[value(name = "windows-1250")]
    Windows1250,
}

impl From<OutputEncoding> for TextEncoding {
    fn from(encoding: OutputEncoding) -> Self {
        match encoding {
            OutputEncoding::Utf8 => TextEncoding::Utf8,
            OutputEncoding::Windows1250 => TextEncoding::Windows1250,
        }
    }
}

// ---------------------------------------------------------------------------
// AppError: semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10: manifest (.aux) file not found / unreadable
    Manifest(String),
    /// Exit 11: database (.bib) file not found / unreadable
    Database(String),
    /// Exit 12: options file not found / invalid
    Config(String),
    /// Exit 13: syntax error in a manifest or database
    Parse(String),
    /// Exit 15: cannot write output file
    OutputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::Manifest(_) => 10,
            AppError::Database(_) => 11,
            AppError::Config(_) => 12,
            AppError::Parse(_) => 13,
            AppError::OutputFile(_) => 15,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Manifest(msg) => {
                write!(
                    f,
                    "{}\n  hint: run LaTeX first so that the .aux file exists",
                    msg
                )
            }
            AppError::Database(msg) => {
                write!(
                    f,
                    "{}\n  hint: the database name comes from \\bibdata in the .aux file",
                    msg
                )
            }
            AppError::Config(msg) => {
                write!(
                    f,
                    "{}\n  hint: allowed keys are 'highlight' and the [labels] table",
                    msg
                )
            }
            AppError::Parse(msg) => {
                write!(f, "{}\n  hint: check the syntax at the reported position", msg)
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

/// Initializes `env_logger` from `RUST_LOG`, with `--log-level` taking precedence.
fn init_logger(level: Option<LevelFilter>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None);
    // A logger installed earlier (e.g. by a test harness) is kept.
    let _ = builder.try_init();
}

fn run(command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Generate {
            job,
            output,
            encoding,
            render,
        } => generate_command(&job, output.as_deref(), encoding.into(), &render),
        Commands::Stats { job, json, render } => stats_command(&job, json, &render),
        Commands::Normalize { input, output } => normalize_command(&input, output.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Render the cited records of a job into `.bbl` and grouping files.
fn generate_command(
    job: &Path,
    output: Option<&Path>,
    encoding: TextEncoding,
    args: &RenderArgs,
) -> Result<(), AppError> {
    let manifest_path = manifest_path(job);
    let rendered = render_job(&manifest_path, args)?;

    let bbl_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_path.with_extension("bbl"));
    write_file(&bbl_path, &encode_text(&write_bibliography(&rendered), encoding))?;
    info!(
        "Wrote {} entries to {}",
        rendered.entries.len(),
        bbl_path.display()
    );

    let grouping_path = append_extension(&bbl_path, "txt");
    write_file(&grouping_path, write_grouping(&rendered.grouping).as_bytes())?;
    info!("Wrote type grouping to {}", grouping_path.display());

    Ok(())
}

/// Print the citation report of a job.
fn stats_command(job: &Path, json: bool, args: &RenderArgs) -> Result<(), AppError> {
    let rendered = render_job(&manifest_path(job), args)?;

    let text = if json {
        serde_json::to_string_pretty(&rendered.report)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?
            + "\n"
    } else {
        format_report(&rendered.report)
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{}", text).map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))
}

/// Rewrite a database in canonical form.
fn normalize_command(input: &Path, output: Option<&Path>) -> Result<(), AppError> {
    let store = load_store(input)?;
    let bib = write_records(&store);

    if let Some(output_path) = output {
        write_file(output_path, bib.as_bytes())?;
        info!("Wrote {} records to {}", store.len(), output_path.display());
        Ok(())
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", bib).map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loads a job's manifest and database and renders the cited records.
fn render_job(manifest_path: &Path, args: &RenderArgs) -> Result<RenderedOutput, AppError> {
    let options = resolve_options(args)?;
    let manifest = load_job_manifest(manifest_path)?;

    let bib_path = database_path(manifest_path, &manifest);
    let store = load_store(&bib_path)?;

    let rendered = render(&store, &manifest, &options);
    for warning in &rendered.report.warnings {
        warn!("{}", warning);
    }
    info!(
        "Rendered {} of {} citations ({} missing)",
        rendered.report.rendered_count,
        rendered.report.citation_count,
        rendered.report.missing.len()
    );

    Ok(rendered)
}

fn load_job_manifest(path: &Path) -> Result<Manifest, AppError> {
    let manifest = load_manifest(path).map_err(|e| match e {
        SourceError::Io { .. } => AppError::Manifest(e.to_string()),
        SourceError::Parse { .. } => AppError::Parse(e.to_string()),
    })?;
    info!(
        "Read {} citations from {}",
        manifest.citations.len(),
        path.display()
    );
    Ok(manifest)
}

fn load_store(path: &Path) -> Result<RecordStore, AppError> {
    let store = load_database(path).map_err(|e| match e {
        SourceError::Io { .. } => AppError::Database(e.to_string()),
        SourceError::Parse { .. } => AppError::Parse(e.to_string()),
    })?;
    info!("Read {} records from {}", store.len(), path.display());
    Ok(store)
}

/// Options from `--config` (or defaults), then the highlight flags on top.
fn resolve_options(args: &RenderArgs) -> Result<RenderOptions, AppError> {
    let mut options = match &args.config {
        Some(path) => load_options(path)
            .map_err(|e| AppError::Config(format!("'{}': {}", path.display(), e)))?,
        None => RenderOptions::default(),
    };

    if args.no_highlight {
        options.highlight = None;
    } else if let Some(name) = &args.highlight {
        options.highlight = Some(name.clone());
    }

    Ok(options)
}

/// `paper` and `paper.aux` both name `paper.aux`.
fn manifest_path(job: &Path) -> PathBuf {
    if job.extension().is_some_and(|ext| ext == "aux") {
        job.to_path_buf()
    } else {
        append_extension(job, "aux")
    }
}

/// `refs.bbl` + `txt` gives `refs.bbl.txt`.
fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), AppError> {
    fs::write(path, content)
        .map_err(|e| AppError::OutputFile(format!("'{}': {}", path.display(), e)))
}

fn format_report(report: &RenderReport) -> String {
    let mut text = format!(
        "citations: {}\nrecords: {}\nrendered: {}\n",
        report.citation_count, report.record_count, report.rendered_count
    );

    if !report.missing.is_empty() {
        text.push_str(&format!("missing: {}\n", report.missing.join(", ")));
    }

    for count in &report.references_by_type {
        text.push_str(&format!("TYPE {} = {}\n", count.entry_type, count.count));
    }

    for warning in &report.warnings {
        text.push_str(&format!("warning: {}\n", warning));
    }

    text
}
