//! pdfsplit CLI - heading-aware PDF segmentation tool

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfsplit::{
    LopdfSource, PageSelection, PageSource, ParseOptions, PdfSplitter, Segment, TextSplitter,
};

#[derive(Parser)]
#[command(name = "pdfsplit")]
#[command(version)]
#[command(about = "Split PDFs into heading-aware segments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a PDF into segments
    Split {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Prefix each segment with its heading path
        #[arg(long)]
        embed_titles: bool,

        /// Store inline images in this directory
        #[arg(long, value_name = "DIR")]
        images: Option<PathBuf>,

        /// Cut segments into chunks of at most this many characters
        #[arg(long, env = "PDFSPLIT_CHUNK_SIZE")]
        chunk_size: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long, env = "PDFSPLIT_CHUNK_OVERLAP", default_value = "100")]
        chunk_overlap: usize,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Stop at the first recoverable error
        #[arg(long)]
        strict: bool,

        /// Emit one JSON document per line
        #[arg(long)]
        json: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Split {
            input,
            output,
            embed_titles,
            images,
            chunk_size,
            chunk_overlap,
            pages,
            strict,
            json,
        } => build_splitter(embed_titles, images, chunk_size, chunk_overlap, pages, strict)
            .and_then(|splitter| cmd_split(&splitter, &input, output.as_deref(), json)),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_splitter(
    embed_titles: bool,
    images: Option<PathBuf>,
    chunk_size: Option<usize>,
    chunk_overlap: usize,
    pages: Option<String>,
    strict: bool,
) -> Result<PdfSplitter, Box<dyn std::error::Error>> {
    let mut splitter = PdfSplitter::new();

    if embed_titles {
        splitter = splitter.embed_titles();
    }
    if let Some(dir) = images {
        splitter = splitter.with_images(dir);
    }
    if let Some(size) = chunk_size {
        splitter = splitter.with_chunking(TextSplitter::new(size, chunk_overlap)?);
    }
    if let Some(p) = pages {
        let selection =
            PageSelection::parse(&p).map_err(|e| format!("Invalid page range: {}", e))?;
        splitter = splitter.with_pages(selection);
    }
    if strict {
        splitter = splitter.strict();
    }

    Ok(splitter)
}

fn cmd_split(
    splitter: &PdfSplitter,
    input: &Path,
    output: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stream = splitter.open(input)?;
    let items: Box<dyn Iterator<Item = pdfsplit::Result<Segment>>> =
        match splitter.options().splitter {
            Some(chunker) => Box::new(stream.chunked(chunker)),
            None => Box::new(stream),
        };

    // The spinner shares the terminal with stdout, so it only runs for file output
    let (mut writer, pb): (Box<dyn Write>, ProgressBar) = match output {
        Some(path) => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
            pb.set_message("Splitting PDF...");
            (Box::new(BufWriter::new(File::create(path)?)), pb)
        }
        None => (Box::new(std::io::stdout().lock()), ProgressBar::hidden()),
    };

    let count = write_segments(items, &mut writer, json, |count| {
        pb.set_message(format!("{} segments", count));
        pb.tick();
    })?;
    pb.finish_and_clear();

    if let Some(path) = output {
        println!("{} {} segments to {}", "Saved".green(), count, path.display());
    }

    Ok(())
}

/// Write each segment as soon as it is pulled, returning how many were written.
fn write_segments<W: Write>(
    items: impl Iterator<Item = pdfsplit::Result<Segment>>,
    writer: &mut W,
    json: bool,
    mut on_segment: impl FnMut(usize),
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut count = 0;
    for segment in items {
        let segment = match segment {
            Ok(segment) => segment,
            Err(e) => {
                writer.flush()?;
                return Err(e.into());
            }
        };
        if json {
            serde_json::to_writer(&mut *writer, &segment)?;
            writeln!(writer)?;
        } else {
            writer.write_all(render_segment(count, &segment).as_bytes())?;
        }
        count += 1;
        on_segment(count);
    }
    writer.flush()?;
    Ok(count)
}

/// Human-readable form of one segment.
fn render_segment(index: usize, segment: &Segment) -> String {
    let path = if segment.titles().is_empty() {
        "(no heading)".dimmed().to_string()
    } else {
        segment.titles().join(" > ").cyan().bold().to_string()
    };

    let mut out = format!("{} {}\n", format!("[{}]", index + 1).dimmed(), path);
    out.push_str(&segment.body_text);
    out.push('\n');
    for image in &segment.images {
        out.push_str(&format!("  {} {}\n", "image".green(), image.display()));
    }
    let tables = segment.table_texts.iter().filter(|t| !t.is_empty()).count();
    if tables > 0 {
        out.push_str(&format!("  {} {}\n", "tables".yellow(), tables));
    }
    out.push('\n');
    out
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = LopdfSource::open(input, ParseOptions::default())?;
    let metadata = source.file_metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), source.total_pages());
    for (key, value) in metadata.iter().filter(|(_, v)| !v.is_empty()) {
        println!("{}: {}", key.bold(), value);
    }

    println!();
    println!("{}", "Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let stats = source.font_statistics();
    println!("{}: {:.1}pt", "Body size".bold(), stats.body_size);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfsplit".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Heading-aware PDF segmentation tool");
    println!();
    println!("License: MIT");
}
