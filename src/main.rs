//! folio - EPUB reading-flow extractor

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use folio::epub::{container, extract, flatten, package, toc};
use folio::progress::ProgressStore;
use folio::{ArchiveIndex, Document, FragmentKind, cache, read_document};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "EPUB reading-flow extractor", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio book.epub             Print the book's text flow from the saved position
    folio --from 0 book.epub    Print from the beginning
    folio --mark 120 book.epub  Save fragment 120 as the resume position
    folio -i book.epub          Show book info
    folio --json book.epub      Dump the fragment sequence as JSON")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Show book info without printing the text flow
    #[arg(short, long)]
    info: bool,

    /// Dump the fragment sequence as JSON
    #[arg(long)]
    json: bool,

    /// Start printing at this fragment index (overrides saved progress)
    #[arg(long, value_name = "INDEX")]
    from: Option<usize>,

    /// Save INDEX as the resume position for this book, then exit
    #[arg(long, value_name = "INDEX")]
    mark: Option<usize>,

    /// Bypass the parse cache
    #[arg(long)]
    no_cache: bool,

    /// Directory for the parse cache and reading progress
    #[arg(long, value_name = "DIR", default_value = "./cache")]
    cache_dir: PathBuf,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    if let Some(index) = cli.mark {
        return mark_progress(cli, index);
    }

    if cli.info {
        return show_info(cli);
    }

    let document = load_document(cli)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&document).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    print_flow(cli, &document)
}

/// Parse the book, going through the cache unless disabled.
fn load_document(cli: &Cli) -> Result<Document, String> {
    if !cli.no_cache
        && let Some(document) = cache::load(&cli.cache_dir, &cli.input)
    {
        if !cli.quiet {
            eprintln!("restored from cache");
        }
        return Ok(document);
    }

    let document = read_document(&cli.input).map_err(|e| e.to_string())?;

    if !cli.no_cache
        && let Err(e) = cache::store(&cli.cache_dir, &cli.input, &document)
        && !cli.quiet
    {
        eprintln!("warning: could not cache parse result: {e}");
    }

    Ok(document)
}

fn print_flow(cli: &Cli, document: &Document) -> Result<(), String> {
    let start = match cli.from {
        Some(index) => index,
        None => {
            let mut store = ProgressStore::load(&cli.cache_dir).map_err(|e| e.to_string())?;
            let key = cli.input.to_string_lossy().into_owned();
            store.get(&key).index.min(document.len())
        }
    };

    for fragment in &document.fragments[start.min(document.len())..] {
        match fragment.kind {
            FragmentKind::Heading => println!("\n{}\n", fragment.text),
            _ => println!("{}", fragment.text),
        }
    }

    Ok(())
}

fn mark_progress(cli: &Cli, index: usize) -> Result<(), String> {
    let mut store = ProgressStore::load(&cli.cache_dir).map_err(|e| e.to_string())?;
    let key = cli.input.to_string_lossy().into_owned();
    store.set_index(&key, index);
    store.save(&cli.cache_dir).map_err(|e| e.to_string())?;

    if !cli.quiet {
        eprintln!("progress saved");
    }
    Ok(())
}

/// Run the pipeline stage by stage so per-stage numbers can be shown.
fn show_info(cli: &Cli) -> Result<(), String> {
    let mut index = ArchiveIndex::open(&cli.input).map_err(|e| e.to_string())?;
    let container = container::resolve(&mut index).map_err(|e| e.to_string())?;
    let package = package::resolve(&mut index, &container).map_err(|e| e.to_string())?;
    let points = toc::resolve(&mut index, &package).map_err(|e| e.to_string())?;
    let targets = flatten::flatten(&points, &package.base_dir);
    let document = extract::extract(&mut index, &targets).map_err(|e| e.to_string())?;

    println!("File: {}", cli.input.display());
    if let Some(ref title) = package.title {
        println!("Title: {title}");
    }
    println!("Entries: {}", index.len());
    println!("Spine items: {}", package.spine.len());
    println!("TOC targets: {}", targets.len());
    println!("Fragments: {}", document.len());

    Ok(())
}
