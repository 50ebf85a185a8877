use bookblock::bookblock::{BookBlock, Rendered};
use bookblock::config::{self, ConfigOverrides, Settings};
use bookblock::extract::{ExtractError, Extraction, FailurePolicy, PageExtractor};
use bookblock::imaging::{ImageCodec, RustCodec};
use bookblock::output;
use bookblock::sequence::PageSequence;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let hash = env!("BOOKBLOCK_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "bookblock")]
#[command(about = "Cut individual pages out of two-up book scans")]
#[command(long_about = "\
Cut individual pages out of two-up book scans

Every scan holds up to two facing pages. A geometry describes where a page
sits inside its half of the scan, and a page specification lists which scans
and sides become pages, in reading order:

  --pages \"0l,1-120lr,121l\"   cover, 240 facing pages, back cover
  --geometry 600x800+10+20    600x800 box, 10px from the left and 20px
                              from the top of the scan half

Settings are read from bookblock.toml (see 'bookblock gen-config') and can
be overridden by the flags below.

Run 'bookblock usage-examples' for typical invocations.")]
#[command(version = version_string())]
struct Cli {
    /// Config file [default: ./bookblock.toml, if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the scans
    #[arg(short = 'i', long, global = true)]
    source_dir: Option<String>,

    /// Directory pages are written to
    #[arg(short = 'o', long, global = true)]
    target_dir: Option<String>,

    /// Scan file name template, e.g. scan%03d.png
    #[arg(short = 's', long, global = true)]
    source_file_format: Option<String>,

    /// Page file name template, e.g. page%03d.png
    #[arg(short = 't', long, global = true)]
    target_file_format: Option<String>,

    /// Page specification, e.g. 0l,1-120lr,121l
    #[arg(short = 'p', long, global = true)]
    pages: Option<String>,

    /// Page bounding box, WIDTHxHEIGHT+LEFT+TOP
    #[arg(short = 'g', long, global = true)]
    geometry: Option<String>,

    /// color or grayscale
    #[arg(short = 'c', long, global = true)]
    image_mode: Option<String>,

    /// raw, scan or page
    #[arg(short = 'v', long, global = true)]
    view_mode: Option<String>,

    /// abort or continue when a page fails to store
    #[arg(long, global = true)]
    on_error: Option<String>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(short = 'd', long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the pages the page specification selects
    Pages {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render one page to a file
    Show {
        /// Page number (1-based)
        #[arg(long)]
        page: u32,
        /// Where to write the rendering
        #[arg(long)]
        out: PathBuf,
        /// View mode for this rendering [default: configured view mode]
        #[arg(long)]
        view: Option<String>,
    },
    /// Step through pages interactively, reading commands from stdin
    Browse {
        /// File the current page is rendered to
        #[arg(long, default_value = "bookblock-preview.png")]
        preview: PathBuf,
    },
    /// Cut out and store every page
    Extract,
    /// Print the effective settings
    Settings,
    /// Print a stock bookblock.toml with all options documented
    GenConfig,
    /// Print typical invocations
    UsageExamples,
}

impl Cli {
    /// Command-line flags as the topmost config layer.
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            pages: self.pages.clone(),
            geometry: self.geometry.clone(),
            image_mode: self.image_mode.clone(),
            view_mode: self.view_mode.clone(),
            on_error: self.on_error.clone(),
            source_dir: self.source_dir.clone(),
            source_file_format: self.source_file_format.clone(),
            target_dir: self.target_dir.clone(),
            target_file_format: self.target_file_format.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::UsageExamples => {
            print!("{}", usage_examples());
            return Ok(());
        }
        _ => {}
    }

    let settings = load_settings(&cli)?;
    let sequence = PageSequence::new(&settings.pages, settings.naming.clone())?;
    let extractor = PageExtractor::new(RustCodec::new(), settings.geometry, settings.image_mode);

    match cli.command {
        Command::Pages { json } => {
            if json {
                println!("{}", output::page_plan_json(&sequence)?);
            } else {
                output::print_page_plan(&sequence);
            }
        }
        Command::Show { page, out, view } => {
            let view_mode = match view {
                Some(view) => view.parse()?,
                None => settings.view_mode,
            };
            let located = sequence
                .all_entries()
                .into_iter()
                .find(|p| p.page() == page)
                .ok_or_else(|| format!("Page {page} is not in page spec '{}'", settings.pages))?;
            let extraction = extractor.extract(&located, view_mode)?;
            write_preview(
                extractor.codec(),
                &Rendered {
                    page: located,
                    extraction,
                },
                &out,
            )?;
        }
        Command::Browse { preview } => {
            let mut book = BookBlock::new(sequence, extractor, settings.view_mode);
            browse(&mut book, &preview, settings.on_error)?;
        }
        Command::Extract => {
            let report = extractor.store_all(&sequence, settings.on_error, output::print_store_event);
            output::print_store_summary(&report);
            if !report.is_success() {
                return Err(format!("{} page(s) could not be stored", report.failures.len()).into());
            }
        }
        Command::Settings => {
            output::print_settings(&settings);
        }
        // Handled before settings are loaded
        Command::GenConfig | Command::UsageExamples => {}
    }

    Ok(())
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Stock defaults, then the config file, then flags.
fn load_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let path = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
        Some(path) => path.clone(),
        None => PathBuf::from(config::CONFIG_FILE_NAME),
    };
    let merged = config::load_config_with_overrides(&path, &cli.overrides())?;
    Ok(Settings::from_config(&merged)?)
}

/// Write a rendering to `out`; raw renderings copy the scan file.
fn write_preview(
    codec: &impl ImageCodec,
    rendered: &Rendered,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match &rendered.extraction {
        Extraction::Raw(scan) => {
            std::fs::copy(scan, out)?;
        }
        Extraction::Annotated(image) | Extraction::Page(image) => codec.encode(image, out)?,
    }
    println!("{}", output::format_showing(&rendered.page));
    Ok(())
}

/// Read one-letter commands from stdin until `q` or end of input.
fn browse(
    book: &mut BookBlock<RustCodec>,
    preview: &Path,
    policy: FailurePolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Commands: n next, p previous, c current, r reset, v toggle view, a apply, q quit");
    let first = book.current_page();
    show(book.extractor().codec(), preview, first);

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let result = match line.trim() {
            "n" => match book.next_page() {
                Ok(Some(rendered)) => Ok(rendered),
                Ok(None) => {
                    println!("Already on the last page");
                    continue;
                }
                Err(e) => Err(e),
            },
            "p" => match book.previous_page() {
                Ok(Some(rendered)) => Ok(rendered),
                Ok(None) => {
                    println!("Already on the first page");
                    continue;
                }
                Err(e) => Err(e),
            },
            "c" => book.current_page(),
            "r" => {
                book.reset();
                book.current_page()
            }
            "v" => {
                println!("View mode: {}", book.toggle_view_mode());
                book.current_page()
            }
            "a" => {
                let report = book.store_pages(policy, output::print_store_event);
                output::print_store_summary(&report);
                continue;
            }
            "q" => break,
            "" => continue,
            other => {
                println!("Unknown command: '{other}'");
                continue;
            }
        };
        show(book.extractor().codec(), preview, result);
    }
    Ok(())
}

/// Write a rendering to the preview file, reporting failures without stopping.
fn show(codec: &impl ImageCodec, preview: &Path, result: Result<Rendered, ExtractError>) {
    let outcome: Result<(), Box<dyn std::error::Error>> = result
        .map_err(Into::into)
        .and_then(|rendered| write_preview(codec, &rendered, preview));
    if let Err(e) = outcome {
        tracing::error!(preview = %preview.display(), "{e}");
        eprintln!("Error: {e}");
    }
}

fn usage_examples() -> &'static str {
    r#"Print the pages a specification selects:
  bookblock --pages "0l,1-120lr,121l" pages

Check a geometry on the first page, with the page outlined on its scan:
  bookblock -i ~/scans -g 1200x1800+80+60 show --page 1 --out preview.png

Look at the cut-out page instead:
  bookblock -i ~/scans -g 1200x1800+80+60 show --page 1 --out preview.png --view page

Step through pages, rendering each to preview.png:
  bookblock -i ~/scans -g 1200x1800+80+60 -p "0l,1-120lr" browse --preview preview.png

Cut out all pages as grayscale TIFFs, skipping pages that fail:
  bookblock -i ~/scans -o ~/book -t "page%04d.tif" -c grayscale \
      -p "0l,1-120lr,121l" -g 1200x1800+80+60 --on-error continue extract

Write a config file to edit instead of passing flags:
  bookblock gen-config > bookblock.toml
"#
}
