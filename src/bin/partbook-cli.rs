// Offline partition/generate CLI: rasterises a PDF, applies a caller-supplied
// divider map, and writes one PDF per named part to disk without starting
// the HTTP server.

use clap::Parser;
use partbook::adapters::api::dtos::PartitionRequestBody;
use partbook::adapters::raster::pdfium::PdfiumRasterBackend;
use partbook::domain::layout_renderer::{self, RenderConfig};
use partbook::domain::partition_planner::{self, PartitionRequest};
use partbook::domain::raster;
use std::fs;
use std::path::PathBuf;
use std::process;

/// CLI arguments for offline score partitioning.
#[derive(Parser, Debug)]
#[command(
    name = "partbook-cli",
    about = "Split a scanned ensemble score PDF into per-part PDFs from a divider map",
    version
)]
struct Cli {
    /// Path to the score PDF to rasterise.
    #[arg(value_name = "SCORE_PDF")]
    file: PathBuf,

    /// Path to a JSON file describing the per-page divider confirmations
    /// (same shape as the `partition` HTTP endpoint's request body).
    #[arg(value_name = "DIVIDERS_JSON")]
    dividers: PathBuf,

    /// Directory to write the generated part PDFs into.
    #[arg(short, long, value_name = "DIR", default_value = "./out")]
    output: PathBuf,

    /// Maximum bytes per rasterised page before rejecting the input.
    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    max_page_bytes: usize,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    configure_logging(&cli);

    if !cli.file.exists() {
        eprintln!("Error: score file not found: {}", cli.file.display());
        process::exit(1);
    }
    if !cli.dividers.exists() {
        eprintln!("Error: divider map not found: {}", cli.dividers.display());
        process::exit(1);
    }

    let pdf_bytes = fs::read(&cli.file).unwrap_or_else(|e| {
        eprintln!("Error: failed to read {}: {e}", cli.file.display());
        process::exit(1);
    });
    let divider_json = fs::read_to_string(&cli.dividers).unwrap_or_else(|e| {
        eprintln!("Error: failed to read {}: {e}", cli.dividers.display());
        process::exit(1);
    });
    let body: PartitionRequestBody = serde_json::from_str(&divider_json).unwrap_or_else(|e| {
        eprintln!("Error: malformed divider map: {e}");
        process::exit(2);
    });

    let backend = PdfiumRasterBackend::new().unwrap_or_else(|e| {
        eprintln!("Error: failed to load pdfium: {e}");
        process::exit(3);
    });

    if cli.verbose {
        eprintln!("Rasterising {}...", cli.file.display());
    }
    let score = raster::rasterize(&backend, &pdf_bytes, cli.max_page_bytes).unwrap_or_else(|e| {
        eprintln!("Error: rasterisation failed: {e}");
        process::exit(4);
    });

    let request = PartitionRequest {
        display_width: body.display_width,
        pages: &body.pages,
        header: body.header,
        markings: &body.markings,
    };
    let parts = partition_planner::partition(&score, &request);
    if parts.is_empty() {
        eprintln!("Error: divider map produced no named parts");
        process::exit(5);
    }

    fs::create_dir_all(&cli.output).unwrap_or_else(|e| {
        eprintln!("Error: failed to create output directory {}: {e}", cli.output.display());
        process::exit(6);
    });

    let render_config = RenderConfig::default();
    for part in &parts {
        let pdf = match layout_renderer::render(&score, part, &render_config) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error: failed to render part '{}': {e}", part.name);
                process::exit(7);
            }
        };
        let path = cli.output.join(format!("{}.pdf", sanitize_filename(&part.name)));
        if let Err(e) = fs::write(&path, &pdf) {
            eprintln!("Error: failed to write {}: {e}", path.display());
            process::exit(8);
        }
        if !cli.quiet {
            eprintln!(
                "wrote {} ({} staves, {} bytes)",
                path.display(),
                part.staves_count(),
                pdf.len()
            );
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn configure_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();
}
