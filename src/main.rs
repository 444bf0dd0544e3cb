// src/main.rs
mod document;
mod engine;
mod storage;
mod utils;
mod web;

use std::path::PathBuf;

use clap::Parser;

use document::DocumentModel;
use engine::kinds::select_kinds;
use engine::report::compile_report;
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the institutional report table extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page dump files (JSON) to extract from
    inputs: Vec<PathBuf>,

    /// Listing page URL to scrape for report documents
    #[arg(long)]
    listing_url: Option<String>,

    /// Document link extension to collect from the listing page
    #[arg(long, default_value = ".json")]
    extension: String,

    /// Output directory for extracted reports
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Restrict extraction to the named table kinds (default: all)
    #[arg(long)]
    kinds: Vec<String>,

    /// Vertical offset below which a table is treated as continuing from
    /// the previous page when resolving its program heading
    #[arg(long, default_value = "150.0")]
    top_threshold: f64,
}

/// One document's raw bytes plus a label for logging.
struct Input {
    label: String,
    bytes: Vec<u8>,
}

async fn gather_inputs(args: &Args) -> Result<Vec<Input>, AppError> {
    let mut inputs = Vec::new();

    for path in &args.inputs {
        let bytes = std::fs::read(path)?;
        inputs.push(Input {
            label: path.display().to_string(),
            bytes,
        });
    }

    if let Some(listing_url) = &args.listing_url {
        let links = web::client::discover_document_links(listing_url, &args.extension).await?;
        tracing::info!("Found {} document link(s)", links.len());
        for link in links {
            match web::client::download_document(&link).await {
                Ok(bytes) => inputs.push(Input { label: link, bytes }),
                Err(e) => tracing::error!("Failed to download {}: {}", link, e),
            }
        }
    }

    Ok(inputs)
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    if args.inputs.is_empty() && args.listing_url.is_none() {
        return Err(AppError::Config(
            "No inputs: pass page dump files or --listing-url".to_string(),
        ));
    }

    let specs = if args.kinds.is_empty() {
        select_kinds(None)
    } else {
        select_kinds(Some(&args.kinds))
    };
    if specs.is_empty() {
        return Err(AppError::Config(format!(
            "No known table kinds among: {}",
            args.kinds.join(", ")
        )));
    }

    // 3. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 4. Gather documents (local files first, then scraped links)
    let inputs = gather_inputs(&args).await?;
    tracing::info!("Processing {} document(s)", inputs.len());

    // 5. Process each document
    let mut success_count = 0;
    let mut failure_count = 0;

    for input in inputs {
        tracing::info!("Processing document: {}", input.label);

        let doc = match DocumentModel::from_json(&input.bytes) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("Failed to parse {}: {}", input.label, e);
                failure_count += 1;
                continue;
            }
        };

        let extract = engine::extract_document(&doc, &specs, args.top_threshold);
        if extract.is_empty() {
            tracing::warn!("No data extracted from {}", input.label);
            failure_count += 1;
            continue;
        }

        let report = compile_report(&extract);
        tracing::info!(
            "Extracted {} kind(s), {} report parameter(s) for {}",
            extract.kinds.len(),
            report.rows.len(),
            extract.institute.name
        );
        success_count += 1;

        match storage.save_report(&extract, &report) {
            Ok(path) => tracing::info!("Saved full report to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save full report: {}", e),
        }
        match storage.save_kind_tables(&extract) {
            Ok(paths) => tracing::info!("Saved {} kind table(s)", paths.len()),
            Err(e) => tracing::error!("Failed to save kind tables: {}", e),
        }
        match storage.save_metadata(&extract, &report) {
            Ok(path) => tracing::info!("Saved metadata to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save metadata: {}", e),
        }
    }

    tracing::info!(
        "Processing finished. Success: {}, Failures: {}",
        success_count,
        failure_count
    );

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract data from {} document(s)",
            failure_count
        )));
    }

    Ok(())
}
