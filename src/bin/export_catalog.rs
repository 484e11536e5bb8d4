//! Export catalog placement data to CSV
//!
//! Reads a link manifest, resolves and extracts every referenced source
//! document (cache-accelerated), and writes a single deduplicated CSV.
//!
//! Usage:
//!   cargo run --release --bin export_catalog -- manifest.json
//!   cargo run --release --bin export_catalog -- manifest.json --output-dir out --no-cache

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use catalog_export::host::{LocalExtractor, LocalHost};
use catalog_export::{
    assembler, BatchCoordinator, CacheStore, ConsoleProgress, ExportConfig, ExportSettings,
    FileLocator, IncrementalPlanner, Manifest,
};

struct CliConfig {
    manifest: PathBuf,
    output_dir: PathBuf,
    cache_dir: PathBuf,
    fallback_root: PathBuf,
    customer: String,
    use_cache: bool,
    verbose: bool,
}

impl CliConfig {
    fn from_args() -> Option<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut manifest = None;
        let mut output_dir = PathBuf::from(".");
        let mut cache_dir = PathBuf::from("cache");
        let mut fallback_root = PathBuf::from(".");
        let mut customer = "catalog".to_string();
        let mut use_cache = true;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--output-dir" => {
                    i += 1;
                    if i < args.len() {
                        output_dir = PathBuf::from(&args[i]);
                    }
                },
                "--cache-dir" => {
                    i += 1;
                    if i < args.len() {
                        cache_dir = PathBuf::from(&args[i]);
                    }
                },
                "--fallback-root" => {
                    i += 1;
                    if i < args.len() {
                        fallback_root = PathBuf::from(&args[i]);
                    }
                },
                "--customer" => {
                    i += 1;
                    if i < args.len() {
                        customer = args[i].clone();
                    }
                },
                "--no-cache" => {
                    use_cache = false;
                },
                "--verbose" | "-v" => {
                    verbose = true;
                },
                other if manifest.is_none() && !other.starts_with('-') => {
                    manifest = Some(PathBuf::from(other));
                },
                _ => {},
            }
            i += 1;
        }

        Some(Self {
            manifest: manifest?,
            output_dir,
            cache_dir,
            fallback_root,
            customer,
            use_cache,
            verbose,
        })
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(cli) = CliConfig::from_args() else {
        eprintln!("Usage: export_catalog <manifest.json> [--output-dir DIR] [--cache-dir DIR]");
        eprintln!("                      [--fallback-root DIR] [--customer NAME] [--no-cache] [-v]");
        return ExitCode::FAILURE;
    };

    println!("Catalog Placement Exporter");
    println!("==========================");
    println!("Manifest: {}", cli.manifest.display());
    println!("Output directory: {}", cli.output_dir.display());
    println!("Cache: {}", if cli.use_cache { "enabled" } else { "disabled" });
    println!();

    let manifest = match Manifest::load(&cli.manifest) {
        Ok(manifest) => manifest,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        },
    };
    let document_stem = if manifest.document.is_empty() {
        "catalog".to_string()
    } else {
        manifest.document.clone()
    };
    let items = manifest.into_items();
    println!("Found {} processable references\n", items.len());

    let config = ExportConfig::new(&cli.fallback_root, &cli.cache_dir)
        .with_cache(cli.use_cache)
        .with_customer(&cli.customer);
    let settings = ExportSettings::default();

    let locator = FileLocator::new(&config.fallback_root).with_max_depth(config.search_depth);
    let store = CacheStore::new(&config.cache_dir);
    let host = LocalHost::new();
    let extractor = LocalExtractor::new();
    let progress = ConsoleProgress::new(cli.verbose);

    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);
    let planner = IncrementalPlanner::new(&locator, &store, &coordinator, &progress);

    let start = Instant::now();
    let result = if config.use_cache {
        planner.run(items, &settings)
    } else {
        planner.run_uncached(items, &settings)
    };
    let elapsed = start.elapsed();

    let mut exit = ExitCode::SUCCESS;
    if result.records.is_empty() {
        println!("No records produced.");
        exit = ExitCode::FAILURE;
    } else {
        let pages: Vec<i32> = result.records.iter().map(|r| r.parent_page).collect();
        let file_name = assembler::output_file_name(&config.customer, &document_stem, &pages);
        let output_path = cli.output_dir.join(file_name);
        let csv = assembler::assemble(&result.records);

        if let Err(err) = fs::create_dir_all(&cli.output_dir)
            .and_then(|_| fs::write(&output_path, csv.as_bytes()))
        {
            eprintln!("Error writing {}: {}", output_path.display(), err);
            exit = ExitCode::FAILURE;
        } else {
            println!("CSV written to {}", output_path.display());
        }
    }

    println!("\n{}", "=".repeat(70));
    println!("Export Complete");
    println!("{}", "=".repeat(70));
    print!("{}", result.summary());
    println!("Time: {:?}", elapsed);
    println!("{}", "=".repeat(70));

    exit
}
